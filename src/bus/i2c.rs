//! Addressed two-wire bus slave
//!
//! The device answers two bus addresses, one per chip. A write transaction
//! carries the register address in its first data byte and the value in its
//! second; anything beyond that is refused. A read transaction answers from
//! the most recently latched register address, so the usual
//! write-register/restart/read sequence works as on the original parts.

use super::{PSG_ADDRESS, SCC_ADDRESS};
use crate::cortex::{ChipSelect, SharedCortex};

/// Two-wire bus slave adapter
#[derive(Debug)]
pub struct I2cSlave {
    cortex: SharedCortex,
    psg_address: u8,
    scc_address: u8,
    selected: Option<ChipSelect>,
    register: u8,
    index: u8,
}

impl I2cSlave {
    /// Create an adapter answering the default chip addresses
    pub fn new(cortex: SharedCortex) -> Self {
        Self::with_addresses(cortex, PSG_ADDRESS, SCC_ADDRESS)
    }

    /// Create an adapter answering custom chip addresses
    pub fn with_addresses(cortex: SharedCortex, psg_address: u8, scc_address: u8) -> Self {
        I2cSlave {
            cortex,
            psg_address,
            scc_address,
            selected: None,
            register: 0,
            index: 0,
        }
    }

    /// Address phase: returns whether this device claims `address`.
    pub fn start(&mut self, address: u8) -> bool {
        self.selected = if address == self.psg_address {
            Some(ChipSelect::Psg)
        } else if address == self.scc_address {
            Some(ChipSelect::Scc)
        } else {
            None
        };
        self.index = 0;
        self.selected.is_some()
    }

    /// Data byte of a write transaction. Returns `false` when the byte must
    /// be negative-acknowledged.
    pub fn write(&mut self, data: u8) -> bool {
        let Some(chip) = self.selected else {
            return false;
        };
        let accepted = match self.index {
            0 => {
                self.register = data;
                true
            }
            1 => self.cortex.lock().write(chip, self.register, data).is_ok(),
            _ => false,
        };
        self.index += 1;
        accepted
    }

    /// Data byte of a read transaction, answered from the latched register.
    /// `None` must be negative-acknowledged.
    pub fn read(&mut self) -> Option<u8> {
        let chip = self.selected?;
        self.cortex.lock().read(chip, self.register).ok()
    }

    /// Stop condition: the transaction is over.
    pub fn stop(&mut self) {
        self.selected = None;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cortex::SoundCortex;

    fn slave() -> I2cSlave {
        I2cSlave::new(SoundCortex::new().into_shared())
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_write_transaction_lands_in_chip() {
        let mut bus = slave();
        assert!(bus.start(PSG_ADDRESS));
        assert!(bus.write(0x00));
        assert!(bus.write(0xab));
        bus.stop();

        assert_eq!(bus.cortex.lock().psg().channel_period(0), 0xab);
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_third_data_byte_nacked() {
        let mut bus = slave();
        assert!(bus.start(PSG_ADDRESS));
        assert!(bus.write(0x08));
        assert!(bus.write(0x0f));
        assert!(!bus.write(0x00), "a third data byte must be refused");
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_unknown_register_nacked() {
        let mut bus = slave();
        assert!(bus.start(PSG_ADDRESS));
        assert!(bus.write(0x10), "register byte itself is always accepted");
        assert!(!bus.write(0x00), "value byte for an unmapped register");
    }

    #[test]
    fn test_unclaimed_address_ignored() {
        let mut bus = slave();
        assert!(!bus.start(0x22));
        assert!(!bus.write(0x00));
        assert_eq!(bus.read(), None);
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_version_read_after_register_select() {
        let mut bus = slave();
        assert!(bus.start(PSG_ADDRESS));
        assert!(bus.write(0xfe));
        // Repeated start for the read phase
        assert!(bus.start(PSG_ADDRESS));
        assert_eq!(bus.read(), Some(1));
    }

    #[test]
    #[cfg(feature = "scc")]
    fn test_scc_address_routes_to_wavetable() {
        let mut bus = slave();
        assert!(bus.start(SCC_ADDRESS));
        assert!(bus.write(0x05)); // waveform entry 5 of channel 0
        assert!(bus.write(0x7f));
        assert!(bus.start(SCC_ADDRESS));
        assert_eq!(bus.read(), Some(0x7f));
    }
}
