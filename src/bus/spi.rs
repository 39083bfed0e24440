//! Synchronous serial bus slave
//!
//! The serial port delivers complete 16-bit frames: register address in the
//! high byte, value in the low byte. A frame has no room for a chip address
//! beside the full 8-bit register space, so the target chip is bound when
//! the adapter is constructed; a device exposing both chips over serial
//! uses one adapter per chip-select line.

use crate::cortex::{ChipSelect, SharedCortex};

/// Serial bus slave adapter
#[derive(Debug)]
pub struct SpiSlave {
    cortex: SharedCortex,
    target: ChipSelect,
}

impl SpiSlave {
    /// Create an adapter delivering frames to `target`
    pub fn new(cortex: SharedCortex, target: ChipSelect) -> Self {
        SpiSlave { cortex, target }
    }

    /// Deliver one received frame. Returns `false` when the addressed
    /// register does not exist; the frame is dropped.
    pub fn write_frame(&mut self, frame: u16) -> bool {
        let register = (frame >> 8) as u8;
        let value = (frame & 0xff) as u8;
        self.cortex.lock().write(self.target, register, value).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cortex::SoundCortex;

    #[test]
    #[cfg(feature = "psg")]
    fn test_frame_splits_register_and_value() {
        let cortex = SoundCortex::new().into_shared();
        let mut bus = SpiSlave::new(cortex.clone(), ChipSelect::Psg);
        assert!(bus.write_frame(0x02cd));
        assert!(bus.write_frame(0x030a));
        assert_eq!(cortex.lock().psg().channel_period(1), 0x0acd);
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_unknown_register_frame_dropped() {
        let cortex = SoundCortex::new().into_shared();
        let mut bus = SpiSlave::new(cortex, ChipSelect::Psg);
        assert!(!bus.write_frame(0x1000));
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_full_register_range_addressable() {
        let cortex = SoundCortex::new().into_shared();
        let mut bus = SpiSlave::new(cortex.clone(), ChipSelect::Psg);
        // The virtual clock selector sits at the very top of the map
        assert!(bus.write_frame(0xff01));
        assert_eq!(
            cortex.lock().psg().clock(),
            crate::cortex::VirtualClock::Alternate
        );
    }
}
