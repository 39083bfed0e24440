//! Handshake-based parallel bus slave
//!
//! The parallel port presents a port byte alongside each handshaked data
//! byte. The port byte selects the chip, exactly like a device address on
//! the two-wire bus; within one access sequence the data bytes assemble a
//! register/value pair. The electrical handshake (ready/strobe signaling)
//! is the embedding's business.

use super::{PSG_ADDRESS, SCC_ADDRESS};
use crate::cortex::{ChipSelect, SharedCortex};

/// Parallel bus slave adapter
#[derive(Debug)]
pub struct ParallelSlave {
    cortex: SharedCortex,
    psg_port: u8,
    scc_port: u8,
    selected: Option<ChipSelect>,
    register: u8,
    index: u8,
}

impl ParallelSlave {
    /// Create an adapter answering the default chip ports
    pub fn new(cortex: SharedCortex) -> Self {
        Self::with_ports(cortex, PSG_ADDRESS, SCC_ADDRESS)
    }

    /// Create an adapter answering custom chip ports
    pub fn with_ports(cortex: SharedCortex, psg_port: u8, scc_port: u8) -> Self {
        ParallelSlave {
            cortex,
            psg_port,
            scc_port,
            selected: None,
            register: 0,
            index: 0,
        }
    }

    /// Access phase: returns whether this device claims `port`. Claiming a
    /// port starts a fresh register/value sequence.
    pub fn access(&mut self, port: u8) -> bool {
        self.selected = if port == self.psg_port {
            Some(ChipSelect::Psg)
        } else if port == self.scc_port {
            Some(ChipSelect::Scc)
        } else {
            None
        };
        self.index = 0;
        self.selected.is_some()
    }

    /// Handshaked data byte written by the master. Returns `false` when the
    /// byte must be refused.
    pub fn write(&mut self, port: u8, data: u8) -> bool {
        let Some(chip) = self.selected else {
            return false;
        };
        if !self.port_matches(chip, port) {
            return false;
        }
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

    /// Handshaked read, answered from the latched register. `None` must be
    /// refused.
    pub fn read(&mut self, port: u8) -> Option<u8> {
        let chip = self.selected?;
        if !self.port_matches(chip, port) {
            return None;
        }
        self.cortex.lock().read(chip, self.register).ok()
    }

    fn port_matches(&self, chip: ChipSelect, port: u8) -> bool {
        match chip {
            ChipSelect::Psg => port == self.psg_port,
            ChipSelect::Scc => port == self.scc_port,
        }
    }
}
