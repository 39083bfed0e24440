//! Bus Slave Protocol Adapters
//!
//! Each adapter turns the byte-level traffic of one physical bus into
//! complete (chip, register, value) accesses against a shared
//! [`SoundCortex`](crate::cortex::SoundCortex). The electrical layer —
//! two-wire timing, serial framing, handshake signaling — stays outside;
//! the embedding calls these adapters from whatever interrupt or callback
//! its peripheral hardware provides.
//!
//! A refused byte (unknown register, overlong transaction, unmatched
//! address) is reported back as `false`/`None`, which the electrical layer
//! must translate into its protocol's negative-acknowledge. Refusals never
//! disturb synthesis state.
//!
//! Adapters buffer a full register/value pair before touching the device,
//! so the sample clock can never observe a half-delivered write.

#[cfg(feature = "i2c")]
mod i2c;
#[cfg(feature = "parallel")]
mod parallel;
#[cfg(feature = "spi")]
mod spi;

#[cfg(feature = "i2c")]
pub use i2c::I2cSlave;
#[cfg(feature = "parallel")]
pub use parallel::ParallelSlave;
#[cfg(feature = "spi")]
pub use spi::SpiSlave;

/// Device address answered for the square/noise chip on addressed buses
pub const PSG_ADDRESS: u8 = 0x50;

/// Device address answered for the wavetable chip on addressed buses
pub const SCC_ADDRESS: u8 = 0x51;

/// The bus slave capability injected at device initialization
///
/// Exactly one variant is active per physical port; `None` leaves the port
/// unused. The embedding matches on the variant and forwards its
/// peripheral's events to the inner adapter.
#[derive(Debug)]
pub enum BusSlave {
    /// Addressed two-wire slave
    #[cfg(feature = "i2c")]
    I2c(I2cSlave),
    /// Synchronous serial slave, 16-bit frames
    #[cfg(feature = "spi")]
    Spi(SpiSlave),
    /// Handshake-based parallel slave
    #[cfg(feature = "parallel")]
    Parallel(ParallelSlave),
    /// No bus attached
    None,
}

impl Default for BusSlave {
    fn default() -> Self {
        BusSlave::None
    }
}
