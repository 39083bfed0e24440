//! Dual-chip sound synthesis core for a bus-attached synthesizer peripheral
//!
//! Emulates two classic sound generator chips behind their original register
//! interfaces: a 3-channel square/noise PSG and a 5-channel wavetable
//! synthesizer (register-compatible with the "+" variant of the original
//! chip). A host drives the chips through byte-oriented bus transactions
//! exactly as it would drive the real hardware, while a fixed-rate sample
//! clock renders the combined output one unsigned word per tick, ready for an
//! 8-bit PWM output stage.
//!
//! # Features
//! - Sample-accurate tone, noise and wavetable state machines
//! - Bit-exact register maps, including version readback and the virtual
//!   clock select
//! - Register writes may land between any two samples without clicks, partial
//!   states or render stalls
//! - SMF (format 0) event sequencer replaying note events as register writes
//! - I2C-, SPI- and parallel-handshake-style bus slave adapters
//! - Optional real-time streaming output for hosts without a PWM timer
//!
//! # Crate feature flags
//! - `psg` (default): Square/noise synthesizer engine (`psg`)
//! - `scc` (default): Wavetable synthesizer engine (`scc`)
//! - `sequencer` (default): SMF event sequencer (`sequencer`, implies `psg`)
//! - `i2c`/`spi`/`parallel` (default): Bus slave adapters (`bus`)
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio`
//!   dep)
//!
//! # Quick start
//! ## Drive the chips directly
//! ```no_run
//! use soundcortex::{ChipSelect, SoundCortex};
//! let mut cortex = SoundCortex::new();
//! cortex.write(ChipSelect::Psg, 0x00, 0xfe).unwrap(); // Tone A lo
//! cortex.write(ChipSelect::Psg, 0x01, 0x00).unwrap(); // Tone A hi
//! cortex.write(ChipSelect::Psg, 0x07, 0x3e).unwrap(); // Mixer: tone A on
//! cortex.write(ChipSelect::Psg, 0x08, 0x0f).unwrap(); // Level A
//! let sample = cortex.render_next_sample();
//! # let _ = sample;
//! ```
//!
//! ## Replay an SMF file
//! ```no_run
//! # #[cfg(feature = "sequencer")]
//! # {
//! use soundcortex::{Sequencer, SoundCortex};
//! let data = std::fs::read("song.mid").unwrap();
//! let mut cortex = SoundCortex::new();
//! cortex.attach_sequencer(Sequencer::new(data).unwrap()).unwrap();
//! while cortex.sequencer_active() {
//!     let sample = cortex.render_next_sample();
//!     // hand `sample` to the output stage at the configured rate
//! #   let _ = sample;
//! }
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules (feature-gated for modular use)
#[cfg(any(feature = "i2c", feature = "spi", feature = "parallel"))]
pub mod bus; // Bus slave protocol adapters
pub mod cortex; // Device aggregate & output mixing
#[cfg(feature = "psg")]
pub mod psg; // Square/noise synthesizer (core)
#[cfg(feature = "scc")]
pub mod scc; // Wavetable synthesizer (core)
#[cfg(feature = "sequencer")]
pub mod sequencer; // SMF event sequencer
#[cfg(feature = "streaming")]
pub mod streaming; // Audio output & streaming

/// Error types for synthesis core operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CortexError {
    /// Write or read to a register address outside the chip's map. The bus
    /// slave that issued the access must translate this into a protocol-level
    /// negative-acknowledge; synthesis state is left untouched.
    #[error("unknown register 0x{register:02x}")]
    UnknownRegister {
        /// The offending register address
        register: u8,
    },

    /// Event stream failed structural validation (bad header magic, size or
    /// format, or a truncated/overlong encoding mid-stream)
    #[error("malformed event stream: {0}")]
    MalformedStream(&'static str),

    /// Event status byte the sequencer does not implement; playback halts
    /// but sample rendering continues
    #[error("unsupported sequencer event 0x{status:02x}")]
    UnsupportedEvent {
        /// The offending status byte
        status: u8,
    },

    /// Audio device error from the host output backend
    #[cfg(feature = "streaming")]
    #[error("audio device error: {0}")]
    AudioDevice(String),
}

/// Result type for synthesis core operations
pub type Result<T> = std::result::Result<T, CortexError>;

// Public API exports
pub use cortex::{
    ChipSelect, CortexConfig, SharedCortex, SoundCortex, VirtualClock, DEFAULT_SAMPLE_RATE,
    OUTPUT_BIAS,
};

#[cfg(feature = "i2c")]
pub use bus::I2cSlave;
#[cfg(feature = "parallel")]
pub use bus::ParallelSlave;
#[cfg(feature = "spi")]
pub use bus::SpiSlave;
#[cfg(any(feature = "i2c", feature = "spi", feature = "parallel"))]
pub use bus::BusSlave;
#[cfg(feature = "psg")]
pub use psg::Psg;
#[cfg(feature = "scc")]
pub use scc::Scc;
#[cfg(feature = "sequencer")]
pub use sequencer::Sequencer;
#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, RingBuffer, SampleClock};
