//! Square/Noise Synthesizer Engine
//!
//! Emulates the 3-channel programmable sound generator: three square-wave
//! tone oscillators sharing one pseudo-random noise generator, driven by a
//! 12-bit period divisor and a 4-bit logarithmic level per channel.
//!
//! The register map (see [`Psg::write`]) is the bit-exact surface every bus
//! slave and the sequencer target. Envelope registers (0x0b-0x0d) are
//! accepted without effect.

mod chip;
pub mod registers;
pub mod tables;

pub use chip::Psg;
pub use registers::MixerFlags;
