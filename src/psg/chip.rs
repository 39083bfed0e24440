//! Square/noise synthesizer state machines
//!
//! Three tone oscillators and one shared noise generator, each a
//! counter/limit phase accumulator advanced once per output tick by the
//! active virtual clock step. Register writes recompute the derived `limit`
//! values; the render path never divides.

use super::registers::{self, MixerFlags};
use super::tables;
use crate::cortex::{VirtualClock, DEFAULT_SAMPLE_RATE};
use crate::{CortexError, Result};

/// Power-on noise generator seed
const NOISE_SEED: u32 = 0xffff;

/// Feedback mask injected when the LFSR taps fire (bit 16 of the 17-bit
/// register)
const NOISE_TAP: u32 = 0x10000;

/// One square-wave tone channel: register image plus oscillator runtime
#[derive(Debug, Clone, Copy)]
struct ToneChannel {
    /// 12-bit tone period divisor, assembled from the register pair
    period: u16,
    /// 5-bit stored level (bit 4 = envelope mode, reserved)
    level: u8,
    /// Phase accumulator bound, `period * 16 * sample_rate`
    limit: u32,
    /// Phase accumulator, advanced by the clock step each tick
    count: u32,
    /// Square phase flag, flipped on each accumulator expiry
    on: bool,
    /// Cached volume table entry for `level`
    out: u16,
    tone_muted: bool,
    noise_muted: bool,
}

impl ToneChannel {
    fn new() -> Self {
        ToneChannel {
            period: 0,
            level: 0,
            limit: 0,
            count: 0,
            on: false,
            out: 0,
            tone_muted: true,
            noise_muted: true,
        }
    }

    /// Advance the oscillator by one tick of `step` clock cycles.
    ///
    /// `limit == 0` is the degenerate silent state: the phase is pinned so
    /// the accumulator cannot overflow while a channel sits unprogrammed.
    fn advance(&mut self, step: u32) {
        if self.limit == 0 {
            self.count = 0;
            return;
        }
        self.count += step;
        while self.count >= self.limit {
            self.count -= self.limit;
            self.on = !self.on;
        }
    }

    /// Combine the square phase, level and noise bit into this channel's
    /// contribution.
    ///
    /// Gating rule: a muted tone contributes nothing; an enabled noise gate
    /// ANDs the square output with the noise bitstream. Kept in one place so
    /// it can be validated against a reference capture in isolation.
    fn gate_output(&self, noise_bit: bool) -> u16 {
        if self.tone_muted {
            return 0;
        }
        let mut sample = if self.on { self.out } else { 0 };
        if !self.noise_muted && !noise_bit {
            sample = 0;
        }
        sample
    }
}

/// Shared noise generator: counter/limit pacing a 17-bit LFSR
#[derive(Debug, Clone, Copy)]
struct NoiseGenerator {
    /// 5-bit noise period divisor
    period: u8,
    limit: u32,
    count: u32,
    /// 17-bit shift register, never zero
    seed: u32,
}

impl NoiseGenerator {
    fn new() -> Self {
        NoiseGenerator {
            period: 0,
            limit: 0,
            count: 0,
            seed: NOISE_SEED,
        }
    }

    fn advance(&mut self, step: u32) {
        if self.limit == 0 {
            self.count = 0;
            return;
        }
        self.count += step;
        while self.count >= self.limit {
            self.count -= self.limit;
            self.step_lfsr();
        }
    }

    /// One LFSR step: feedback is bit 0 XOR bit 3, fed back into bit 16.
    fn step_lfsr(&mut self) {
        let feedback = (self.seed ^ (self.seed >> 3)) & 1;
        self.seed = (self.seed >> 1) ^ if feedback != 0 { NOISE_TAP } else { 0 };
        if self.seed == 0 {
            // Unreachable from a non-zero state; keeps the invariant explicit
            self.seed = NOISE_TAP;
        }
    }

    fn output_bit(&self) -> bool {
        self.seed & 1 != 0
    }
}

/// Square/noise synthesizer chip: register bank plus render state
///
/// One instance per device. Bus slaves call [`Psg::write`]/[`Psg::read`];
/// the sample clock calls [`Psg::compute_next_sample`] once per tick. Each
/// write is a complete, indivisible update of the derived state, so a tick
/// landing between any two writes sees a consistent register image.
#[derive(Debug, Clone)]
pub struct Psg {
    sample_rate: u32,
    clock: VirtualClock,
    channels: [ToneChannel; 3],
    noise: NoiseGenerator,
}

impl Psg {
    /// Create a chip at the default 46.875 kHz sample rate
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Create a chip with a custom output sample rate.
    ///
    /// Rates above 65535 Hz would overflow the 32-bit phase arithmetic at
    /// the largest period divisors.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0 && sample_rate <= 65_535);
        Psg {
            sample_rate,
            clock: VirtualClock::Nominal,
            channels: [ToneChannel::new(); 3],
            noise: NoiseGenerator::new(),
        }
    }

    /// Reset all channels and the noise generator to power-on state
    pub fn reset(&mut self) {
        *self = Self::with_sample_rate(self.sample_rate);
    }

    /// Write a register. Unknown addresses fail with
    /// [`CortexError::UnknownRegister`] and leave all state unchanged.
    pub fn write(&mut self, register: u8, value: u8) -> Result<()> {
        match register {
            // Tone period pairs: even = low byte, odd = high nibble
            0x00..=0x05 => {
                let channel = &mut self.channels[(register >> 1) as usize];
                if register & 1 == 0 {
                    channel.period = (channel.period & 0x0f00) | value as u16;
                } else {
                    channel.period = (channel.period & 0x00ff) | (((value & 0x0f) as u16) << 8);
                }
                channel.limit = channel.period as u32 * 16 * self.sample_rate;
            }
            0x06 => {
                self.noise.period = value & 0x1f;
                self.noise.limit = self.noise.period as u32 * 2 * 16 * self.sample_rate;
            }
            registers::MIXER => {
                let flags = MixerFlags::from_register(value);
                for (i, channel) in self.channels.iter_mut().enumerate() {
                    channel.tone_muted = flags.tone_muted(i);
                    channel.noise_muted = flags.noise_muted(i);
                }
            }
            0x08..=0x0a => {
                let channel = &mut self.channels[(register - registers::LEVEL_BASE) as usize];
                channel.level = value & 0x1f;
                channel.out = tables::VOLUME_TABLE[tables::level_index(channel.level)];
            }
            // Envelope period/shape: accepted, envelope generation is not
            // implemented
            0x0b..=0x0d => {}
            // I/O port latches, not routed anywhere
            0x0e..=0x0f => {}
            registers::CLOCK_SELECT => {
                self.clock = if value == 0 {
                    VirtualClock::Nominal
                } else {
                    VirtualClock::Alternate
                };
            }
            _ => return Err(CortexError::UnknownRegister { register }),
        }
        Ok(())
    }

    /// Read a register. Only the version identifiers are readable.
    pub fn read(&self, register: u8) -> Result<u8> {
        match register {
            0xfe => Ok(registers::VERSION_MINOR),
            0xff => Ok(registers::VERSION_MAJOR),
            _ => Err(CortexError::UnknownRegister { register }),
        }
    }

    /// Render one tick: advance the noise generator and all three
    /// oscillators, then sum the gated channel outputs.
    ///
    /// The sum of three volume-table entries is at most `3 * 0xff`, well
    /// inside `u16`.
    pub fn compute_next_sample(&mut self) -> u16 {
        let step = self.clock.hz();
        self.noise.advance(step);
        let noise_bit = self.noise.output_bit();

        let mut sum = 0u16;
        for channel in &mut self.channels {
            channel.advance(step);
            sum += channel.gate_output(noise_bit);
        }
        sum
    }

    /// The currently selected virtual clock
    pub fn clock(&self) -> VirtualClock {
        self.clock
    }

    /// Assembled 12-bit period of a tone channel (0 for out-of-range
    /// channels)
    pub fn channel_period(&self, channel: usize) -> u16 {
        self.channels.get(channel).map_or(0, |c| c.period)
    }

    /// Stored 5-bit level of a tone channel
    pub fn channel_level(&self, channel: usize) -> u8 {
        self.channels.get(channel).map_or(0, |c| c.level)
    }

    /// Derived phase accumulator bound of a tone channel
    pub fn channel_limit(&self, channel: usize) -> u32 {
        self.channels.get(channel).map_or(0, |c| c.limit)
    }
}

impl Default for Psg {
    fn default() -> Self {
        Self::new()
    }
}
