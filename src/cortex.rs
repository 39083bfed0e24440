//! Device aggregate and output mixing
//!
//! [`SoundCortex`] owns one instance of each compiled-in synthesizer engine
//! and, optionally, the event sequencer. Bus slaves address the engines
//! through [`SoundCortex::write`]/[`SoundCortex::read`]; the output stage
//! calls [`SoundCortex::render_next_sample`] once per sample period.
//!
//! The blend of the two engines is selected at build time through the `psg`
//! and `scc` features: square-only, wavetable-only, or both attenuated and
//! summed. In every configuration the output word stays inside the 8-bit
//! PWM range and the all-silent output is exactly [`OUTPUT_BIAS`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{CortexError, Result};

/// Default output sample rate in Hz (12 MHz / 256 for 8-bit PWM)
pub const DEFAULT_SAMPLE_RATE: u32 = 46_875;

/// Midpoint bias of the output word; the defined silent output value
pub const OUTPUT_BIAS: u16 = 80;

/// Selectable input clock for period-to-limit conversion
///
/// Written through the square/noise engine's register 0xff and applied to
/// both engines (the selector is device-global).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VirtualClock {
    /// Nominal chip clock, 3.579545 MHz
    #[default]
    Nominal,
    /// Faster alternate clock, 4 MHz
    Alternate,
}

impl VirtualClock {
    /// Clock frequency in Hz; doubles as the per-tick phase step
    pub fn hz(self) -> u32 {
        match self {
            VirtualClock::Nominal => 3_579_545,
            VirtualClock::Alternate => 4_000_000,
        }
    }
}

/// Chip identity for bus-addressed register access
///
/// The two engines expose independent register address spaces even when
/// reached through the same physical bus, so every access names its target
/// chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipSelect {
    /// The square/noise synthesizer
    Psg,
    /// The wavetable synthesizer
    Scc,
}

/// Device configuration for hosts that construct the core from a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CortexConfig {
    /// Output sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Whether the sequencer loops at end of track
    #[serde(default)]
    pub repeat: bool,
    /// Extra delay ticks inserted before each loop iteration
    #[serde(default)]
    pub gap: u16,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for CortexConfig {
    fn default() -> Self {
        CortexConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            repeat: false,
            gap: 0,
        }
    }
}

/// Integer microsecond clock: yields the elapsed microseconds per sample
/// tick with the division remainder carried forward, so sequencer time
/// never drifts at any sample rate.
#[derive(Debug, Clone, Copy)]
#[cfg(feature = "sequencer")]
struct MicroTicker {
    whole: u32,
    frac: u32,
    rate: u32,
    carry: u32,
}

#[cfg(feature = "sequencer")]
impl MicroTicker {
    fn new(sample_rate: u32) -> Self {
        MicroTicker {
            whole: 1_000_000 / sample_rate,
            frac: 1_000_000 % sample_rate,
            rate: sample_rate,
            carry: 0,
        }
    }

    fn next(&mut self) -> u32 {
        let mut elapsed = self.whole;
        self.carry += self.frac;
        if self.carry >= self.rate {
            self.carry -= self.rate;
            elapsed += 1;
        }
        elapsed
    }
}

/// The synthesizer device: engines, sequencer and output mixer in one
/// single-owner struct
///
/// Exactly one instance exists per emulated device. For hosts where bus
/// traffic and the sample clock live on different threads, wrap it with
/// [`SoundCortex::into_shared`]; each locked register write is then one
/// indivisible update relative to the render path.
#[derive(Debug)]
pub struct SoundCortex {
    sample_rate: u32,
    #[cfg(feature = "psg")]
    psg: crate::psg::Psg,
    #[cfg(feature = "scc")]
    scc: crate::scc::Scc,
    #[cfg(feature = "sequencer")]
    sequencer: Option<crate::sequencer::Sequencer>,
    #[cfg(feature = "sequencer")]
    micros: MicroTicker,
}

impl SoundCortex {
    /// Create a device at the default 46.875 kHz sample rate
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Create a device with a custom output sample rate
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        SoundCortex {
            sample_rate,
            #[cfg(feature = "psg")]
            psg: crate::psg::Psg::with_sample_rate(sample_rate),
            #[cfg(feature = "scc")]
            scc: crate::scc::Scc::with_sample_rate(sample_rate),
            #[cfg(feature = "sequencer")]
            sequencer: None,
            #[cfg(feature = "sequencer")]
            micros: MicroTicker::new(sample_rate),
        }
    }

    /// Create a device from a host configuration
    pub fn from_config(config: &CortexConfig) -> Self {
        Self::with_sample_rate(config.sample_rate)
    }

    /// The configured output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Reset every engine to power-on state and detach the sequencer
    pub fn reset(&mut self) {
        #[cfg(feature = "psg")]
        self.psg.reset();
        #[cfg(feature = "scc")]
        self.scc.reset();
        #[cfg(feature = "sequencer")]
        {
            self.sequencer = None;
            self.micros = MicroTicker::new(self.sample_rate);
        }
    }

    /// Write one register of the addressed chip.
    ///
    /// This is the single entry point all bus slaves and the sequencer
    /// funnel through; an `Err` must be answered with a bus-level
    /// negative-acknowledge. A write to a chip that is compiled out fails
    /// like any other unmapped address.
    pub fn write(&mut self, chip: ChipSelect, register: u8, value: u8) -> Result<()> {
        match chip {
            #[cfg(feature = "psg")]
            ChipSelect::Psg => {
                self.psg.write(register, value)?;
                // The virtual clock selector is device-global
                #[cfg(feature = "scc")]
                if register == crate::psg::registers::CLOCK_SELECT {
                    self.scc.set_clock(self.psg.clock());
                }
                Ok(())
            }
            #[cfg(feature = "scc")]
            ChipSelect::Scc => self.scc.write(register, value),
            #[allow(unreachable_patterns)]
            _ => Err(CortexError::UnknownRegister { register }),
        }
    }

    /// Read one register of the addressed chip
    pub fn read(&self, chip: ChipSelect, register: u8) -> Result<u8> {
        match chip {
            #[cfg(feature = "psg")]
            ChipSelect::Psg => self.psg.read(register),
            #[cfg(feature = "scc")]
            ChipSelect::Scc => self.scc.read(register),
            #[allow(unreachable_patterns)]
            _ => Err(CortexError::UnknownRegister { register }),
        }
    }

    /// Direct access to the square/noise engine
    #[cfg(feature = "psg")]
    pub fn psg(&self) -> &crate::psg::Psg {
        &self.psg
    }

    /// Direct access to the wavetable engine
    #[cfg(feature = "scc")]
    pub fn scc(&self) -> &crate::scc::Scc {
        &self.scc
    }

    /// Attach a sequencer; it is ticked inline by
    /// [`SoundCortex::render_next_sample`] from then on.
    ///
    /// Activation enables the three tone channels through the same mixer
    /// register path a bus write would take.
    #[cfg(feature = "sequencer")]
    pub fn attach_sequencer(&mut self, sequencer: crate::sequencer::Sequencer) -> Result<()> {
        self.psg.write(crate::psg::registers::MIXER, 0x38)?;
        self.sequencer = Some(sequencer);
        Ok(())
    }

    /// Whether an attached sequencer is still replaying events
    #[cfg(feature = "sequencer")]
    pub fn sequencer_active(&self) -> bool {
        self.sequencer.is_some()
    }

    /// Render one output sample.
    ///
    /// Called once per sample period from the output stage's timer context;
    /// everything here is integer arithmetic with bounded iteration, so the
    /// call fits the per-sample deadline. The returned word lies within the
    /// 8-bit PWM range.
    pub fn render_next_sample(&mut self) -> u16 {
        #[cfg(feature = "sequencer")]
        self.advance_sequencer();

        let mut sample = i32::from(OUTPUT_BIAS);
        #[cfg(feature = "psg")]
        {
            sample += i32::from(self.psg.compute_next_sample() >> 3);
        }
        #[cfg(feature = "scc")]
        {
            sample += i32::from(self.scc.compute_next_sample() >> 7);
        }
        debug_assert!((0..=255).contains(&sample));
        sample as u16
    }

    /// Feed the attached sequencer the microseconds covered by one sample.
    ///
    /// A finished or failed sequencer is detached; rendering continues with
    /// whatever register state it left behind.
    #[cfg(feature = "sequencer")]
    fn advance_sequencer(&mut self) {
        if self.sequencer.is_none() {
            return;
        }
        let elapsed = self.micros.next();
        let Some(sequencer) = self.sequencer.as_mut() else {
            return;
        };
        let playing = matches!(sequencer.update(elapsed, &mut self.psg), Ok(true));
        if !playing {
            self.sequencer = None;
        }
    }

    /// Wrap the device for sharing between a bus thread and the sample
    /// clock thread
    pub fn into_shared(self) -> SharedCortex {
        Arc::new(Mutex::new(self))
    }
}

impl Default for SoundCortex {
    fn default() -> Self {
        Self::new()
    }
}

/// A device handle shared between bus adapters and the sample clock
pub type SharedCortex = Arc<Mutex<SoundCortex>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_device_renders_bias() {
        let mut cortex = SoundCortex::new();
        for _ in 0..100 {
            assert_eq!(cortex.render_next_sample(), OUTPUT_BIAS);
        }
    }

    #[test]
    #[cfg(feature = "psg")]
    fn test_silence_independent_of_period_and_level_writes() {
        let mut cortex = SoundCortex::new();
        cortex.write(ChipSelect::Psg, 0x00, 0x55).unwrap();
        cortex.write(ChipSelect::Psg, 0x01, 0x05).unwrap();
        cortex.write(ChipSelect::Psg, 0x08, 0x0f).unwrap();
        cortex.write(ChipSelect::Psg, 0x07, 0x3f).unwrap();
        for _ in 0..1000 {
            assert_eq!(cortex.render_next_sample(), OUTPUT_BIAS);
        }
    }

    #[test]
    fn test_output_word_stays_in_pwm_range() {
        let mut cortex = SoundCortex::new();
        // Drive both engines as loud as the register maps allow
        #[cfg(feature = "psg")]
        {
            for channel in 0..3u8 {
                cortex.write(ChipSelect::Psg, channel * 2, 1).unwrap();
                cortex.write(ChipSelect::Psg, 0x08 + channel, 0x0f).unwrap();
            }
            cortex.write(ChipSelect::Psg, 0x07, 0x38).unwrap();
        }
        #[cfg(feature = "scc")]
        {
            for channel in 0..5u8 {
                for entry in 0..32u8 {
                    let value = if entry < 16 { 0x7f } else { 0x80 };
                    cortex
                        .write(ChipSelect::Scc, (channel << 5) | entry, value)
                        .unwrap();
                }
                cortex.write(ChipSelect::Scc, 0xa0 + channel * 2, 1).unwrap();
                cortex.write(ChipSelect::Scc, 0xaa + channel, 0x0f).unwrap();
            }
            cortex.write(ChipSelect::Scc, 0xaf, 0x00).unwrap();
        }

        for _ in 0..50_000 {
            let sample = cortex.render_next_sample();
            assert!(sample <= 255, "output word {} left the PWM range", sample);
        }
    }

    #[test]
    #[cfg(all(feature = "psg", feature = "scc"))]
    fn test_clock_select_reaches_both_engines() {
        let mut cortex = SoundCortex::new();
        cortex.write(ChipSelect::Psg, 0xff, 1).unwrap();
        assert_eq!(cortex.psg().clock(), VirtualClock::Alternate);
        assert_eq!(cortex.scc().clock(), VirtualClock::Alternate);
        cortex.write(ChipSelect::Psg, 0xff, 0).unwrap();
        assert_eq!(cortex.scc().clock(), VirtualClock::Nominal);
    }

    #[test]
    fn test_micro_ticker_has_no_drift() {
        #[cfg(feature = "sequencer")]
        {
            let mut ticker = MicroTicker::new(DEFAULT_SAMPLE_RATE);
            let total: u64 = (0..DEFAULT_SAMPLE_RATE).map(|_| ticker.next() as u64).sum();
            assert_eq!(total, 1_000_000, "one second of ticks must be 1e6 us");
        }
    }

    #[test]
    fn test_config_defaults() {
        let config: CortexConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert!(!config.repeat);
        assert_eq!(config.gap, 0);
    }
}
