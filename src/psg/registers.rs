//! Register addresses and mixer bit decoding for the square/noise engine

use bitflags::bitflags;

/// Mixer control register address
pub const MIXER: u8 = 0x07;

/// First channel level register address (one per channel)
pub const LEVEL_BASE: u8 = 0x08;

/// Virtual clock select (write-only)
pub const CLOCK_SELECT: u8 = 0xff;

/// Minor version identifier, readable at 0xfe
pub const VERSION_MINOR: u8 = 1;

/// Major version identifier, readable at 0xff
pub const VERSION_MAJOR: u8 = 1;

bitflags! {
    /// Mixer control register bits (register 0x07)
    ///
    /// Bits are active-low mutes, as on the original chip: a set bit
    /// silences that channel's tone or noise contribution. Power-on state is
    /// all bits set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MixerFlags: u8 {
        /// Channel 0 tone mute
        const TONE_A = 0x01;
        /// Channel 1 tone mute
        const TONE_B = 0x02;
        /// Channel 2 tone mute
        const TONE_C = 0x04;
        /// Channel 0 noise mute
        const NOISE_A = 0x08;
        /// Channel 1 noise mute
        const NOISE_B = 0x10;
        /// Channel 2 noise mute
        const NOISE_C = 0x20;
    }
}

impl MixerFlags {
    /// Decode a raw mixer register value
    pub fn from_register(value: u8) -> Self {
        MixerFlags::from_bits_truncate(value)
    }

    /// Whether the given channel's tone output is muted
    pub fn tone_muted(self, channel: usize) -> bool {
        self.bits() & (1 << channel) != 0
    }

    /// Whether the given channel's noise gating is muted
    pub fn noise_muted(self, channel: usize) -> bool {
        self.bits() & (1 << (channel + 3)) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_all_clear_enables_everything() {
        let flags = MixerFlags::from_register(0x00);
        for channel in 0..3 {
            assert!(!flags.tone_muted(channel));
            assert!(!flags.noise_muted(channel));
        }
    }

    #[test]
    fn test_mixer_tones_only() {
        // Tones audible, noise muted on all three channels
        let flags = MixerFlags::from_register(0x38);
        for channel in 0..3 {
            assert!(!flags.tone_muted(channel), "tone {} should be live", channel);
            assert!(flags.noise_muted(channel), "noise {} should be muted", channel);
        }
    }

    #[test]
    fn test_mixer_upper_bits_ignored() {
        let flags = MixerFlags::from_register(0xff);
        assert_eq!(flags.bits(), 0x3f);
    }
}
