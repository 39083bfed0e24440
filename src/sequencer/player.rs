//! Event replay against the square/noise engine
//!
//! [`Sequencer::update`] is handed the microseconds elapsed since the
//! previous call (normally once per sample tick, inline in the render path)
//! and plays every event whose delta time has come due — zero, one or many
//! per call. All register traffic goes through [`Psg::write`], the same
//! entry point a bus slave uses.

use super::notes::NOTE_PERIODS;
use super::smf::SmfTrack;
use crate::psg::{registers, Psg};
use crate::{CortexError, Result};

/// Default tempo in microseconds per quarter note until a tempo event
/// overrides it
const DEFAULT_TEMPO: u32 = 1_000_000;

/// Replays a validated SMF track as timed register writes
#[derive(Debug, Clone)]
pub struct Sequencer {
    track: SmfTrack,
    /// Read position within the track's event bytes
    pos: usize,
    /// Microseconds per quarter note
    tempo: u32,
    /// Microseconds per division tick
    tick_us: u32,
    /// Microseconds until the next pending event
    pending_us: u64,
    repeat: bool,
    gap: u16,
    done: bool,
}

impl Sequencer {
    /// Parse `data` and build a non-repeating sequencer
    pub fn new(data: Vec<u8>) -> Result<Self> {
        Self::with_options(data, false, 0)
    }

    /// Parse `data` and build a sequencer; a repeating one restarts at end
    /// of track after `gap` extra division ticks
    pub fn with_options(data: Vec<u8>, repeat: bool, gap: u16) -> Result<Self> {
        let track = SmfTrack::parse(data)?;
        // A zero tick would let update() replay the track without consuming
        // any elapsed time
        let tick_us = (DEFAULT_TEMPO / track.division as u32).max(1);
        Ok(Sequencer {
            track,
            pos: 0,
            tempo: DEFAULT_TEMPO,
            tick_us,
            pending_us: 0,
            repeat,
            gap,
            done: false,
        })
    }

    /// Whether playback has ended (end of track without repeat, or a
    /// decode failure)
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance playback by `elapsed_us` microseconds, issuing register
    /// writes for every event that comes due.
    ///
    /// Returns `Ok(true)` while playback continues and `Ok(false)` once the
    /// track has ended. A decode failure latches the done state and is
    /// reported once; rendering is unaffected either way.
    pub fn update(&mut self, elapsed_us: u32, psg: &mut Psg) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let mut budget = elapsed_us as u64;
        while budget != 0 {
            if self.pending_us == 0 {
                self.pending_us = match self.read_delta() {
                    Ok(delta) => delta as u64 * self.tick_us as u64,
                    Err(error) => {
                        self.done = true;
                        return Err(error);
                    }
                };
            }
            if self.pending_us > budget {
                self.pending_us -= budget;
                return Ok(true);
            }
            budget -= self.pending_us;
            self.pending_us = 0;

            match self.process_event(psg) {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return Ok(false);
                }
                Err(error) => {
                    self.done = true;
                    return Err(error);
                }
            }
        }
        Ok(true)
    }

    /// Decode and execute the event at the read position. Returns
    /// `Ok(false)` on a final end-of-track.
    fn process_event(&mut self, psg: &mut Psg) -> Result<bool> {
        let status = self.read_u8()?;
        match status & 0xf0 {
            0x80 => {
                let _note = self.read_u8()?;
                let _velocity = self.read_u8()?;
                note_off(status & 0x0f, psg)?;
            }
            0x90 => {
                let note = self.read_u8()?;
                let velocity = self.read_u8()?;
                note_on(status & 0x0f, note, velocity, psg)?;
            }
            0xf0 => {
                if status != 0xff {
                    return Err(CortexError::UnsupportedEvent { status });
                }
                let kind = self.read_u8()?;
                let size = self.read_u8()?;
                if kind == 0x2f && size == 0 {
                    if !self.repeat {
                        return Ok(false);
                    }
                    self.pos = 0;
                    let delta = self.read_delta()?;
                    // Even an empty looping track must consume time, or
                    // update() would never exhaust its budget
                    self.pending_us =
                        ((delta as u64 + self.gap as u64) * self.tick_us as u64).max(1);
                } else if kind == 0x51 && size == 3 {
                    let bytes = [self.read_u8()?, self.read_u8()?, self.read_u8()?];
                    self.tempo = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
                    self.tick_us = (self.tempo / self.track.division as u32).max(1);
                } else {
                    self.skip(size as usize)?;
                }
            }
            _ => return Err(CortexError::UnsupportedEvent { status }),
        }
        Ok(true)
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = self
            .track
            .events()
            .get(self.pos)
            .copied()
            .ok_or(CortexError::MalformedStream("unexpected end of track"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        if self.pos + count > self.track.events().len() {
            return Err(CortexError::MalformedStream("unexpected end of track"));
        }
        self.pos += count;
        Ok(())
    }

    /// Decode a variable-length delta time: seven data bits per byte, high
    /// bit marks continuation, at most four bytes.
    fn read_delta(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CortexError::MalformedStream("delta time exceeds four bytes"))
    }
}

fn note_on(channel: u8, note: u8, velocity: u8, psg: &mut Psg) -> Result<()> {
    if channel > 2 {
        return Ok(());
    }
    let period = NOTE_PERIODS[(note & 0x7f) as usize];
    psg.write(channel * 2, (period & 0xff) as u8)?;
    psg.write(channel * 2 + 1, (period >> 8) as u8)?;
    psg.write(registers::LEVEL_BASE + channel, velocity >> 3)?;
    Ok(())
}

fn note_off(channel: u8, psg: &mut Psg) -> Result<()> {
    if channel > 2 {
        return Ok(());
    }
    psg.write(registers::LEVEL_BASE + channel, 0)?;
    Ok(())
}
