//! SMF container parsing
//!
//! The sequencer consumes a minimal subset of the Standard MIDI File
//! format: a 14-byte header chunk (magic, length 6, format 0, exactly one
//! track, ticks-per-quarter-note division) followed by a single track
//! chunk. Everything is validated up front; a stream that fails here never
//! activates the sequencer.

use crate::{CortexError, Result};

/// Length of the fixed header chunk plus the track chunk preamble
const TRACK_DATA_OFFSET: usize = 22;

/// A validated single-track event stream
///
/// Owns the file bytes for the lifetime of the sequencer, so event decoding
/// never outlives its buffer.
#[derive(Debug, Clone)]
pub struct SmfTrack {
    data: Vec<u8>,
    track_end: usize,
    /// Ticks per quarter note from the header chunk
    pub division: u16,
}

impl SmfTrack {
    /// Validate the header and track chunk of `data`.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        if data.len() < TRACK_DATA_OFFSET {
            return Err(CortexError::MalformedStream("stream shorter than header"));
        }
        if &data[0..4] != b"MThd" {
            return Err(CortexError::MalformedStream("bad header magic"));
        }
        if data[4..8] != [0, 0, 0, 6] {
            return Err(CortexError::MalformedStream("bad header chunk size"));
        }
        // Format 0 with exactly one track
        if data[8..12] != [0, 0, 0, 1] {
            return Err(CortexError::MalformedStream(
                "not a single-track format 0 stream",
            ));
        }
        let division = u16::from_be_bytes([data[12], data[13]]);
        if division == 0 {
            return Err(CortexError::MalformedStream("zero time division"));
        }
        if &data[14..18] != b"MTrk" {
            return Err(CortexError::MalformedStream("bad track magic"));
        }
        let size = u32::from_be_bytes([data[18], data[19], data[20], data[21]]) as usize;
        let track_end = TRACK_DATA_OFFSET
            .checked_add(size)
            .ok_or(CortexError::MalformedStream("oversized track chunk"))?;
        if track_end > data.len() {
            return Err(CortexError::MalformedStream("truncated track chunk"));
        }

        Ok(SmfTrack {
            data,
            track_end,
            division,
        })
    }

    /// The track chunk's event bytes
    pub fn events(&self) -> &[u8] {
        &self.data[TRACK_DATA_OFFSET..self.track_end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(division: u16, track: &[u8]) -> Vec<u8> {
        let mut data = vec![b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1];
        data.extend_from_slice(&division.to_be_bytes());
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(track.len() as u32).to_be_bytes());
        data.extend_from_slice(track);
        data
    }

    #[test]
    fn test_parse_minimal_stream() {
        let track = stream(96, &[0x00, 0xff, 0x2f, 0x00]);
        let parsed = SmfTrack::parse(track).unwrap();
        assert_eq!(parsed.division, 96);
        assert_eq!(parsed.events(), &[0x00, 0xff, 0x2f, 0x00]);
    }

    #[test]
    fn test_reject_bad_magic() {
        let mut data = stream(96, &[]);
        data[0] = b'X';
        assert_eq!(
            SmfTrack::parse(data).unwrap_err(),
            CortexError::MalformedStream("bad header magic")
        );
    }

    #[test]
    fn test_reject_bad_header_size() {
        let mut data = stream(96, &[]);
        data[7] = 7;
        assert_eq!(
            SmfTrack::parse(data).unwrap_err(),
            CortexError::MalformedStream("bad header chunk size")
        );
    }

    #[test]
    fn test_reject_multi_track() {
        let mut data = stream(96, &[]);
        data[11] = 2;
        assert!(SmfTrack::parse(data).is_err());
    }

    #[test]
    fn test_reject_zero_division() {
        let data = stream(0, &[]);
        assert_eq!(
            SmfTrack::parse(data).unwrap_err(),
            CortexError::MalformedStream("zero time division")
        );
    }

    #[test]
    fn test_reject_truncated_track() {
        let mut data = stream(96, &[0x00, 0xff, 0x2f, 0x00]);
        data.truncate(data.len() - 1);
        assert_eq!(
            SmfTrack::parse(data).unwrap_err(),
            CortexError::MalformedStream("truncated track chunk")
        );
    }

    #[test]
    fn test_reject_short_stream() {
        assert_eq!(
            SmfTrack::parse(vec![b'M', b'T', b'h', b'd']).unwrap_err(),
            CortexError::MalformedStream("stream shorter than header")
        );
    }
}
