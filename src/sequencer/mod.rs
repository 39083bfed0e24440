//! SMF Event Sequencer
//!
//! Replays a single-track, format-0 Standard MIDI File as a timed series of
//! square/noise engine register writes: the same protocol surface a bus
//! slave targets, driven by elapsed wall-clock microseconds instead of bus
//! traffic.
//!
//! Supported events are note-on/note-off on channels 0-2, the tempo
//! meta-event and the end-of-track meta-event (optionally looping with a
//! configurable tail gap). Other meta-events are skipped by their declared
//! size; any other status byte halts playback with
//! [`crate::CortexError::UnsupportedEvent`].

pub mod notes;
mod player;
mod smf;

pub use player::Sequencer;
pub use smf::SmfTrack;
