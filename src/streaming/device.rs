//! Audio device integration using rodio
//!
//! Drains the sample ring buffer to the system output device. Underruns
//! play silence so the stream stays alive while the sample clock catches
//! up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{OutputStream, Sink, Source};

use super::RingBuffer;
use crate::{CortexError, Result};

/// Samples fetched from the ring buffer per lock acquisition
const BATCH_SAMPLES: usize = 1024;

/// Mono audio source that reads from the ring buffer
struct RingSource {
    buffer: Arc<Mutex<RingBuffer>>,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    batch: Vec<f32>,
    batch_pos: usize,
}

impl RingSource {
    fn new(buffer: Arc<Mutex<RingBuffer>>, sample_rate: u32, finished: Arc<AtomicBool>) -> Self {
        RingSource {
            buffer,
            sample_rate,
            finished,
            batch: vec![0.0; BATCH_SAMPLES],
            batch_pos: BATCH_SAMPLES,
        }
    }
}

impl Iterator for RingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.batch_pos >= self.batch.len() {
            let read = self.buffer.lock().read(&mut self.batch);
            if read < self.batch.len() {
                // Underrun: pad the batch with silence to keep the stream
                // alive
                self.batch[read..].fill(0.0);
            }
            self.batch_pos = 0;
        }

        let sample = self.batch[self.batch_pos];
        self.batch_pos += 1;
        Some(sample)
    }
}

impl Source for RingSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(BATCH_SAMPLES)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Audio playback device draining the ring buffer through rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start draining `buffer` at
    /// `sample_rate` Hz
    pub fn new(sample_rate: u32, buffer: Arc<Mutex<RingBuffer>>) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| CortexError::AudioDevice(format!("failed to open stream: {}", e)))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| CortexError::AudioDevice(format!("failed to create sink: {}", e)))?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = RingSource::new(buffer, sample_rate, Arc::clone(&finished));
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Pause playback
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback
    pub fn play(&self) {
        self.sink.play();
    }

    /// Signal that no more samples will be produced and let the stream end
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.finish();
        self.sink.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_source_reports_mono_stream() {
        let buffer = Arc::new(Mutex::new(RingBuffer::new(256)));
        let source = RingSource::new(buffer, 46_875, Arc::new(AtomicBool::new(false)));
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 46_875);
        assert_eq!(source.total_duration(), None);
    }

    #[test]
    fn test_ring_source_silence_on_underrun() {
        let buffer = Arc::new(Mutex::new(RingBuffer::new(256)));
        let mut source = RingSource::new(buffer, 46_875, Arc::new(AtomicBool::new(false)));
        assert_eq!(source.next(), Some(0.0));
    }

    #[test]
    fn test_ring_source_ends_on_finish() {
        let buffer = Arc::new(Mutex::new(RingBuffer::new(256)));
        let finished = Arc::new(AtomicBool::new(false));
        let mut source = RingSource::new(buffer, 46_875, Arc::clone(&finished));
        assert!(source.next().is_some());
        finished.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None);
    }
}
