//! Fixed-rate sample clock thread
//!
//! Renders the shared device into the ring buffer at the configured sample
//! rate, pacing itself against a monotonic deadline the way a hardware PWM
//! timer would pace its interrupt. When the consumer falls behind, the
//! producer yields on buffer backpressure instead of dropping samples.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{RingBuffer, BUFFER_BACKOFF_MICROS};
use crate::cortex::SharedCortex;

/// Samples rendered per loop iteration (~5 ms at the device rate)
const CHUNK_SAMPLES: usize = 256;

/// Background thread driving [`render_next_sample`] at a fixed rate
///
/// [`render_next_sample`]: crate::cortex::SoundCortex::render_next_sample
#[derive(Debug)]
pub struct SampleClock {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SampleClock {
    /// Start rendering `cortex` into `buffer` at `sample_rate` Hz
    pub fn start(
        cortex: SharedCortex,
        buffer: Arc<Mutex<RingBuffer>>,
        sample_rate: u32,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let chunk_period =
                Duration::from_secs(1) * CHUNK_SAMPLES as u32 / sample_rate.max(1);
            let mut chunk = vec![0.0f32; CHUNK_SAMPLES];
            let mut deadline = Instant::now();

            while !stop_flag.load(Ordering::Relaxed) {
                {
                    let mut cortex = cortex.lock();
                    for slot in chunk.iter_mut() {
                        *slot = super::word_to_f32(cortex.render_next_sample());
                    }
                }

                // Hand the chunk over, yielding while the consumer is behind
                let mut offset = 0;
                while offset < chunk.len() && !stop_flag.load(Ordering::Relaxed) {
                    let written = buffer.lock().write(&chunk[offset..]);
                    offset += written;
                    if written == 0 {
                        thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
                    }
                }

                deadline += chunk_period;
                match deadline.checked_duration_since(Instant::now()) {
                    Some(wait) => thread::sleep(wait),
                    // Ran late; re-anchor instead of bursting to catch up
                    None => deadline = Instant::now(),
                }
            }
        });

        SampleClock {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the clock and wait for the render thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SampleClock {
    fn drop(&mut self) {
        self.shutdown();
    }
}
