use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_MAX_SAMPLES: usize = 100;

/// Sliding-window transfer rate for a single stream.
pub struct SpeedCalculator {
    samples: VecDeque<(Instant, u64)>,
    window: Duration,
    max_samples: usize,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_SAMPLES)
    }
}

impl SpeedCalculator {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            window,
            max_samples: max_samples.max(2),
        }
    }

    /// Records `bytes` received now.
    pub fn add_sample(&mut self, bytes: u64) {
        self.add_sample_at(Instant::now(), bytes);
    }

    fn add_sample_at(&mut self, at: Instant, bytes: u64) {
        self.samples.push_back((at, bytes));

        while let Some(&(oldest, _)) = self.samples.front() {
            let expired = at.saturating_duration_since(oldest) > self.window;
            if expired || self.samples.len() > self.max_samples {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average rate over the window; 0 until two samples span some time.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(&(first, _)), Some(&(last, _))) = (self.samples.front(), self.samples.back())
        else {
            return 0.0;
        };
        let elapsed = last.saturating_duration_since(first);
        if elapsed.is_zero() {
            return 0.0;
        }
        let bytes: u64 = self.samples.iter().map(|(_, b)| b).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }
}
