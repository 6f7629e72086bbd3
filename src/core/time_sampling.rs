//! Time sampling types.
//!
//! Archive properties are sampled over time. The TimeSampling struct maps a
//! real time to a discrete sample index plus an interpolation weight.

use crate::util::Chrono;

/// Type of time sampling.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeSamplingType {
    /// Uniform sampling: samples at regular intervals.
    /// start_time + index * interval
    Uniform { start_time: Chrono, interval: Chrono },

    /// Cyclic sampling: repeating pattern of sample times, advancing by
    /// `interval` per cycle.
    Cyclic {
        interval: Chrono,
        times: Vec<Chrono>,
    },

    /// Acyclic sampling: explicit sorted time for each sample.
    Acyclic { times: Vec<Chrono> },
}

/// Time sampling information for a schema or property.
#[derive(Clone, Debug)]
pub struct TimeSampling {
    pub sampling_type: TimeSamplingType,
}

impl TimeSampling {
    /// Create uniform time sampling.
    pub fn uniform(interval: Chrono, start_time: Chrono) -> Self {
        Self {
            sampling_type: TimeSamplingType::Uniform {
                start_time,
                interval,
            },
        }
    }

    /// Create cyclic time sampling.
    pub fn cyclic(interval: Chrono, times: Vec<Chrono>) -> Self {
        Self {
            sampling_type: TimeSamplingType::Cyclic { interval, times },
        }
    }

    /// Create acyclic time sampling from explicit sorted times.
    pub fn acyclic(times: Vec<Chrono>) -> Self {
        Self {
            sampling_type: TimeSamplingType::Acyclic { times },
        }
    }

    /// Get the time for a specific sample index.
    pub fn sample_time(&self, index: usize) -> Chrono {
        match &self.sampling_type {
            TimeSamplingType::Uniform {
                start_time,
                interval,
            } => *start_time + (index as Chrono) * *interval,
            TimeSamplingType::Cyclic { interval, times } => {
                if times.is_empty() {
                    return 0.0;
                }
                let cycle = index / times.len();
                let local = index % times.len();
                times[local] + (cycle as Chrono) * *interval
            }
            TimeSamplingType::Acyclic { times } => times.get(index).copied().unwrap_or(0.0),
        }
    }

    /// Resolve a time to a floor sample index plus interpolation weight.
    ///
    /// The weight is in [0, 1): 0 exactly at (or before) a sample time, and
    /// the fraction of the way to the next sample otherwise. At or past the
    /// last sample the weight is 0.
    pub fn time_to_index(&self, time: Chrono, num_samples: usize) -> (usize, f32) {
        if num_samples == 0 {
            return (0, 0.0);
        }

        let index = match &self.sampling_type {
            TimeSamplingType::Uniform {
                start_time,
                interval,
            } => {
                if time <= *start_time || *interval <= 0.0 {
                    0
                } else {
                    (((time - start_time) / interval).floor() as usize).min(num_samples - 1)
                }
            }
            TimeSamplingType::Cyclic { .. } | TimeSamplingType::Acyclic { .. } => {
                // Binary search for the largest index with sample_time <= time.
                let mut lo = 0;
                let mut hi = num_samples;
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    if self.sample_time(mid) <= time {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                if lo > 0 {
                    lo - 1
                } else {
                    0
                }
            }
        };

        if index + 1 >= num_samples {
            return (index, 0.0);
        }

        let t0 = self.sample_time(index);
        let t1 = self.sample_time(index + 1);
        let dt = t1 - t0;
        if dt <= 0.0 || time <= t0 {
            return (index, 0.0);
        }
        let w = (((time - t0) / dt) as f32).clamp(0.0, 1.0);
        // A weight of exactly 1 belongs to the next index.
        if w >= 1.0 {
            (index + 1, 0.0)
        } else {
            (index, w)
        }
    }
}

impl Default for TimeSampling {
    fn default() -> Self {
        Self::uniform(1.0 / 30.0, 0.0)
    }
}
