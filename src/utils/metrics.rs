//! Running loss and accuracy accumulation over an epoch.

use serde::{Deserialize, Serialize};

/// Final metrics for one pass over a split.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct EpochStats {
    /// Mean loss over the batches actually seen
    pub loss: f64,
    /// Accuracy as a percentage in [0, 100]
    pub accuracy: f64,
}

/// Accumulates per-batch loss and correctness counts.
///
/// The mean loss divides by the number of batches observed, so an epoch cut
/// short still reports a well-defined value.
#[derive(Debug, Default)]
pub struct RunningMetrics {
    total_loss: f64,
    batches: usize,
    correct: usize,
    samples: usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one batch: its loss value, how many predictions matched the
    /// targets, and how many samples it held.
    pub fn observe_batch(&mut self, loss: f64, correct: usize, samples: usize) {
        self.total_loss += loss;
        self.batches += 1;
        self.correct += correct;
        self.samples += samples;
    }

    /// Mean loss over observed batches; 0 when nothing was observed.
    pub fn mean_loss(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.total_loss / self.batches as f64
        }
    }

    /// Accuracy as a percentage; 0 when nothing was observed.
    pub fn accuracy_pct(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            100.0 * self.correct as f64 / self.samples as f64
        }
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn summary(&self) -> EpochStats {
        EpochStats {
            loss: self.mean_loss(),
            accuracy: self.accuracy_pct(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = RunningMetrics::new();
        assert_eq!(m.mean_loss(), 0.0);
        assert_eq!(m.accuracy_pct(), 0.0);
        assert_eq!(m.batches(), 0);
    }

    #[test]
    fn test_mean_loss_divides_by_batches_seen() {
        let mut m = RunningMetrics::new();
        m.observe_batch(2.0, 1, 4);
        m.observe_batch(1.0, 3, 4);
        assert!((m.mean_loss() - 1.5).abs() < 1e-12);
        assert_eq!(m.batches(), 2);
    }

    #[test]
    fn test_accuracy_is_percent_over_samples() {
        let mut m = RunningMetrics::new();
        m.observe_batch(0.5, 3, 4);
        m.observe_batch(0.5, 1, 2);
        // 4 correct out of 6 samples.
        assert!((m.accuracy_pct() - 100.0 * 4.0 / 6.0).abs() < 1e-9);

        let stats = m.summary();
        assert!((stats.loss - 0.5).abs() < 1e-12);
        assert!((stats.accuracy - m.accuracy_pct()).abs() < 1e-12);
    }
}
