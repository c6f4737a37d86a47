//! Cosine annealing learning rate schedule.

use std::f64::consts::PI;

/// Cosine decay from a base learning rate down to `eta_min` over `t_max`
/// epochs. Step at the end of each epoch; past `t_max` the rate stays at
/// `eta_min`.
#[derive(Debug, Clone)]
pub struct CosineAnnealingLr {
    base_lr: f64,
    eta_min: f64,
    t_max: usize,
    current_epoch: usize,
}

impl CosineAnnealingLr {
    pub fn new(base_lr: f64, t_max: usize) -> Self {
        Self {
            base_lr,
            eta_min: 0.0,
            t_max,
            current_epoch: 0,
        }
    }

    pub fn with_eta_min(mut self, eta_min: f64) -> Self {
        self.eta_min = eta_min;
        self
    }

    /// Learning rate for the current epoch.
    pub fn current(&self) -> f64 {
        if self.t_max == 0 {
            return self.base_lr;
        }
        let progress = (self.current_epoch as f64 / self.t_max as f64).min(1.0);
        self.eta_min + (self.base_lr - self.eta_min) * (1.0 + (progress * PI).cos()) / 2.0
    }

    /// Advance to the next epoch.
    pub fn step(&mut self) {
        self.current_epoch += 1;
    }

    pub fn current_epoch(&self) -> usize {
        self.current_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_base_lr() {
        let scheduler = CosineAnnealingLr::new(0.001, 10);
        assert_eq!(scheduler.current(), 0.001);
    }

    #[test]
    fn test_halfway_is_mean_of_base_and_min() {
        let mut scheduler = CosineAnnealingLr::new(0.001, 10).with_eta_min(0.0001);
        for _ in 0..5 {
            scheduler.step();
        }
        let expected = (0.001 + 0.0001) / 2.0;
        assert!((scheduler.current() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_reaches_eta_min_and_holds() {
        let mut scheduler = CosineAnnealingLr::new(0.001, 10).with_eta_min(0.0001);
        for _ in 0..10 {
            scheduler.step();
        }
        assert!((scheduler.current() - 0.0001).abs() < 1e-12);

        // Past t_max the rate does not go below eta_min.
        scheduler.step();
        assert!((scheduler.current() - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_monotonically_non_increasing() {
        let mut scheduler = CosineAnnealingLr::new(0.01, 20);
        let mut last = scheduler.current();
        for _ in 0..25 {
            scheduler.step();
            let lr = scheduler.current();
            assert!(lr <= last + 1e-15);
            last = lr;
        }
    }

    #[test]
    fn test_zero_t_max_is_constant() {
        let mut scheduler = CosineAnnealingLr::new(0.003, 0);
        scheduler.step();
        assert_eq!(scheduler.current(), 0.003);
    }
}
