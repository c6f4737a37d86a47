//! Training loop, learning rate schedule and best model persistence.

pub mod checkpoint;
pub mod lr_schedule;
pub mod trainer;

pub use checkpoint::BestCheckpoint;
pub use lr_schedule::CosineAnnealingLr;
pub use trainer::{FitSummary, Trainer, TrainerConfig};
