//! # wmobnet
//!
//! A width-scaled MobileNetV2-style image classifier with
//! squeeze-and-excitation attention, built on the Burn framework.
//!
//! The crate is organised around three layers:
//!
//! - `model`: the network itself — SE attention gate, inverted residual
//!   blocks with a linear bottleneck, and the `WMobNetV2` assembly with its
//!   width-multiplier channel scaling and fixed initialization policy.
//! - `training`: epoch-level train/validate loops, a cosine-annealed learning
//!   rate schedule, and best-checkpoint persistence.
//! - `dataset`: the batch boundary (`ImageItem` / `ImageBatch` / batcher) plus
//!   a deterministic synthetic sample generator for smoke runs and tests.
//!   Real data loading and augmentation live with the caller.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use wmobnet::backend::{default_device, TrainingBackend};
//! use wmobnet::model::WMobNetV2Config;
//! use wmobnet::training::{Trainer, TrainerConfig};
//!
//! let device = default_device();
//! let mut trainer =
//!     Trainer::<TrainingBackend>::new(&WMobNetV2Config::new(), TrainerConfig::new(), device)?;
//! let summary = trainer.fit(&train_batches, &val_batches)?;
//! ```

pub mod backend;
pub mod dataset;
pub mod error;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::{ClassifierBatcher, ImageBatch, ImageItem};
pub use error::{Error, Result};
pub use model::{InvertedResidual, SqueezeExcite, WMobNetV2, WMobNetV2Config};
pub use training::{BestCheckpoint, CosineAnnealingLr, Trainer, TrainerConfig};
pub use utils::metrics::{EpochStats, RunningMetrics};

/// Default number of output classes.
pub const NUM_CLASSES: usize = 4;

/// Default global width multiplier.
pub const WIDTH_MULT: f64 = 0.75;

/// Default input image side length. Any size divisible by 32 works.
pub const IMAGE_SIZE: usize = 224;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
