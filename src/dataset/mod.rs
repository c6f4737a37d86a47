//! Data boundary: batching of pre-processed samples and a synthetic
//! generator for smoke runs.

pub mod batcher;
pub mod synthetic;

pub use batcher::{epoch_batches, ClassifierBatcher, ImageBatch, ImageItem};
pub use synthetic::class_pattern_items;
