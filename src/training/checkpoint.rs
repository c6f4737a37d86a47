//! Best model persistence.
//!
//! Tracks the best validation accuracy seen so far and writes model weights
//! only on strict improvement, so the file on disk always holds the best
//! epoch rather than the last one.

use std::fs;
use std::path::{Path, PathBuf};

use burn::{
    module::Module,
    record::CompactRecorder,
    tensor::backend::Backend,
};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::WMobNetV2;

/// Best model tracker. Weights land at `<dir>/best_model.mpk`.
#[derive(Debug)]
pub struct BestCheckpoint {
    path: PathBuf,
    best_accuracy: f64,
}

impl BestCheckpoint {
    /// Creates the checkpoint directory if needed. Starts with a best
    /// accuracy of zero, so the first save requires a strictly positive
    /// validation accuracy.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join("best_model"),
            best_accuracy: 0.0,
        })
    }

    /// Records a validation result. Saves the model and returns `true` only
    /// on strict improvement over the best accuracy seen so far.
    pub fn update<B: Backend>(
        &mut self,
        model: &WMobNetV2<B>,
        val_accuracy: f64,
    ) -> Result<bool> {
        if val_accuracy <= self.best_accuracy {
            return Ok(false);
        }

        self.best_accuracy = val_accuracy;
        model
            .clone()
            .save_file(&self.path, &CompactRecorder::new())
            .map_err(|e| Error::Checkpoint(format!("failed to save model weights: {e}")))?;

        info!(
            "Best model saved with validation accuracy: {:.2}%",
            val_accuracy
        );
        Ok(true)
    }

    /// Loads previously saved best weights into a freshly initialized model.
    pub fn load<B: Backend>(
        &self,
        model: WMobNetV2<B>,
        device: &B::Device,
    ) -> Result<WMobNetV2<B>> {
        model
            .load_file(&self.path, &CompactRecorder::new(), device)
            .map_err(|e| Error::Checkpoint(format!("failed to load model weights: {e}")))
    }

    /// Best validation accuracy recorded so far, as a percentage.
    pub fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }

    /// Path of the weights file, without the recorder's extension.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
