//! Supervised training loop: AdamW with weight decay, label-smoothed
//! cross-entropy, cosine-annealed learning rate, best model checkpointing.

use std::path::Path;

use burn::{
    config::Config,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{adaptor::OptimizerAdaptor, AdamW, AdamWConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor,
    },
};
use tracing::{debug, info};

use crate::dataset::ImageBatch;
use crate::error::Result as WmobResult;
use crate::model::{WMobNetV2, WMobNetV2Config};
use crate::training::checkpoint::BestCheckpoint;
use crate::training::lr_schedule::CosineAnnealingLr;
use crate::utils::metrics::{EpochStats, RunningMetrics};

/// Hyperparameters for a training run.
#[derive(Config, Debug)]
pub struct TrainerConfig {
    /// Base learning rate for AdamW
    #[config(default = "1e-3")]
    pub learning_rate: f64,

    /// Decoupled weight decay
    #[config(default = "0.01")]
    pub weight_decay: f64,

    /// Label smoothing factor for the cross-entropy loss
    #[config(default = "0.1")]
    pub label_smoothing: f32,

    /// Number of training epochs; also the cosine annealing period
    #[config(default = "50")]
    pub num_epochs: usize,

    /// Directory for the best model weights
    #[config(default = "String::from(\"checkpoints\")")]
    pub checkpoint_dir: String,
}

/// Outcome of a full training run.
#[derive(Debug)]
pub struct FitSummary {
    /// Best validation accuracy reached, as a percentage
    pub best_accuracy: f64,
    /// Per-epoch (train, validation) metrics in order
    pub history: Vec<(EpochStats, EpochStats)>,
}

/// Owns the model, optimizer state, schedule and checkpoint tracker for one
/// training run.
pub struct Trainer<B: AutodiffBackend> {
    model: WMobNetV2<B>,
    optimizer: OptimizerAdaptor<AdamW, WMobNetV2<B>, B>,
    scheduler: CosineAnnealingLr,
    best: BestCheckpoint,
    config: TrainerConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(
        model_config: &WMobNetV2Config,
        config: TrainerConfig,
        device: B::Device,
    ) -> WmobResult<Self> {
        let model = model_config.init(&device);
        let optimizer = AdamWConfig::new()
            .with_weight_decay(config.weight_decay as f32)
            .init();
        let scheduler = CosineAnnealingLr::new(config.learning_rate, config.num_epochs);
        let best = BestCheckpoint::new(Path::new(&config.checkpoint_dir))?;

        Ok(Self {
            model,
            optimizer,
            scheduler,
            best,
            config,
            device,
        })
    }

    fn smoothing(&self) -> Option<f32> {
        (self.config.label_smoothing > 0.0).then_some(self.config.label_smoothing)
    }

    /// One optimization pass over the given batches. Returns mean loss over
    /// the batches seen and accuracy over all samples.
    pub fn train_epoch(&mut self, batches: &[ImageBatch<B>]) -> EpochStats {
        let lr = self.scheduler.current();
        let loss_fn = CrossEntropyLossConfig::new()
            .with_smoothing(self.smoothing())
            .init(&self.device);
        let mut metrics = RunningMetrics::new();

        for (i, batch) in batches.iter().enumerate() {
            let output = self.model.forward(batch.images.clone());
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());
            let loss_value: f64 = loss.clone().into_scalar().elem();

            let correct = count_correct(output, &batch.targets);
            metrics.observe_batch(loss_value, correct, batch.targets.dims()[0]);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optimizer.step(lr, self.model.clone(), grads);

            if (i + 1) % 10 == 0 {
                debug!(
                    "  Batch {:>4}/{}: loss = {:.4}, acc = {:.2}%",
                    i + 1,
                    batches.len(),
                    metrics.mean_loss(),
                    metrics.accuracy_pct()
                );
            }
        }

        metrics.summary()
    }

    /// Evaluation pass without gradient tracking. Dropout is inactive and
    /// batch norm uses running statistics, so repeated calls on the same
    /// batches produce identical metrics.
    pub fn validate(&self, batches: &[ImageBatch<B::InnerBackend>]) -> EpochStats {
        let model = self.model.valid();
        let loss_fn = CrossEntropyLossConfig::new()
            .with_smoothing(self.smoothing())
            .init(&self.device);
        let mut metrics = RunningMetrics::new();

        for batch in batches {
            let output = model.forward(batch.images.clone());
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());
            let loss_value: f64 = loss.into_scalar().elem();

            let correct = count_correct(output, &batch.targets);
            metrics.observe_batch(loss_value, correct, batch.targets.dims()[0]);
        }

        metrics.summary()
    }

    /// Full training run: train, validate, step the schedule and checkpoint
    /// the best model each epoch.
    pub fn fit(
        &mut self,
        train: &[ImageBatch<B>],
        val: &[ImageBatch<B::InnerBackend>],
    ) -> WmobResult<FitSummary> {
        let mut history = Vec::with_capacity(self.config.num_epochs);

        for epoch in 0..self.config.num_epochs {
            info!(
                "Epoch {}/{} (lr = {:.6})",
                epoch + 1,
                self.config.num_epochs,
                self.scheduler.current()
            );

            let train_stats = self.train_epoch(train);
            info!(
                "  Train Loss: {:.4} | Train Acc: {:.2}%",
                train_stats.loss, train_stats.accuracy
            );

            let val_stats = self.validate(val);
            info!(
                "  Val Loss:   {:.4} | Val Acc:   {:.2}%",
                val_stats.loss, val_stats.accuracy
            );

            let valid_model = self.model.valid();
            self.best.update(&valid_model, val_stats.accuracy)?;

            self.scheduler.step();
            history.push((train_stats, val_stats));
        }

        Ok(FitSummary {
            best_accuracy: self.best.best_accuracy(),
            history,
        })
    }

    pub fn model(&self) -> &WMobNetV2<B> {
        &self.model
    }

    pub fn into_model(self) -> WMobNetV2<B> {
        self.model
    }
}

/// Number of argmax predictions matching the targets.
fn count_correct<B: Backend>(output: Tensor<B, 2>, targets: &Tensor<B, 1, Int>) -> usize {
    let predictions = output.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predictions
        .equal(targets.clone())
        .int()
        .sum()
        .into_scalar()
        .elem();
    correct as usize
}
