//! Command line entry point.
//!
//! The `train` subcommand runs a supervised smoke training on synthetic
//! separable data, exercising the full model/optimizer/checkpoint path
//! without external datasets.

use anyhow::{ensure, Result};
use burn::module::Module;
use burn::tensor::backend::Backend;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use wmobnet::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use wmobnet::dataset::{class_pattern_items, epoch_batches, ClassifierBatcher};
use wmobnet::model::WMobNetV2Config;
use wmobnet::training::{Trainer, TrainerConfig};
use wmobnet::utils::logging::init_logging;

/// Width-scaled MobileNetV2 image classifier with squeeze-and-excitation.
#[derive(Parser, Debug)]
#[command(name = "wmobnet")]
#[command(version = wmobnet::VERSION)]
#[command(about = "Width-scaled MobileNetV2 classifier built with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train on synthetic data as an end-to-end smoke run
    Train {
        /// Number of output classes
        #[arg(long, default_value = "4")]
        num_classes: usize,

        /// Global channel width multiplier
        #[arg(long, default_value = "0.75")]
        width_mult: f64,

        /// Number of training epochs
        #[arg(short, long, default_value = "50")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "16")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Input image side length (must be divisible by 32)
        #[arg(long, default_value = "64")]
        image_size: usize,

        /// Synthetic training samples per class
        #[arg(long, default_value = "32")]
        samples_per_class: usize,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory for model checkpoints
        #[arg(short, long, default_value = "checkpoints")]
        output_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Train {
            num_classes,
            width_mult,
            epochs,
            batch_size,
            learning_rate,
            image_size,
            samples_per_class,
            seed,
            output_dir,
        } => train(
            num_classes,
            width_mult,
            epochs,
            batch_size,
            learning_rate,
            image_size,
            samples_per_class,
            seed,
            output_dir,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn train(
    num_classes: usize,
    width_mult: f64,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    image_size: usize,
    samples_per_class: usize,
    seed: u64,
    output_dir: String,
) -> Result<()> {
    ensure!(
        image_size % 32 == 0,
        "image size must be divisible by 32, got {image_size}"
    );
    ensure!(num_classes >= 2, "need at least 2 classes");

    println!("{}", "=== WMobNetV2 training ===".green().bold());
    info!("Backend: {}", backend_name());

    TrainingBackend::seed(seed);
    let device = default_device();

    let model_config = WMobNetV2Config::new()
        .with_num_classes(num_classes)
        .with_width_mult(width_mult);
    let trainer_config = TrainerConfig::new()
        .with_learning_rate(learning_rate)
        .with_num_epochs(epochs)
        .with_checkpoint_dir(output_dir);

    let mut trainer =
        Trainer::<TrainingBackend>::new(&model_config, trainer_config, device.clone())?;
    info!(
        "Model: {} classes, width multiplier {}, {} parameters",
        num_classes,
        width_mult,
        trainer.model().num_params()
    );

    // Synthetic splits with disjoint seeds; validation is a quarter of the
    // training size.
    let train_items = class_pattern_items(num_classes, samples_per_class, image_size, 0.25, seed);
    let val_items = class_pattern_items(
        num_classes,
        (samples_per_class / 4).max(1),
        image_size,
        0.25,
        seed.wrapping_add(1),
    );
    info!(
        "Data: {} training samples, {} validation samples",
        train_items.len(),
        val_items.len()
    );

    let batcher = ClassifierBatcher::new(image_size);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let train_batches = epoch_batches::<TrainingBackend>(
        &train_items,
        batch_size,
        &batcher,
        &device,
        Some(&mut rng),
    );
    let val_batches =
        epoch_batches::<DefaultBackend>(&val_items, batch_size, &batcher, &device, None);

    let summary = trainer.fit(&train_batches, &val_batches)?;

    println!(
        "{} best validation accuracy: {}",
        "Training complete;".green(),
        format!("{:.2}%", summary.best_accuracy).bold()
    );
    Ok(())
}
