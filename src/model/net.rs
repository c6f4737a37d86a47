//! Network assembly: stem, staged inverted residual blocks, head, classifier.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::Conv2dConfig,
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Initializer, Linear, LinearConfig, PaddingConfig2d,
    },
    tensor::{backend::Backend, Tensor},
};

use super::block::{relu6, ConvNorm, InvertedResidual};

/// Stage table: (expansion ratio, base output channels, repeats, first stride).
/// Output channels are scaled by the width multiplier at construction.
const STAGES: [(f64, usize, usize, usize); 7] = [
    (1.0, 16, 1, 1),
    (4.0, 24, 2, 2),
    (4.0, 32, 3, 2),
    (4.0, 64, 3, 2),
    (4.0, 96, 2, 1),
    (6.0, 160, 2, 2),
    (6.0, 320, 1, 1),
];

const STEM_CHANNELS: usize = 32;
const HEAD_CHANNELS: usize = 1280;

/// Channel count after applying the global width multiplier.
pub fn scale_channels(base: usize, width_mult: f64) -> usize {
    (base as f64 * width_mult).round() as usize
}

/// Configuration for the width-scaled MobileNetV2 classifier.
#[derive(Config, Debug)]
pub struct WMobNetV2Config {
    /// Number of output classes
    #[config(default = "4")]
    pub num_classes: usize,

    /// Global channel width multiplier
    #[config(default = "0.75")]
    pub width_mult: f64,

    /// Dropout rate before the classifier head
    #[config(default = "0.1")]
    pub dropout: f64,

    /// Whether inverted residual blocks carry a squeeze-excite gate
    #[config(default = "true")]
    pub use_se: bool,

    /// Squeeze-excite channel reduction factor
    #[config(default = "16")]
    pub se_reduction: usize,
}

impl WMobNetV2Config {
    /// Initialize the model on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> WMobNetV2<B> {
        WMobNetV2::new(self, device)
    }
}

/// Width-scaled MobileNetV2 with squeeze-and-excitation blocks.
///
/// Input: a batch of 3-channel images with height and width divisible by 32.
/// Output: raw per-class logits of shape [batch, num_classes]; the loss
/// function is expected to apply log-softmax itself.
#[derive(Module, Debug)]
pub struct WMobNetV2<B: Backend> {
    stem: ConvNorm<B>,
    blocks: Vec<InvertedResidual<B>>,
    head: ConvNorm<B>,
    pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    classifier: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> WMobNetV2<B> {
    pub fn new(config: &WMobNetV2Config, device: &B::Device) -> Self {
        let mut input_channel = scale_channels(STEM_CHANNELS, config.width_mult);
        let last_channel = scale_channels(HEAD_CHANNELS, config.width_mult);

        // Stem: 3x3 stride-2 convolution into the scaled initial width.
        let stem = ConvNorm::new(
            Conv2dConfig::new([3, input_channel], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1)),
            input_channel,
            device,
        );

        // Inverted residual stages. The first block of each stage applies the
        // declared stride, the rest run at stride 1.
        let mut blocks = Vec::new();
        for (ratio, base_out, repeats, first_stride) in STAGES {
            let output_channel = scale_channels(base_out, config.width_mult);
            for i in 0..repeats {
                let stride = if i == 0 { first_stride } else { 1 };
                blocks.push(InvertedResidual::new(
                    input_channel,
                    output_channel,
                    stride,
                    ratio,
                    config.use_se,
                    config.se_reduction,
                    device,
                ));
                input_channel = output_channel;
            }
        }

        // Final 1x1 channel expansion before pooling.
        let head = ConvNorm::new(
            Conv2dConfig::new([input_channel, last_channel], [1, 1]),
            last_channel,
            device,
        );

        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let dropout = DropoutConfig::new(config.dropout).init();
        let classifier = LinearConfig::new(last_channel, config.num_classes)
            .with_initializer(Initializer::Normal {
                mean: 0.0,
                std: 0.01,
            })
            .init(device);

        Self {
            stem,
            blocks,
            head,
            pool,
            dropout,
            classifier,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass producing raw logits of shape [batch, num_classes].
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = relu6(self.stem.forward(x));
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = relu6(self.head.forward(x));

        // Global average pooling: [B, C, H, W] -> [B, C].
        let x = self.pool.forward(x);
        let [batch, channels, _, _] = x.dims();
        let x = x.reshape([batch, channels]);

        let x = self.dropout.forward(x);
        self.classifier.forward(x)
    }

    /// Forward pass with softmax for inference.
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_scale_channels() {
        assert_eq!(scale_channels(32, 0.75), 24);
        assert_eq!(scale_channels(1280, 0.75), 960);
        assert_eq!(scale_channels(16, 0.75), 12);
        assert_eq!(scale_channels(32, 1.0), 32);
    }

    #[test]
    fn test_config_defaults() {
        let config = WMobNetV2Config::new();
        assert_eq!(config.num_classes, 4);
        assert_eq!(config.width_mult, 0.75);
        assert_eq!(config.dropout, 0.1);
        assert!(config.use_se);
        assert_eq!(config.se_reduction, 16);
    }

    #[test]
    fn test_forward_output_shape_and_finite() {
        let device = Default::default();
        let config = WMobNetV2Config::new().with_width_mult(0.5);
        let model = WMobNetV2::<TestBackend>::new(&config, &device);

        // Height and width divisible by 32.
        let input = Tensor::<TestBackend, 4>::ones([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 4]);
        for v in output.into_data().iter::<f32>() {
            assert!(v.is_finite(), "logit {v} is not finite");
        }
    }

    #[test]
    fn test_width_mult_scales_parameter_count() {
        let device = Default::default();

        let half = WMobNetV2Config::new()
            .with_width_mult(0.5)
            .init::<TestBackend>(&device);
        let full = WMobNetV2Config::new()
            .with_width_mult(1.0)
            .init::<TestBackend>(&device);

        assert!(half.num_params() < full.num_params());
    }

    #[test]
    fn test_block_count_matches_stage_table() {
        let device = Default::default();
        let model = WMobNetV2Config::new().init::<TestBackend>(&device);

        let expected: usize = STAGES.iter().map(|(_, _, n, _)| n).sum();
        assert_eq!(model.blocks.len(), expected);
        assert_eq!(model.num_classes(), 4);
    }
}
