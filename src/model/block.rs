//! Inverted residual block with a linear bottleneck.
//!
//! Expand (pointwise) -> depthwise spatial filter -> optional attention gate
//! -> project (pointwise, no activation). The shortcut policy is decided once
//! at construction from (stride, in-channels, out-channels).

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d,
    },
    tensor::{backend::Backend, Tensor},
};

use super::se::SqueezeExcite;

/// Initialization for every convolution in the network: Kaiming-normal over
/// the output fan with ReLU gain.
pub(crate) fn conv_initializer() -> Initializer {
    Initializer::KaimingNormal {
        gain: std::f64::consts::SQRT_2,
        fan_out_only: true,
    }
}

/// ReLU clipped at 6.
pub fn relu6<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    x.clamp(0.0, 6.0)
}

/// Bias-free convolution followed by batch normalization. Activation is the
/// caller's responsibility; the final projection of a bottleneck stays linear.
#[derive(Module, Debug)]
pub struct ConvNorm<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvNorm<B> {
    pub fn new(config: Conv2dConfig, out_channels: usize, device: &B::Device) -> Self {
        let conv = config
            .with_bias(false)
            .with_initializer(conv_initializer())
            .init(device);
        let norm = BatchNormConfig::new(out_channels).init(device);

        Self { conv, norm }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(x))
    }
}

/// One inverted residual block: maps (in-channels, spatial) to
/// (out-channels, spatial / stride).
#[derive(Module, Debug)]
pub struct InvertedResidual<B: Backend> {
    expand: Option<ConvNorm<B>>,
    depthwise: ConvNorm<B>,
    se: Option<SqueezeExcite<B>>,
    project: ConvNorm<B>,
    shortcut: Option<ConvNorm<B>>,
    use_res_connect: bool,
}

impl<B: Backend> InvertedResidual<B> {
    /// Builds a block. Panics if `stride` is not 1 or 2.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        expand_ratio: f64,
        use_se: bool,
        se_reduction: usize,
        device: &B::Device,
    ) -> Self {
        assert!(
            stride == 1 || stride == 2,
            "stride must be 1 or 2, got {stride}"
        );

        let hidden = (in_channels as f64 * expand_ratio).round() as usize;

        // Exactly one of the three shortcut kinds applies.
        let use_res_connect = stride == 1 && in_channels == out_channels;
        let needs_projection = stride == 1 && in_channels != out_channels;

        let expand = (expand_ratio != 1.0).then(|| {
            ConvNorm::new(
                Conv2dConfig::new([in_channels, hidden], [1, 1]),
                hidden,
                device,
            )
        });

        let depthwise = ConvNorm::new(
            Conv2dConfig::new([hidden, hidden], [3, 3])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_groups(hidden),
            hidden,
            device,
        );

        let se = use_se.then(|| SqueezeExcite::new(hidden, se_reduction, device));

        let project = ConvNorm::new(
            Conv2dConfig::new([hidden, out_channels], [1, 1]),
            out_channels,
            device,
        );

        let shortcut = needs_projection.then(|| {
            ConvNorm::new(
                Conv2dConfig::new([in_channels, out_channels], [1, 1]),
                out_channels,
                device,
            )
        });

        Self {
            expand,
            depthwise,
            se,
            project,
            shortcut,
            use_res_connect,
        }
    }

    /// Whether the block adds its output to the unmodified input.
    pub fn uses_identity_residual(&self) -> bool {
        self.use_res_connect
    }

    /// Whether the block adds its output to a 1x1-projected input.
    pub fn uses_projected_shortcut(&self) -> bool {
        self.shortcut.is_some()
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut y = x.clone();

        if let Some(expand) = &self.expand {
            y = relu6(expand.forward(y));
        }
        y = relu6(self.depthwise.forward(y));
        if let Some(se) = &self.se {
            y = se.forward(y);
        }
        y = self.project.forward(y);

        if self.use_res_connect {
            x + y
        } else if let Some(shortcut) = &self.shortcut {
            shortcut.forward(x) + y
        } else {
            y
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn block(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
    ) -> InvertedResidual<TestBackend> {
        let device = Default::default();
        InvertedResidual::new(in_channels, out_channels, stride, 4.0, true, 16, &device)
    }

    #[test]
    fn test_identity_residual_selected() {
        let b = block(12, 12, 1);
        assert!(b.uses_identity_residual());
        assert!(!b.uses_projected_shortcut());
    }

    #[test]
    fn test_projected_shortcut_selected() {
        let b = block(12, 18, 1);
        assert!(!b.uses_identity_residual());
        assert!(b.uses_projected_shortcut());
    }

    #[test]
    fn test_no_shortcut_on_stride_two() {
        let b = block(12, 18, 2);
        assert!(!b.uses_identity_residual());
        assert!(!b.uses_projected_shortcut());

        let b = block(12, 12, 2);
        assert!(!b.uses_identity_residual());
        assert!(!b.uses_projected_shortcut());
    }

    #[test]
    #[should_panic(expected = "stride must be 1 or 2")]
    fn test_invalid_stride_panics() {
        let _ = block(12, 12, 3);
    }

    #[test]
    fn test_forward_keeps_spatial_on_stride_one() {
        let device = Default::default();
        let b = block(12, 18, 1);
        let x = Tensor::<TestBackend, 4>::zeros([2, 12, 8, 8], &device);
        let y = b.forward(x);
        assert_eq!(y.dims(), [2, 18, 8, 8]);
    }

    #[test]
    fn test_forward_halves_spatial_on_stride_two() {
        let device = Default::default();
        let b = block(12, 24, 2);
        let x = Tensor::<TestBackend, 4>::zeros([1, 12, 8, 8], &device);
        let y = b.forward(x);
        assert_eq!(y.dims(), [1, 24, 4, 4]);
    }

    #[test]
    fn test_no_expansion_when_ratio_is_one() {
        let device = Default::default();
        let b = InvertedResidual::<TestBackend>::new(8, 8, 1, 1.0, false, 16, &device);
        let x = Tensor::<TestBackend, 4>::zeros([1, 8, 4, 4], &device);
        let y = b.forward(x);
        assert_eq!(y.dims(), [1, 8, 4, 4]);
    }
}
