//! Squeeze-and-excitation attention gate.
//!
//! Rescales each channel of a feature map by a learned gate in [0, 1]:
//! global-average squeeze, two bias-free linear projections with a
//! bottleneck, and a hard-sigmoid gate broadcast back over the spatial
//! dimensions.

use burn::{
    module::Module,
    nn::{Initializer, Linear, LinearConfig},
    tensor::{activation::relu, backend::Backend, Tensor},
};

/// Floor on the bottleneck width. Keeps the excitation path usable when the
/// whole network is width-scaled below 1.0 and channel counts get small.
const MIN_REDUCED_CHANNELS: usize = 8;

/// Bottleneck width for a gate over `channels` channels.
pub fn reduced_channels(channels: usize, reduction: usize) -> usize {
    (channels / reduction).max(MIN_REDUCED_CHANNELS)
}

/// Piecewise-linear sigmoid approximation, clipped to [0, 1]. Cheaper than a
/// true sigmoid for the gate and bounded by construction.
pub fn hard_sigmoid<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.div_scalar(6.0).add_scalar(0.5).clamp(0.0, 1.0)
}

/// Per-channel attention gate.
///
/// Both projections are bias-free. Weights follow the network-wide linear
/// initialization policy (normal with small variance).
#[derive(Module, Debug)]
pub struct SqueezeExcite<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
}

impl<B: Backend> SqueezeExcite<B> {
    pub fn new(channels: usize, reduction: usize, device: &B::Device) -> Self {
        let hidden = reduced_channels(channels, reduction);
        let initializer = Initializer::Normal {
            mean: 0.0,
            std: 0.01,
        };

        let fc1 = LinearConfig::new(channels, hidden)
            .with_bias(false)
            .with_initializer(initializer.clone())
            .init(device);
        let fc2 = LinearConfig::new(hidden, channels)
            .with_bias(false)
            .with_initializer(initializer)
            .init(device);

        Self { fc1, fc2 }
    }

    /// Returns the input multiplied by a per-channel scale in [0, 1]. Output
    /// shape equals input shape.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, _, _] = x.dims();

        // Squeeze: global average over the spatial dimensions.
        let y = x.clone().mean_dim(3).mean_dim(2).reshape([batch, channels]);

        let y = relu(self.fc1.forward(y));
        let y = self.fc2.forward(y);
        let scale = hard_sigmoid(y).reshape([batch, channels, 1, 1]);

        x * scale
    }
}
