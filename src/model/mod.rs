//! Network architecture built with Burn.
//!
//! - `se`: squeeze-and-excitation attention gate
//! - `block`: inverted residual block with linear bottleneck
//! - `net`: the `WMobNetV2` assembly with width-multiplier scaling

pub mod block;
pub mod net;
pub mod se;

pub use block::{ConvNorm, InvertedResidual};
pub use net::{scale_channels, WMobNetV2, WMobNetV2Config};
pub use se::SqueezeExcite;
