//! Sample-rate conversion and channel/bit-depth normalization.
//!
//! ```text
//! source ─▶ Stereo16 (mono / 8-bit only) ─▶ BlockLoader ─▶ interpolate ─▶ Resampler
//! ```

pub mod cache;
pub mod resampler;
pub mod sinc;
pub mod stereo;
pub mod trig;

pub use cache::{BlockCache, BlockLoader};
pub use resampler::Resampler;
pub use sinc::{RateRatio, interpolate};
pub use stereo::Stereo16;
