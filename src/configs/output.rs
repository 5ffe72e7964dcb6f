use serde::{Deserialize, Serialize};

use crate::audio::constants::DEFAULT_TARGET_RATE;

/// Format of the stream handed to the playback side.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Target sample rate in Hz. Output is always stereo 16-bit LE.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_TARGET_RATE
}
