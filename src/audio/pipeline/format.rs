use crate::audio::constants::OUTPUT_CHANNELS;
use crate::common::errors::{ConvertError, Result};

/// Layout of an interleaved little-endian PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

impl PcmFormat {
    pub const fn new(channels: u16, bits_per_sample: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            bits_per_sample,
            sample_rate,
        }
    }

    /// The layout every pipeline stage ultimately produces.
    pub const fn stereo16(sample_rate: u32) -> Self {
        Self::new(OUTPUT_CHANNELS as u16, 16, sample_rate)
    }

    /// Only mono/stereo, unsigned 8-bit or signed 16-bit, non-zero rate.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.channels, 1 | 2) || !matches!(self.bits_per_sample, 8 | 16) {
            return Err(ConvertError::UnsupportedFormat {
                channels: self.channels,
                bits_per_sample: self.bits_per_sample,
            });
        }
        if self.sample_rate == 0 {
            return Err(ConvertError::InvalidSampleRate {
                from: self.sample_rate,
                to: self.sample_rate,
            });
        }
        Ok(())
    }

    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    pub fn is_eight_bit(&self) -> bool {
        self.bits_per_sample == 8
    }

    /// Whether the stream needs widening to stereo 16-bit.
    pub fn needs_normalization(&self) -> bool {
        self.is_mono() || self.is_eight_bit()
    }

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.bits_per_sample as usize / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_sizes() {
        assert_eq!(PcmFormat::new(1, 8, 8000).frame_bytes(), 1);
        assert_eq!(PcmFormat::new(2, 8, 8000).frame_bytes(), 2);
        assert_eq!(PcmFormat::new(1, 16, 8000).frame_bytes(), 2);
        assert_eq!(PcmFormat::stereo16(8000).frame_bytes(), 4);
    }

    #[test]
    fn rejects_unsupported_layouts() {
        assert!(PcmFormat::new(6, 16, 48_000).validate().is_err());
        assert!(PcmFormat::new(2, 24, 48_000).validate().is_err());
        assert!(PcmFormat::new(0, 16, 48_000).validate().is_err());
        assert!(matches!(
            PcmFormat::new(2, 16, 0).validate(),
            Err(ConvertError::InvalidSampleRate { .. })
        ));
        assert!(PcmFormat::new(1, 8, 8000).validate().is_ok());
    }
}
