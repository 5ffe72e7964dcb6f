//! Decoded-stream composition.
//!
//! Given a raw PCM payload and its layout, builds the shortest chain of
//! adapters that yields stereo 16-bit frames at the target rate:
//!
//! | Input                        | Chain                          |
//! |------------------------------|--------------------------------|
//! | stereo 16-bit, target rate   | source                         |
//! | mono and/or 8-bit            | `Stereo16` → source            |
//! | any other rate               | `Resampler` → (…) → source     |

pub mod format;

pub use format::PcmFormat;

use std::io::{self, Read, Seek, SeekFrom};

use tracing::debug;

use crate::audio::convert::{Resampler, Stereo16};
use crate::audio::source::{BoxedSource, PcmSource};
use crate::common::errors::{ConvertError, Result};

/// A playable stream: stereo 16-bit LE at `target_rate`, with known length.
pub struct DecodedStream {
    inner: BoxedSource,
    len: u64,
    source_format: PcmFormat,
    target_rate: u32,
}

impl DecodedStream {
    /// `source` must be positioned at the start of a `data_len`-byte payload
    /// laid out as `format`.
    pub fn open<S>(source: S, data_len: u64, format: PcmFormat, target_rate: u32) -> Result<Self>
    where
        S: PcmSource + 'static,
    {
        format.validate()?;
        if target_rate == 0 {
            return Err(ConvertError::InvalidSampleRate {
                from: format.sample_rate,
                to: target_rate,
            });
        }

        let frame_bytes = format.frame_bytes() as u64;
        let mut len = data_len / frame_bytes * frame_bytes;
        let mut inner: BoxedSource = Box::new(source);

        if format.needs_normalization() {
            let stereo = Stereo16::new(inner, format.is_mono(), format.is_eight_bit())?;
            len = stereo.output_len(len);
            inner = Box::new(stereo);
        }

        if format.sample_rate != target_rate {
            let resampler = Resampler::new(inner, len, format.sample_rate, target_rate)?;
            len = resampler.len();
            inner = Box::new(resampler);
        }

        debug!(
            "DecodedStream: {:?} -> {} Hz stereo16, {} bytes",
            format, target_rate, len
        );

        Ok(Self {
            inner,
            len,
            source_format: format,
            target_rate,
        })
    }

    /// Output length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn source_format(&self) -> PcmFormat {
        self.source_format
    }

    pub fn output_format(&self) -> PcmFormat {
        PcmFormat::stereo16(self.target_rate)
    }

    pub fn is_resampled(&self) -> bool {
        self.source_format.sample_rate != self.target_rate
    }
}

impl Read for DecodedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Seeking may be slow: it can force the upstream decoder to re-decode.
impl Seek for DecodedStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl PcmSource for DecodedStream {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.len)
    }
}
