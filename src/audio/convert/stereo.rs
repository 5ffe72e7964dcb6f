//! `Stereo16` — expands mono and/or unsigned 8-bit PCM into stereo 16-bit
//! little-endian frames.
//!
//! The transform is stateless apart from a scratch buffer: every output byte
//! offset maps to exactly one source byte offset,
//! `output = source × (mono ? 2 : 1) × (8-bit ? 2 : 1)`, which is also how
//! seeks are translated.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::audio::constants::{FRAME_BYTES, U8_TO_I16_BIAS, U8_TO_I16_MUL};
use crate::audio::source::{PcmSource, read_full};
use crate::common::errors::{ConvertError, Result};

/// `byte * 257 - 32768`: maps 0 → -32768, 128 → 128, 255 → 32767.
#[inline]
fn widen_u8(byte: u8) -> i16 {
    (byte as i32 * U8_TO_I16_MUL - U8_TO_I16_BIAS) as i16
}

/// Source layouts that need widening; stereo 16-bit has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    MonoU8,
    MonoI16,
    StereoU8,
}

impl Layout {
    /// `None` for stereo 16-bit input.
    pub fn from_flags(mono: bool, eight_bit: bool) -> Option<Self> {
        match (mono, eight_bit) {
            (true, true) => Some(Self::MonoU8),
            (true, false) => Some(Self::MonoI16),
            (false, true) => Some(Self::StereoU8),
            (false, false) => None,
        }
    }

    /// Output bytes produced per source byte.
    pub fn expansion(self) -> u64 {
        match self {
            Self::MonoU8 => 4,
            Self::MonoI16 | Self::StereoU8 => 2,
        }
    }
}

pub struct Stereo16<S> {
    source: S,
    layout: Layout,
    scratch: Vec<u8>,
    closed: bool,
}

impl<S: PcmSource> Stereo16<S> {
    /// Fails for stereo 16-bit input, which needs no normalization.
    pub fn new(source: S, mono: bool, eight_bit: bool) -> Result<Self> {
        let layout = Layout::from_flags(mono, eight_bit).ok_or(ConvertError::UnsupportedFormat {
            channels: 2,
            bits_per_sample: 16,
        })?;
        debug!("Stereo16: {:?}", layout);
        Ok(Self {
            source,
            layout,
            scratch: Vec::new(),
            closed: false,
        })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Output bytes produced per source byte.
    pub fn expansion(&self) -> u64 {
        self.layout.expansion()
    }

    /// Bytes making up one source frame.
    fn source_frame_bytes(&self) -> usize {
        FRAME_BYTES / self.expansion() as usize
    }

    /// Output length for a source of `source_len` bytes.
    pub fn output_len(&self, source_len: u64) -> u64 {
        source_len * self.expansion()
    }

    fn expand(&self, src: &[u8], out: &mut [u8]) {
        let frames = out.chunks_exact_mut(FRAME_BYTES);
        match self.layout {
            Layout::MonoU8 => {
                for (frame, &byte) in frames.zip(src) {
                    let v = widen_u8(byte);
                    LittleEndian::write_i16(&mut frame[0..2], v);
                    LittleEndian::write_i16(&mut frame[2..4], v);
                }
            }
            Layout::MonoI16 => {
                for (frame, sample) in frames.zip(src.chunks_exact(2)) {
                    frame[0..2].copy_from_slice(sample);
                    frame[2..4].copy_from_slice(sample);
                }
            }
            Layout::StereoU8 => {
                for (frame, pair) in frames.zip(src.chunks_exact(2)) {
                    LittleEndian::write_i16(&mut frame[0..2], widen_u8(pair[0]));
                    LittleEndian::write_i16(&mut frame[2..4], widen_u8(pair[1]));
                }
            }
        }
    }

    /// Reads up to `scratch.len()` source bytes and expands them into `out`.
    fn fill(&mut self, scratch: &mut [u8], out: &mut [u8]) -> io::Result<usize> {
        let factor = self.expansion() as usize;
        let unit = self.source_frame_bytes();

        let mut n = self.source.read(scratch)?;
        // A source frame split across reads is completed; one cut off by
        // end-of-stream is dropped.
        if n % unit != 0 {
            let missing = unit - n % unit;
            n += read_full(&mut self.source, &mut scratch[n..n + missing])?;
            n -= n % unit;
        }
        self.expand(&scratch[..n], &mut out[..n * factor]);
        Ok(n * factor)
    }
}

impl<S: PcmSource> Read for Stereo16<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(ConvertError::Closed.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if buf.len() < FRAME_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer smaller than one stereo frame",
            ));
        }

        let wanted = buf.len() / FRAME_BYTES * FRAME_BYTES / self.expansion() as usize;
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.resize(wanted, 0);
        let result = self.fill(&mut scratch, buf);
        self.scratch = scratch;
        result
    }
}

impl<S: PcmSource> Seek for Stereo16<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if self.closed {
            return Err(ConvertError::Closed.into());
        }
        let factor = self.expansion();
        let upstream = match pos {
            SeekFrom::Start(offset) => SeekFrom::Start(offset / factor),
            SeekFrom::Current(delta) => SeekFrom::Current(delta / factor as i64),
            SeekFrom::End(delta) => SeekFrom::End(delta / factor as i64),
        };
        Ok(self.source.seek(upstream)? * factor)
    }
}

impl<S: PcmSource> PcmSource for Stereo16<S> {
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.scratch = Vec::new();
        self.source.close()
    }

    fn byte_len(&self) -> Option<u64> {
        self.source.byte_len().map(|len| self.output_len(len))
    }
}
