//! `Resampler` — seekable stereo 16-bit stream at the target rate.
//!
//! Output frames are computed on demand from the fractional source position
//! of the read cursor, so any frame-aligned offset can be read at any time
//! and always yields the same bytes.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::audio::constants::{FRAME_BYTES, FRAME_BYTES_U64, INT16_SCALE};
use crate::audio::source::PcmSource;
use crate::common::errors::{ConvertError, Result};

use super::cache::BlockLoader;
use super::sinc::{RateRatio, interpolate};

#[inline]
fn quantize(v: f64) -> i16 {
    (v * INT16_SCALE) as i16
}

pub struct Resampler<S> {
    loader: BlockLoader<S>,
    ratio: RateRatio,
    len: u64,
    pos: u64,
    closed: bool,
}

impl<S: PcmSource> Resampler<S> {
    /// `source` must deliver stereo 16-bit LE frames; `source_len` is its
    /// size in bytes.
    pub fn new(source: S, source_len: u64, from: u32, to: u32) -> Result<Self> {
        if from == 0 || to == 0 {
            return Err(ConvertError::InvalidSampleRate { from, to });
        }
        let ratio = RateRatio { from, to };
        let loader = BlockLoader::new(source, source_len);
        let len = ratio.output_frames(loader.frames()) * FRAME_BYTES_U64;

        debug!(
            "Resampler: {} Hz -> {} Hz, {} source frames -> {} bytes",
            from,
            to,
            loader.frames(),
            len
        );

        Ok(Self {
            loader,
            ratio,
            len,
            pos: 0,
            closed: false,
        })
    }

    /// Output length in bytes; always a whole number of frames.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Decoded blocks currently held in memory.
    pub fn resident_blocks(&self) -> usize {
        self.loader.resident_blocks()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ConvertError::Closed);
        }
        Ok(())
    }

    fn read_frames(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() || self.pos == self.len {
            return Ok(0);
        }
        if buf.len() < FRAME_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer smaller than one stereo frame",
            )
            .into());
        }

        let remaining = self.len - self.pos;
        let n = (buf.len() / FRAME_BYTES * FRAME_BYTES)
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));

        let first = self.pos / FRAME_BYTES_U64;
        for (i, frame) in buf[..n].chunks_exact_mut(FRAME_BYTES).enumerate() {
            let (l, r) = interpolate(&mut self.loader, self.ratio, first + i as u64)?;
            LittleEndian::write_i16(&mut frame[0..2], quantize(l));
            LittleEndian::write_i16(&mut frame[2..4], quantize(r));
        }

        self.pos += n as u64;
        Ok(n)
    }

    fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        let target: i128 = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.pos as i128 + delta as i128,
            SeekFrom::End(delta) => self.len as i128 + delta as i128,
        };
        if target % FRAME_BYTES as i128 != 0 {
            return Err(ConvertError::UnalignedOffset(
                target.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            ));
        }

        self.pos = target.clamp(0, self.len as i128) as u64;
        debug!("Resampler: seek → {}", self.pos);
        Ok(self.pos)
    }
}

impl<S: PcmSource> Read for Resampler<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_frames(buf)?)
    }
}

impl<S: PcmSource> Seek for Resampler<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

impl<S: PcmSource> PcmSource for Resampler<S> {
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.loader.clear();
        debug!("Resampler: closed");
        self.loader.source_mut().close()
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.len)
    }
}
