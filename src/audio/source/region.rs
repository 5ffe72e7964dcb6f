//! `DataRegion` — exposes the PCM payload of a larger byte source.
//!
//! Container files carry their samples after a header and are sometimes
//! followed by trailing metadata chunks. The region starts at `header_len`
//! and spans `data_len` bytes; reads stop at the end of the payload and seeks
//! are expressed relative to the payload start.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::common::errors::ConvertError;

use super::PcmSource;

pub struct DataRegion<S> {
    source: S,
    header_len: u64,
    data_len: u64,
    remaining: u64,
}

impl<S: PcmSource> DataRegion<S> {
    /// Wraps `source`, which must currently be positioned at the first
    /// payload byte (i.e. right after the header has been consumed).
    pub fn new(source: S, header_len: u64, data_len: u64) -> Self {
        Self {
            source,
            header_len,
            data_len,
            remaining: data_len,
        }
    }

    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: PcmSource> Read for DataRegion<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let limit = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.source.read(&mut buf[..limit])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<S: PcmSource> Seek for DataRegion<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let upstream = match pos {
            SeekFrom::Start(offset) => SeekFrom::Start(self.header_len.saturating_add(offset)),
            SeekFrom::Current(delta) => SeekFrom::Current(delta),
            SeekFrom::End(delta) => {
                let end = self.header_len.saturating_add(self.data_len);
                SeekFrom::Start(end.checked_add_signed(delta).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek before start of source")
                })?)
            }
        };

        let position = self.source.seek(upstream)?;
        if position < self.header_len {
            return Err(ConvertError::InvalidOffset {
                position,
                start: self.header_len,
            }
            .into());
        }

        let offset = position - self.header_len;
        if offset > self.data_len {
            warn!(
                "DataRegion: seek landed {} bytes past the payload end",
                offset - self.data_len
            );
            self.remaining = 0;
            return Ok(self.data_len);
        }

        self.remaining = self.data_len - offset;
        debug!("DataRegion: seek → {} ({} remaining)", offset, self.remaining);
        Ok(offset)
    }
}

impl<S: PcmSource> PcmSource for DataRegion<S> {
    fn close(&mut self) -> io::Result<()> {
        self.source.close()
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.data_len)
    }
}
