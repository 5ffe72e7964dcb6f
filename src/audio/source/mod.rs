//! `PcmSource` — the frame-aligned seekable byte stream every stage of the
//! pipeline consumes and produces.
//!
//! # Module layout
//!
//! ```text
//! src/audio/source/
//! ├── mod.rs      ← PcmSource trait + std impls
//! ├── region.rs   ← DataRegion (PCM payload window inside a larger file)
//! └── testing.rs  ← instrumented in-memory source (tests only)
//! ```
//!
//! Format decoders, [`Stereo16`](crate::audio::convert::Stereo16) and
//! [`Resampler`](crate::audio::convert::Resampler) all implement and consume
//! the same trait, so they compose in any order, either statically through
//! generics or dynamically through [`BoxedSource`].

pub mod region;
#[cfg(test)]
pub(crate) mod testing;

pub use region::DataRegion;

use std::{
    fs::File,
    io::{self, Cursor, Read, Seek},
};

/// Common trait implemented by every PCM byte stream.
///
/// `Read` returning `Ok(0)` for a non-empty buffer is end-of-stream.
pub trait PcmSource: Read + Seek + Send {
    /// Releases the underlying resource and cascades to owned upstreams.
    ///
    /// Callers invoke this once per instance; adapters in this crate make a
    /// second call a no-op.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Total length in bytes, if known without reading.
    fn byte_len(&self) -> Option<u64> {
        None
    }
}

/// A type-erased source, as produced by the decoded-stream composition.
pub type BoxedSource = Box<dyn PcmSource>;

impl<S: PcmSource + ?Sized> PcmSource for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn byte_len(&self) -> Option<u64> {
        (**self).byte_len()
    }
}

impl<T: AsRef<[u8]> + Send> PcmSource for Cursor<T> {
    fn byte_len(&self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }
}

/// The descriptor itself is released when the `File` is dropped.
impl PcmSource for File {
    fn byte_len(&self) -> Option<u64> {
        self.metadata().ok().map(|m| m.len())
    }
}

/// Fills `buf` from `source` until it is full or the source reports
/// end-of-stream, retrying interrupted reads. Returns the bytes read.
pub fn read_full<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
