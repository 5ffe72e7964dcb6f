use std::io;

use thiserror::Error;

/// Errors raised by the conversion pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Upstream read/seek failure, passed through untouched.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The upstream stream reported a position before its own logical start.
    #[error("invalid offset: upstream position {position} precedes data start {start}")]
    InvalidOffset { position: u64, start: u64 },

    #[error("offset {0} is not aligned to a 4-byte stereo frame")]
    UnalignedOffset(i64),

    #[error("unsupported PCM format: {channels} channel(s), {bits_per_sample} bits per sample")]
    UnsupportedFormat { channels: u16, bits_per_sample: u16 },

    #[error("invalid sample rate conversion {from} Hz -> {to} Hz")]
    InvalidSampleRate { from: u32, to: u32 },

    #[error("source does not report its length")]
    UnknownLength,

    #[error("decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("stream is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(e) => e.kind(),
            Self::InvalidOffset { .. } => io::ErrorKind::InvalidData,
            Self::UnalignedOffset(_) => io::ErrorKind::InvalidInput,
            Self::UnsupportedFormat { .. } => io::ErrorKind::Unsupported,
            Self::InvalidSampleRate { .. } => io::ErrorKind::InvalidInput,
            Self::UnknownLength => io::ErrorKind::Unsupported,
            Self::Decode(_) => io::ErrorKind::InvalidData,
            Self::Closed => io::ErrorKind::NotConnected,
        }
    }
}

/// `Read`/`Seek` impls surface pipeline errors as `io::Error`; upstream I/O
/// errors come back out exactly as they went in.
impl From<ConvertError> for io::Error {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Io(e) => e,
            ConvertError::Decode(symphonia::core::errors::Error::IoError(e)) => e,
            other => io::Error::new(other.kind(), other),
        }
    }
}
