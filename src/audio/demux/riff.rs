//! RIFF/WAVE chunk walker for linear PCM files.
//!
//! Unsigned 8-bit and signed 16-bit PCM is served straight from the `data`
//! chunk so that [`Stereo16`](crate::audio::convert::Stereo16) performs the
//! widening. Everything else (float, 24-bit, compressed) is left to symphonia.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace};

use crate::audio::pipeline::PcmFormat;
use crate::audio::source::read_full;
use crate::common::errors::Result;

const WAVE_FORMAT_PCM: u16 = 1;
const RIFF_PREAMBLE: usize = 12;
const FMT_MIN_LEN: u32 = 16;

/// Where the payload of a PCM WAV file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavLayout {
    pub format: PcmFormat,
    /// Bytes preceding the first payload byte.
    pub header_len: u64,
    /// Payload size announced by the `data` chunk.
    pub data_len: u64,
}

/// Reads chunks up to and including the `data` chunk header.
///
/// Returns `None` when the stream is not RIFF/WAVE or carries a layout other
/// than mono/stereo 8/16-bit linear PCM. On `Some`, `reader` sits on the
/// first payload byte.
pub fn read_layout<R: Read>(reader: &mut R) -> Result<Option<WavLayout>> {
    let mut preamble = [0u8; RIFF_PREAMBLE];
    if read_full(reader, &mut preamble)? < RIFF_PREAMBLE
        || &preamble[0..4] != b"RIFF"
        || &preamble[8..12] != b"WAVE"
    {
        return Ok(None);
    }

    let mut header_len = RIFF_PREAMBLE as u64;
    let mut format = None;

    loop {
        let mut id = [0u8; 4];
        reader.read_exact(&mut id)?;
        let size = reader.read_u32::<LittleEndian>()?;
        header_len += 8;

        match &id {
            b"fmt " => {
                if size < FMT_MIN_LEN {
                    return Ok(None);
                }
                let tag = reader.read_u16::<LittleEndian>()?;
                let channels = reader.read_u16::<LittleEndian>()?;
                let sample_rate = reader.read_u32::<LittleEndian>()?;
                let _byte_rate = reader.read_u32::<LittleEndian>()?;
                let _block_align = reader.read_u16::<LittleEndian>()?;
                let bits_per_sample = reader.read_u16::<LittleEndian>()?;
                skip(reader, padded(size) - FMT_MIN_LEN as u64)?;
                header_len += padded(size);

                let pcm = PcmFormat::new(channels, bits_per_sample, sample_rate);
                if tag != WAVE_FORMAT_PCM || pcm.validate().is_err() {
                    debug!("RIFF: tag {} {:?} left to the decoder", tag, pcm);
                    return Ok(None);
                }
                format = Some(pcm);
            }
            b"data" => {
                let Some(format) = format else {
                    debug!("RIFF: data chunk before fmt chunk");
                    return Ok(None);
                };
                debug!(
                    "RIFF: {:?}, payload {} bytes at offset {}",
                    format, size, header_len
                );
                return Ok(Some(WavLayout {
                    format,
                    header_len,
                    data_len: size as u64,
                }));
            }
            other => {
                trace!("RIFF: skipping {:?} chunk ({} bytes)", String::from_utf8_lossy(other), size);
                skip(reader, padded(size))?;
                header_len += padded(size);
            }
        }
    }
}

/// Chunks are word aligned; odd sizes carry one pad byte.
fn padded(size: u32) -> u64 {
    size as u64 + (size & 1) as u64
}

fn skip<R: Read>(reader: &mut R, len: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated RIFF chunk",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::{HEADER_LEN, write_wav};
    use std::io::Cursor;

    fn wav(format: PcmFormat, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_wav(&mut out, format, data).unwrap();
        out
    }

    #[test]
    fn canonical_header() {
        let bytes = wav(PcmFormat::new(1, 8, 11_025), &[1, 2, 3]);
        let mut reader = Cursor::new(bytes);
        let layout = read_layout(&mut reader).unwrap().unwrap();

        assert_eq!(layout.format, PcmFormat::new(1, 8, 11_025));
        assert_eq!(layout.header_len, HEADER_LEN);
        assert_eq!(layout.data_len, 3);
        assert_eq!(reader.position(), HEADER_LEN);
    }

    #[test]
    fn skips_unknown_and_odd_sized_chunks() {
        let canonical = wav(PcmFormat::stereo16(22_050), &[0; 8]);
        let mut bytes = canonical[..36].to_vec();
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[9, 9, 9, 0]);
        bytes.extend_from_slice(&canonical[36..]);

        let layout = read_layout(&mut Cursor::new(bytes)).unwrap().unwrap();
        assert_eq!(layout.header_len, HEADER_LEN + 12);
        assert_eq!(layout.data_len, 8);
    }

    #[test]
    fn other_layouts_are_declined() {
        let mut float = wav(PcmFormat::stereo16(48_000), &[0; 8]);
        float[20] = 3;
        assert!(read_layout(&mut Cursor::new(float)).unwrap().is_none());

        let wide = wav(PcmFormat::new(2, 24, 48_000), &[0; 12]);
        assert!(read_layout(&mut Cursor::new(wide)).unwrap().is_none());

        assert!(read_layout(&mut Cursor::new(b"ID3\x04".to_vec())).unwrap().is_none());
    }

    #[test]
    fn truncated_chunk_is_an_error() {
        let bytes = wav(PcmFormat::stereo16(48_000), &[]);
        assert!(read_layout(&mut Cursor::new(&bytes[..30])).is_err());
    }
}
