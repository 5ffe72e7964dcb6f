//! Minimal RIFF/WAVE writer for PCM payloads.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::audio::pipeline::PcmFormat;

/// Size of the canonical 44-byte header written by [`write_header`].
pub const HEADER_LEN: u64 = 44;

const FORMAT_PCM: u16 = 1;

/// Writes a canonical PCM header announcing `data_len` payload bytes.
pub fn write_header<W: Write>(writer: &mut W, format: PcmFormat, data_len: u32) -> io::Result<()> {
    let block_align = format.frame_bytes() as u16;
    let byte_rate = format.sample_rate * block_align as u32;

    writer.write_all(b"RIFF")?;
    writer.write_u32::<LittleEndian>(data_len.saturating_add(HEADER_LEN as u32 - 8))?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_u32::<LittleEndian>(16)?;
    writer.write_u16::<LittleEndian>(FORMAT_PCM)?;
    writer.write_u16::<LittleEndian>(format.channels)?;
    writer.write_u32::<LittleEndian>(format.sample_rate)?;
    writer.write_u32::<LittleEndian>(byte_rate)?;
    writer.write_u16::<LittleEndian>(block_align)?;
    writer.write_u16::<LittleEndian>(format.bits_per_sample)?;

    writer.write_all(b"data")?;
    writer.write_u32::<LittleEndian>(data_len)
}

/// Header followed by `data`.
pub fn write_wav<W: Write>(writer: &mut W, format: PcmFormat, data: &[u8]) -> io::Result<()> {
    let data_len = u32::try_from(data.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "payload exceeds 4 GiB"))?;
    write_header(writer, format, data_len)?;
    writer.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut out = Vec::new();
        write_wav(&mut out, PcmFormat::stereo16(48_000), &[1, 2, 3, 4]).unwrap();

        assert_eq!(out.len(), HEADER_LEN as usize + 4);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([out[4], out[5], out[6], out[7]]), 40);
        assert_eq!(&out[8..16], b"WAVEfmt ");
        assert_eq!(u16::from_le_bytes([out[22], out[23]]), 2);
        assert_eq!(u32::from_le_bytes([out[24], out[25], out[26], out[27]]), 48_000);
        assert_eq!(u32::from_le_bytes([out[28], out[29], out[30], out[31]]), 192_000);
        assert_eq!(u16::from_le_bytes([out[32], out[33]]), 4);
        assert_eq!(&out[36..40], b"data");
        assert_eq!(&out[44..], &[1, 2, 3, 4]);
    }
}
