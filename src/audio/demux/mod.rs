//! Demux layer: turns an input file into a raw PCM [`PcmSource`] plus the
//! layout it is stored in.
//!
//! Linear 8/16-bit PCM WAV payloads are read in place through a
//! [`DataRegion`]; any other container symphonia understands is decoded to
//! interleaved signed 16-bit at the track's native channel count. Widening
//! and resampling are left to [`crate::audio::pipeline`].
//!
//! ```rust,ignore
//! let input = open_path(Path::new("tone.wav"))?;
//! let stream = DecodedStream::open(input.source, input.len, input.format, 48_000)?;
//! ```

pub mod riff;

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions},
    errors::Error,
    formats::{FormatOptions, FormatReader, SeekMode, SeekTo},
    io::{MediaSource, MediaSourceStream},
    meta::MetadataOptions,
    probe::Hint,
    units::TimeBase,
};
use tracing::{debug, info, trace, warn};

use crate::audio::pipeline::PcmFormat;
use crate::audio::source::{BoxedSource, DataRegion, PcmSource};
use crate::common::errors::{ConvertError, Result};

/// Bytes per decoded sample; the decoder always emits signed 16-bit.
const SAMPLE_BYTES: u64 = 2;

/// An opened input: raw PCM bytes and how to interpret them.
pub struct OpenedInput {
    pub source: BoxedSource,
    pub format: PcmFormat,
    /// Payload size in bytes.
    pub len: u64,
}

impl OpenedInput {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Opens the file at `path`; the extension is used as a probe hint.
pub fn open_path(path: &Path) -> Result<OpenedInput> {
    let file = File::open(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    open_source(file, extension)
}

/// Serves PCM WAV payloads directly and decodes everything else.
pub fn open_source<S>(mut source: S, extension: Option<&str>) -> Result<OpenedInput>
where
    S: PcmSource + MediaSource + 'static,
{
    if let Some(layout) = riff::read_layout(&mut source)? {
        let available = PcmSource::byte_len(&source)
            .map_or(layout.data_len, |total| total.saturating_sub(layout.header_len));
        let len = layout.data_len.min(available);
        if len < layout.data_len {
            warn!(
                "Demux: data chunk announces {} bytes, only {} present",
                layout.data_len, len
            );
        }
        info!("Demux: raw PCM payload, {:?}, {} bytes", layout.format, len);
        return Ok(OpenedInput {
            source: Box::new(DataRegion::new(source, layout.header_len, len)),
            format: layout.format,
            len,
        });
    }

    source.seek(SeekFrom::Start(0))?;
    let decoded = open_format(Box::new(source), extension)?;
    Ok(OpenedInput {
        format: decoded.pcm_format(),
        len: decoded.len(),
        source: Box::new(decoded),
    })
}

/// Probe `source`, select its first decodable track and prepare a decoder.
///
/// `extension` is a hint such as `"wav"` or `"mp3"`.
pub fn open_format(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<DecodedSource> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension.filter(|e| !e.is_empty()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            ConvertError::Io(io::Error::new(io::ErrorKind::NotFound, "no audio track found"))
        })?;

    let params = track.codec_params.clone();
    let track_id = track.id;

    let channels = params.channels.map(|c| c.count()).unwrap_or(0) as u16;
    let sample_rate = params.sample_rate.unwrap_or(0);
    let pcm = PcmFormat::new(channels, 16, sample_rate);
    pcm.validate()?;

    let frames = params.n_frames.ok_or(ConvertError::UnknownLength)?;
    let decoder = symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

    info!(
        "Demux: opened track {}, {} Hz, {} ch, {} frames",
        track_id, sample_rate, channels, frames
    );

    Ok(DecodedSource {
        format,
        decoder,
        track_id,
        time_base: params.time_base,
        pcm,
        len: frames * channels as u64 * SAMPLE_BYTES,
        pos: 0,
        pending: Vec::new(),
        pending_offset: 0,
        skip: 0,
        sample_buf: None,
    })
}

/// Decoded track exposed as interleaved signed 16-bit LE PCM.
pub struct DecodedSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    time_base: Option<TimeBase>,
    pcm: PcmFormat,
    len: u64,
    pos: u64,
    /// Bytes of the last decoded packet not yet handed out.
    pending: Vec<u8>,
    pending_offset: usize,
    /// Bytes still to discard after an accurate seek landed early.
    skip: u64,
    sample_buf: Option<SampleBuffer<i16>>,
}

impl DecodedSource {
    pub fn pcm_format(&self) -> PcmFormat {
        self.pcm
    }

    /// Payload size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn frame_bytes(&self) -> u64 {
        self.pcm.frame_bytes() as u64
    }

    /// Frame index → track timestamp.
    fn frame_to_ts(&self, frame: u64) -> u64 {
        match self.time_base {
            Some(tb) if tb.numer != 0 => {
                (frame as u128 * tb.denom as u128
                    / (tb.numer as u128 * self.pcm.sample_rate as u128)) as u64
            }
            _ => frame,
        }
    }

    /// Track timestamp delta → frame count.
    fn ts_to_frames(&self, ts: u64) -> u64 {
        match self.time_base {
            Some(tb) if tb.denom != 0 => {
                (ts as u128 * tb.numer as u128 * self.pcm.sample_rate as u128
                    / tb.denom as u128) as u64
            }
            _ => ts,
        }
    }

    /// Decodes packets until one yields bytes. `false` at end of track.
    fn decode_next(&mut self) -> Result<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(Error::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(Error::DecodeError(e)) => {
                    warn!("Demux: skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let needed = decoded.capacity() * spec.channels.count();
            if self.sample_buf.as_ref().is_none_or(|b| b.capacity() < needed) {
                self.sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
            }
            let Some(buf) = self.sample_buf.as_mut() else {
                continue;
            };
            buf.copy_interleaved_ref(decoded);

            let samples = buf.samples();
            self.pending.resize(samples.len() * SAMPLE_BYTES as usize, 0);
            LittleEndian::write_i16_into(samples, &mut self.pending);

            let skipped = self.skip.min(self.pending.len() as u64);
            self.skip -= skipped;
            self.pending_offset = skipped as usize;

            if self.pending_offset < self.pending.len() {
                trace!("Demux: decoded {} bytes", self.pending.len() - self.pending_offset);
                return Ok(true);
            }
        }
    }

    fn seek_to(&mut self, target: u64) -> Result<u64> {
        self.pending.clear();
        self.pending_offset = 0;
        self.skip = 0;

        if target >= self.len {
            self.pos = self.len;
            return Ok(self.pos);
        }

        let frame_bytes = self.frame_bytes();
        let frame = target / frame_bytes;
        let seeked = self.format.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: self.frame_to_ts(frame),
                track_id: self.track_id,
            },
        )?;
        self.decoder.reset();

        let lead = self.ts_to_frames(seeked.required_ts.saturating_sub(seeked.actual_ts));
        self.skip = lead * frame_bytes + target % frame_bytes;
        self.pos = target;

        debug!(
            "Demux: seek → byte {} (frame {}, skipping {} bytes)",
            target, frame, self.skip
        );
        Ok(target)
    }
}

impl Read for DecodedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.pos >= self.len {
            return Ok(0);
        }
        while self.pending_offset >= self.pending.len() {
            if !self.decode_next()? {
                return Ok(0);
            }
        }

        let available = &self.pending[self.pending_offset..];
        let remaining = usize::try_from(self.len - self.pos).unwrap_or(usize::MAX);
        let n = buf.len().min(available.len()).min(remaining);
        buf[..n].copy_from_slice(&available[..n]);

        self.pending_offset += n;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for DecodedSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.pos as i128 + delta as i128,
            SeekFrom::End(delta) => self.len as i128 + delta as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of decoded stream",
            ));
        }
        Ok(self.seek_to(target.min(u64::MAX as i128) as u64)?)
    }
}

impl PcmSource for DecodedSource {
    fn close(&mut self) -> io::Result<()> {
        self.pending = Vec::new();
        self.sample_buf = None;
        Ok(())
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pipeline::DecodedStream;
    use crate::audio::source::testing::stereo16_frames;
    use crate::audio::wav::write_wav;
    use std::io::Cursor;

    fn mono_ramp_wav(frames: i16, rate: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for s in 0..frames {
            data.extend_from_slice(&(s * 3).to_le_bytes());
        }
        let mut wav = Vec::new();
        write_wav(&mut wav, PcmFormat::new(1, 16, rate), &data).unwrap();
        wav
    }

    fn decode_all(source: &mut DecodedSource) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 1000];
        loop {
            let n = source.read(&mut buf).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn decodes_wav_payload() {
        let wav = mono_ramp_wav(5000, 11_025);
        let mut source = open_format(Box::new(Cursor::new(wav)), Some("wav")).unwrap();
        assert_eq!(source.pcm_format(), PcmFormat::new(1, 16, 11_025));
        assert_eq!(source.len(), 10_000);

        let out = decode_all(&mut source);
        assert_eq!(out.len(), 10_000);
        assert_eq!(i16::from_le_bytes([out[200], out[201]]), 300);
    }

    #[test]
    fn seeks_land_on_the_requested_sample() {
        let wav = mono_ramp_wav(5000, 11_025);
        let mut source = open_format(Box::new(Cursor::new(wav)), Some("wav")).unwrap();

        assert_eq!(source.seek(SeekFrom::Start(6000)).unwrap(), 6000);
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(i16::from_le_bytes(buf), 3000 * 3);

        assert_eq!(source.seek(SeekFrom::End(0)).unwrap(), 10_000);
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn eight_bit_wav_is_widened_by_the_normalizer() {
        let mut wav = Vec::new();
        write_wav(&mut wav, PcmFormat::new(1, 8, 8000), &[255, 0, 128, 200]).unwrap();

        let input = open_source(Cursor::new(wav), Some("wav")).unwrap();
        assert_eq!(input.format, PcmFormat::new(1, 8, 8000));
        assert_eq!(input.len, 4);

        let mut stream = DecodedStream::open(input.source, input.len, input.format, 8000).unwrap();
        let mut out = [0u8; 16];
        stream.read_exact(&mut out).unwrap();
        assert_eq!(
            stereo16_frames(&out),
            vec![(32767, 32767), (-32768, -32768), (128, 128), (18632, 18632)]
        );
    }

    #[test]
    fn announced_payload_is_clamped_to_the_file() {
        let mut wav = Vec::new();
        write_wav(&mut wav, PcmFormat::stereo16(8000), &[0; 40]).unwrap();
        wav.truncate(wav.len() - 16);

        let input = open_source(Cursor::new(wav), None).unwrap();
        assert_eq!(input.len, 24);
    }

    #[test]
    fn wide_pcm_goes_through_the_decoder() {
        let data: Vec<u8> = [0x56u8, 0x34, 0x12].repeat(10);
        let mut wav = Vec::new();
        write_wav(&mut wav, PcmFormat::new(1, 24, 8000), &data).unwrap();

        let mut input = open_source(Cursor::new(wav), Some("wav")).unwrap();
        assert_eq!(input.format, PcmFormat::new(1, 16, 8000));
        assert_eq!(input.len, 20);

        let mut sample = [0u8; 2];
        input.source.read_exact(&mut sample).unwrap();
        assert_eq!(i16::from_le_bytes(sample), 0x1234);
    }

    #[test]
    fn unknown_input_is_rejected() {
        assert!(open_source(Cursor::new(b"not audio at all".to_vec()), None).is_err());
    }

    #[test]
    fn feeds_the_pipeline() {
        let wav = mono_ramp_wav(4000, 16_000);
        let decoded = open_format(Box::new(Cursor::new(wav)), None).unwrap();
        let format = decoded.pcm_format();
        let len = decoded.len();

        let mut stream = DecodedStream::open(decoded, len, format, 16_000).unwrap();
        assert_eq!(stream.len(), 16_000);
        stream.seek(SeekFrom::Start(4 * 10)).unwrap();
        let mut frame = [0u8; 4];
        stream.read_exact(&mut frame).unwrap();
        assert_eq!(stereo16_frames(&frame), vec![(30, 30)]);
    }
}
