//! In-memory sources with call counters and failure injection.

use std::{
    io::{self, Cursor, Read, Seek, SeekFrom},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use byteorder::{ByteOrder, LittleEndian};

use super::PcmSource;

/// Shared view of what happened to an [`InstrumentedSource`], usable after
/// the source has been moved into an adapter.
#[derive(Clone, Default)]
pub struct Probe {
    reads: Arc<AtomicUsize>,
    seeks: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
}

impl Probe {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> usize {
        self.seeks.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }
}

pub struct InstrumentedSource {
    inner: Cursor<Vec<u8>>,
    probe: Probe,
    max_read: Option<usize>,
}

impl InstrumentedSource {
    pub fn new(data: Vec<u8>) -> (Self, Probe) {
        let probe = Probe::default();
        let source = Self {
            inner: Cursor::new(data),
            probe: probe.clone(),
            max_read: None,
        };
        (source, probe)
    }

    /// Caps every read at `n` bytes to exercise short-read handling.
    pub fn with_max_read(mut self, n: usize) -> Self {
        self.max_read = Some(n);
        self
    }
}

impl Read for InstrumentedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected failure"));
        }
        let limit = self.max_read.unwrap_or(buf.len()).min(buf.len());
        self.inner.read(&mut buf[..limit])
    }
}

impl Seek for InstrumentedSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.probe.seeks.fetch_add(1, Ordering::SeqCst);
        self.inner.seek(pos)
    }
}

impl PcmSource for InstrumentedSource {
    fn close(&mut self) -> io::Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.inner.get_ref().len() as u64)
    }
}

/// Encodes `(left, right)` pairs as stereo 16-bit LE frames.
pub fn stereo16_bytes(frames: &[(i16, i16)]) -> Vec<u8> {
    let mut out = vec![0u8; frames.len() * 4];
    for (chunk, &(l, r)) in out.chunks_exact_mut(4).zip(frames) {
        LittleEndian::write_i16(&mut chunk[0..2], l);
        LittleEndian::write_i16(&mut chunk[2..4], r);
    }
    out
}

/// Decodes stereo 16-bit LE frames into `(left, right)` pairs.
pub fn stereo16_frames(bytes: &[u8]) -> Vec<(i16, i16)> {
    bytes
        .chunks_exact(4)
        .map(|c| {
            (
                LittleEndian::read_i16(&c[0..2]),
                LittleEndian::read_i16(&c[2..4]),
            )
        })
        .collect()
}

/// `frames` frames of a sine tone, identical on both channels.
pub fn sine_stereo16(freq: f64, rate: u32, frames: usize, amplitude: f64) -> Vec<u8> {
    let tone: Vec<(i16, i16)> = (0..frames)
        .map(|n| {
            let v = amplitude * (std::f64::consts::TAU * freq * n as f64 / rate as f64).sin();
            let s = (v * 32_767.0) as i16;
            (s, s)
        })
        .collect();
    stereo16_bytes(&tone)
}

/// Deterministic noise-like stereo content (xorshift), useful where the
/// exact values do not matter but must differ frame to frame.
pub fn noise_stereo16(frames: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 16) as i16 / 2
    };
    let pairs: Vec<(i16, i16)> = (0..frames).map(|_| (next(), next())).collect();
    stereo16_bytes(&pairs)
}
