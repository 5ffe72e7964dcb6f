//! Central constants for the conversion pipeline.
//!
//! The interpolation window and cache geometry are fixed design constants:
//! they trade quality for throughput and are not meant to be configured.

// ── Frame layout ─────────────────────────────────────────────────────────────

/// Output channel count (always stereo).
pub const OUTPUT_CHANNELS: usize = 2;

/// Bytes per output frame: two signed 16-bit little-endian samples.
pub const FRAME_BYTES: usize = 4;

/// Same as [`FRAME_BYTES`], for offset arithmetic.
pub const FRAME_BYTES_U64: u64 = FRAME_BYTES as u64;

/// Default playback rate when no configuration is supplied (Hz).
pub const DEFAULT_TARGET_RATE: u32 = 48_000;

// ── i16 scaling ──────────────────────────────────────────────────────────────

/// Divisor used both to normalize decoded samples and to re-quantize output.
pub const INT16_SCALE: f64 = 32_767.0;

/// Unsigned 8-bit → signed 16-bit expansion: `byte * 257 - 32768`.
pub const U8_TO_I16_MUL: i32 = 0x101;
pub const U8_TO_I16_BIAS: i32 = 1 << 15;

// ── Block cache ──────────────────────────────────────────────────────────────

/// Source frames per cached block.
pub const BLOCK_FRAMES: usize = 4096;

/// Bytes read from the source per block.
pub const BLOCK_BYTES: usize = BLOCK_FRAMES * FRAME_BYTES;

/// Maximum number of decoded blocks kept resident.
pub const CACHE_BLOCKS: usize = 4;

// ── Interpolation ────────────────────────────────────────────────────────────

/// Half-width of the sinc window, in source samples.
pub const WINDOW_HALF_WIDTH: f64 = 8.0;

/// Span of the Hann taper in source samples (`2W + 1`).
pub const TAPER_SPAN: f64 = WINDOW_HALF_WIDTH * 2.0 + 1.0;

/// Below this magnitude the sinc kernel is taken as exactly 1.
pub const SINC_EPSILON: f64 = 1e-8;

// ── Trigonometry ─────────────────────────────────────────────────────────────

/// Entries in the quarter-period cosine table.
pub const COS_TABLE_LEN: usize = 65_536;
