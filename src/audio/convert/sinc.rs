//! Windowed-sinc interpolation at fractional source positions.
//!
//! Each output frame sums the source frames within
//! [`WINDOW_HALF_WIDTH`] of its fractional source position, weighted by a
//! normalized sinc kernel and a Hann taper spanning [`TAPER_SPAN`] samples.
//! Both factors come from the table-driven trigonometry in
//! [`trig`](super::trig).

use crate::audio::constants::{TAPER_SPAN, WINDOW_HALF_WIDTH};
use crate::audio::source::PcmSource;
use crate::common::errors::Result;

use super::cache::BlockLoader;
use super::trig::{fast_cos01, sinc01};

/// Maps output frames onto fractional source positions.
#[derive(Debug, Clone, Copy)]
pub struct RateRatio {
    pub from: u32,
    pub to: u32,
}

impl RateRatio {
    /// Fractional source frame corresponding to output frame `t`.
    #[inline]
    pub fn source_position(&self, t: u64) -> f64 {
        t as f64 * self.from as f64 / self.to as f64
    }

    /// Output frame count for `source_frames` input frames, rounded down.
    pub fn output_frames(&self, source_frames: u64) -> u64 {
        (source_frames as u128 * self.to as u128 / self.from as u128) as u64
    }
}

/// Weight of a source frame `d` samples away from the interpolation point.
#[inline]
pub fn kernel_weight(d: f64) -> f64 {
    let taper = 0.5 + 0.5 * fast_cos01(d / TAPER_SPAN);
    sinc01(d / 2.0) * taper
}

/// Interpolated, clamped `(left, right)` for output frame `t`.
pub fn interpolate<S: PcmSource>(
    loader: &mut BlockLoader<S>,
    ratio: RateRatio,
    t: u64,
) -> Result<(f64, f64)> {
    let frames = loader.frames();
    if frames == 0 {
        return Ok((0.0, 0.0));
    }
    let last = frames as i64 - 1;
    let position = ratio.source_position(t);

    let start = ((position - WINDOW_HALF_WIDTH).floor() as i64).clamp(0, last);
    let end = ((position + WINDOW_HALF_WIDTH).ceil() as i64).min(last);

    let (mut left, mut right) = (0.0, 0.0);
    for n in start..=end {
        let (l, r) = loader.sample(n)?;
        let weight = kernel_weight(position - n as f64);
        left += l * weight;
        right += r * weight;
    }

    Ok((left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::testing::{InstrumentedSource, noise_stereo16, stereo16_bytes};

    fn loader(bytes: Vec<u8>) -> BlockLoader<InstrumentedSource> {
        let len = bytes.len() as u64;
        let (source, _) = InstrumentedSource::new(bytes);
        BlockLoader::new(source, len)
    }

    #[test]
    fn weight_is_one_at_center_and_zero_on_integers() {
        assert_eq!(kernel_weight(0.0), 1.0);
        for d in 1..=8 {
            assert_eq!(kernel_weight(d as f64), 0.0);
            assert_eq!(kernel_weight(-(d as f64)), 0.0);
        }
    }

    #[test]
    fn taper_vanishes_at_window_edge() {
        assert!((0.5 + 0.5 * fast_cos01(8.5 / TAPER_SPAN)).abs() < 1e-6);
    }

    #[test]
    fn output_frames_rounds_down() {
        let ratio = RateRatio { from: 44_100, to: 48_000 };
        assert_eq!(ratio.output_frames(44_100), 48_000);
        assert_eq!(ratio.output_frames(1), 1);
        let down = RateRatio { from: 48_000, to: 8_000 };
        assert_eq!(down.output_frames(5), 0);
    }

    #[test]
    fn equal_rates_reproduce_the_source() {
        let bytes = noise_stereo16(300, 7);
        let expected = crate::audio::source::testing::stereo16_frames(&bytes);
        let mut loader = loader(bytes);
        let ratio = RateRatio { from: 22_050, to: 22_050 };

        for (t, &(l, r)) in expected.iter().enumerate() {
            let (il, ir) = interpolate(&mut loader, ratio, t as u64).unwrap();
            assert!((il - l as f64 / 32767.0).abs() < 1e-12);
            assert!((ir - r as f64 / 32767.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_input_stays_near_constant() {
        let bytes = stereo16_bytes(&vec![(8000, -8000); 2000]);
        let mut loader = loader(bytes);
        let ratio = RateRatio { from: 44_100, to: 48_000 };

        // Away from the edges the taper-weighted sinc sums close to unity.
        for t in 100..1900 {
            let (l, r) = interpolate(&mut loader, ratio, t).unwrap();
            let expected = 8000.0 / 32767.0;
            assert!((l - expected).abs() < 0.02, "t={t}: {l}");
            assert!((r + expected).abs() < 0.02, "t={t}: {r}");
        }
    }

    #[test]
    fn output_is_clamped() {
        // Alternating full-scale input overshoots between samples.
        let pairs: Vec<(i16, i16)> = (0..64)
            .map(|i| if i % 2 == 0 { (32767, 32767) } else { (-32767, -32767) })
            .collect();
        let mut loader = loader(stereo16_bytes(&pairs));
        let ratio = RateRatio { from: 3, to: 7 };
        for t in 0..140 {
            let (l, r) = interpolate(&mut loader, ratio, t).unwrap();
            assert!((-1.0..=1.0).contains(&l));
            assert!((-1.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn empty_source_is_silent() {
        let mut loader = loader(Vec::new());
        let ratio = RateRatio { from: 1, to: 2 };
        assert_eq!(interpolate(&mut loader, ratio, 0).unwrap(), (0.0, 0.0));
    }
}
