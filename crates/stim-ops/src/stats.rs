//! Verification statistics for scrambled stimuli.
//!
//! Answers the two questions asked of every control stimulus: does each
//! channel still hold the original values, and how far has the amplitude
//! spectrum moved.

use crate::error::check_len;
use crate::fft::{magnitude, Fft2Plan};
use crate::scramble::RGB_CHANNELS;
use crate::OpsResult;

/// Per-channel comparison of an original and a scrambled image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    /// Channel index (0 = R, 1 = G, 2 = B).
    pub channel: usize,
    /// Largest difference between the two sorted value lists.
    /// Zero means both hold the same multiset.
    pub histogram_max_deviation: f32,
    /// `||A_b - A_a|| / ||A_a||` over all frequency bins.
    pub spectrum_relative_error: f64,
    /// Number of pixel positions whose value differs.
    pub changed_pixels: usize,
}

/// Extracts channel `c` from an interleaved RGB buffer.
pub fn channel(rgb: &[f32], c: usize) -> Vec<f32> {
    rgb.iter().skip(c).step_by(RGB_CHANNELS).copied().collect()
}

/// Largest absolute difference between `a` and `b` after sorting both.
///
/// Buffers of different lengths compare as infinitely far apart.
pub fn sorted_max_deviation(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    let mut sa = a.to_vec();
    let mut sb = b.to_vec();
    sa.sort_by(f32::total_cmp);
    sb.sort_by(f32::total_cmp);
    sa.iter()
        .zip(sb.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// Relative L2 distance between the amplitude spectra of two planes.
pub fn amplitude_relative_error(a: &[f32], b: &[f32], width: usize, height: usize) -> OpsResult<f64> {
    let plan = Fft2Plan::new(width, height)?;
    let ma = magnitude(&plan.forward(a)?);
    let mb = magnitude(&plan.forward(b)?);

    let num: f64 = ma.iter().zip(mb.iter()).map(|(x, y)| (x - y).powi(2)).sum();
    let den: f64 = ma.iter().map(|x| x * x).sum();
    if den == 0.0 {
        return Ok(if num == 0.0 { 0.0 } else { f64::INFINITY });
    }
    Ok((num / den).sqrt())
}

/// Compares two interleaved RGB images of the same size, channel by channel.
pub fn compare_channels(
    original: &[f32],
    scrambled: &[f32],
    width: usize,
    height: usize,
) -> OpsResult<Vec<ChannelReport>> {
    check_len(original.len(), width, height, RGB_CHANNELS)?;
    check_len(scrambled.len(), width, height, RGB_CHANNELS)?;

    (0..RGB_CHANNELS)
        .map(|c| {
            let a = channel(original, c);
            let b = channel(scrambled, c);
            Ok(ChannelReport {
                channel: c,
                histogram_max_deviation: sorted_max_deviation(&a, &b),
                spectrum_relative_error: amplitude_relative_error(&a, &b, width, height)?,
                changed_pixels: a.iter().zip(b.iter()).filter(|(x, y)| x != y).count(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_split() {
        let rgb = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(channel(&rgb, 0), vec![1.0, 4.0]);
        assert_eq!(channel(&rgb, 2), vec![3.0, 6.0]);
    }

    #[test]
    fn test_sorted_deviation() {
        assert_eq!(sorted_max_deviation(&[0.1, 0.5, 0.3], &[0.5, 0.3, 0.1]), 0.0);
        assert!((sorted_max_deviation(&[0.1, 0.5], &[0.1, 0.25]) - 0.25).abs() < 1e-7);
        assert_eq!(sorted_max_deviation(&[0.1], &[0.1, 0.2]), f32::INFINITY);
    }

    #[test]
    fn test_circular_shift_keeps_amplitude() {
        let w = 4;
        let h = 3;
        let a: Vec<f32> = (0..w * h).map(|i| (i * i % 7) as f32).collect();
        // shift right by one column, wrapping
        let b: Vec<f32> = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                a[y * w + (x + w - 1) % w]
            })
            .collect();
        assert!(amplitude_relative_error(&a, &b, w, h).unwrap() < 1e-9);
    }

    #[test]
    fn test_compare_identical() {
        let rgb: Vec<f32> = (0..2 * 2 * 3).map(|i| i as f32 / 12.0).collect();
        let reports = compare_channels(&rgb, &rgb, 2, 2).unwrap();
        assert_eq!(reports.len(), 3);
        for r in reports {
            assert_eq!(r.histogram_max_deviation, 0.0);
            assert_eq!(r.spectrum_relative_error, 0.0);
            assert_eq!(r.changed_pixels, 0);
        }
    }

    #[test]
    fn test_compare_size_mismatch() {
        assert!(compare_channels(&[0.0; 12], &[0.0; 9], 2, 2).is_err());
    }
}
