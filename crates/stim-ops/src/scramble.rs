//! Colour-preserving phase scrambling.
//!
//! Produces control stimuli that keep an image's per-channel amplitude
//! spectrum and colour histogram while destroying its recognisable form.
//!
//! # Pipeline
//!
//! 1. Forward 2-D DFT of each RGB channel, giving amplitude `A_c` and phase `phi_c`.
//! 2. One random field `phi_rand` is drawn for the image and shared by all
//!    three channels. Independent fields per channel produce hue fringing
//!    at edges.
//! 3. `phi_mix = wrap(mix * phi_c + (1 - mix) * phi_rand)`.
//! 4. Inverse DFT of `A_c * exp(i * phi_mix)`; the real part is the
//!    pre-match channel.
//! 5. Each pre-match channel is histogram-matched to its original channel.
//! 6. Clip to [0, 1].
//!
//! The spectrum built in step 4 is kept conjugate-symmetric: the mixed phase
//! is computed for one bin of every conjugate pair and negated for its
//! partner, and self-conjugate bins (DC, Nyquist) keep their original value.
//! The inverse transform is then real, so the pre-match channel carries
//! exactly the original amplitude spectrum.
//!
//! # Example
//!
//! ```rust
//! use stim_ops::phase::SeededPhase;
//! use stim_ops::scramble::{scramble, ScrambleParams};
//!
//! let rgb: Vec<f32> = (0..8 * 8 * 3).map(|i| (i % 17) as f32 / 16.0).collect();
//! let mut phase = SeededPhase::new(Some(1234));
//! let out = scramble(&rgb, 8, 8, &ScrambleParams::default(), &mut phase).unwrap();
//! assert_eq!(out.len(), rgb.len());
//! ```

use crate::error::check_len;
use crate::fft::{conjugate_index, Fft2Plan};
use crate::histogram::match_histogram;
use crate::phase::{wrap_phase, PhaseSource};
use crate::{OpsError, OpsResult};
use rustfft::num_complex::Complex;
use tracing::debug;

/// Number of interleaved channels the scrambler works on.
pub const RGB_CHANNELS: usize = 3;

/// Scrambling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrambleParams {
    /// Share of the original phase kept, in [0, 1].
    /// 0.0 is full scrambling, 1.0 reproduces the input.
    pub mix: f32,
}

impl ScrambleParams {
    /// Validates `mix` and builds parameters.
    pub fn new(mix: f32) -> OpsResult<Self> {
        if !(0.0..=1.0).contains(&mix) {
            return Err(OpsError::InvalidParameter(format!(
                "mix must be within [0, 1], got {}",
                mix
            )));
        }
        Ok(Self { mix })
    }
}

impl Default for ScrambleParams {
    fn default() -> Self {
        Self { mix: 0.0 }
    }
}

/// Phase-scrambles an interleaved RGB image without histogram matching.
///
/// Draws exactly one phase field from `source`. The result has the input's
/// shape but its values are no longer confined to [0, 1].
pub fn phase_scramble<S: PhaseSource + ?Sized>(
    src: &[f32],
    width: usize,
    height: usize,
    params: &ScrambleParams,
    source: &mut S,
) -> OpsResult<Vec<f32>> {
    check_len(src.len(), width, height, RGB_CHANNELS)?;
    let params = ScrambleParams::new(params.mix)?;

    let field = source.draw(width, height);
    if field.width() != width || field.height() != height {
        return Err(OpsError::InvalidDimensions(format!(
            "phase field is {}x{}, image is {}x{}",
            field.width(),
            field.height(),
            width,
            height
        )));
    }
    let rand = field.angles();
    let mix = params.mix as f64;
    let pixels = width * height;
    let plan = Fft2Plan::new(width, height)?;

    let mut out = vec![0.0f32; src.len()];
    for c in 0..RGB_CHANNELS {
        let channel: Vec<f32> = (0..pixels).map(|i| src[i * RGB_CHANNELS + c]).collect();
        let orig = plan.forward(&channel)?;

        let mut mixed = vec![Complex::new(0.0, 0.0); pixels];
        for i in 0..pixels {
            let j = conjugate_index(i, width, height);
            if j == i {
                mixed[i] = orig[i];
            } else if i < j {
                let phi = wrap_phase(mix * orig[i].arg() + (1.0 - mix) * rand[i]);
                let v = Complex::from_polar(orig[i].norm(), phi);
                mixed[i] = v;
                mixed[j] = v.conj();
            }
        }

        plan.inverse(&mut mixed)?;
        for i in 0..pixels {
            out[i * RGB_CHANNELS + c] = mixed[i].re as f32;
        }
    }

    debug!(width, height, mix = params.mix, "phase scrambled");
    Ok(out)
}

/// Phase-scrambles an interleaved RGB image and restores each channel's histogram.
///
/// Output values are the original channel values rearranged, clipped to [0, 1].
pub fn scramble<S: PhaseSource + ?Sized>(
    src: &[f32],
    width: usize,
    height: usize,
    params: &ScrambleParams,
    source: &mut S,
) -> OpsResult<Vec<f32>> {
    let pre = phase_scramble(src, width, height, params, source)?;
    let pixels = width * height;

    let mut out = vec![0.0f32; src.len()];
    for c in 0..RGB_CHANNELS {
        let pre_c: Vec<f32> = (0..pixels).map(|i| pre[i * RGB_CHANNELS + c]).collect();
        let orig_c: Vec<f32> = (0..pixels).map(|i| src[i * RGB_CHANNELS + c]).collect();
        let matched = match_histogram(&pre_c, &orig_c)?;
        for (i, v) in matched.into_iter().enumerate() {
            out[i * RGB_CHANNELS + c] = v.clamp(0.0, 1.0);
        }
    }

    debug!(width, height, "histogram matched");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{PhaseField, SeededPhase};
    use crate::stats::{amplitude_relative_error, channel, sorted_max_deviation};

    /// Counts draws and forwards to a seeded source.
    struct CountingPhase {
        inner: SeededPhase,
        draws: Vec<(usize, usize)>,
    }

    impl PhaseSource for CountingPhase {
        fn draw(&mut self, width: usize, height: usize) -> PhaseField {
            self.draws.push((width, height));
            self.inner.draw(width, height)
        }
    }

    fn gradient(width: usize, height: usize) -> Vec<f32> {
        let n = (width * height - 1) as f32;
        (0..width * height)
            .flat_map(|i| {
                let v = i as f32 / n;
                [v, 0.25 + 0.5 * v, (i % width) as f32 / (width - 1) as f32]
            })
            .collect()
    }

    #[test]
    fn test_shape_preserved() {
        let src = gradient(7, 5);
        let mut phase = SeededPhase::new(Some(1));
        let out = scramble(&src, 7, 5, &ScrambleParams::default(), &mut phase).unwrap();
        assert_eq!(out.len(), 7 * 5 * 3);
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_one_shared_draw_per_image() {
        let src = gradient(6, 4);
        let mut phase = CountingPhase {
            inner: SeededPhase::new(Some(5)),
            draws: Vec::new(),
        };

        scramble(&src, 6, 4, &ScrambleParams::default(), &mut phase).unwrap();
        assert_eq!(phase.draws, vec![(6, 4)]);

        scramble(&src, 6, 4, &ScrambleParams::default(), &mut phase).unwrap();
        assert_eq!(phase.draws.len(), 2);
    }

    #[test]
    fn test_histogram_exact_per_channel() {
        let src = gradient(8, 6);
        let mut phase = SeededPhase::new(Some(1234));
        let out = scramble(&src, 8, 6, &ScrambleParams::default(), &mut phase).unwrap();

        for c in 0..3 {
            assert_eq!(sorted_max_deviation(&channel(&src, c), &channel(&out, c)), 0.0);
        }
    }

    #[test]
    fn test_prematch_amplitude_preserved() {
        for (w, h) in [(8, 8), (7, 5), (4, 4), (2, 6)] {
            let src = gradient(w, h);
            let mut phase = SeededPhase::new(Some(42));
            let pre = phase_scramble(&src, w, h, &ScrambleParams::default(), &mut phase).unwrap();

            for c in 0..3 {
                let err = amplitude_relative_error(&channel(&src, c), &channel(&pre, c), w, h).unwrap();
                assert!(err < 1e-3, "{}x{} channel {}: {}", w, h, c, err);
            }
        }
    }

    #[test]
    fn test_shared_field_means_identical_phase_shift() {
        // Channels that are affine copies of each other stay affine copies
        let w = 6;
        let h = 6;
        let src: Vec<f32> = (0..w * h)
            .flat_map(|i| {
                let v = ((i * 5) % 13) as f32 / 12.0;
                [v, 0.5 * v, 0.25 * v]
            })
            .collect();
        let mut phase = SeededPhase::new(Some(77));
        let pre = phase_scramble(&src, w, h, &ScrambleParams::default(), &mut phase).unwrap();

        for px in pre.chunks(3) {
            approx::assert_abs_diff_eq!(px[1], 0.5 * px[0], epsilon = 1e-5);
            approx::assert_abs_diff_eq!(px[2], 0.25 * px[0], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_mix_one_reproduces_input() {
        let src: Vec<f32> = (0..5 * 4 * 3).map(|i| ((i * 37) % 256) as f32 / 255.0).collect();
        let mut phase = SeededPhase::new(Some(3));
        let params = ScrambleParams::new(1.0).unwrap();
        let out = scramble(&src, 5, 4, &params, &mut phase).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_partial_mix_keeps_amplitude_and_histogram() {
        let (w, h) = (8, 6);
        let src = gradient(w, h);
        let half = ScrambleParams::new(0.5).unwrap();

        let pre = phase_scramble(&src, w, h, &half, &mut SeededPhase::new(Some(21))).unwrap();
        for c in 0..3 {
            let err = amplitude_relative_error(&channel(&src, c), &channel(&pre, c), w, h).unwrap();
            assert!(err < 1e-3, "channel {}: {}", c, err);
        }

        let out = scramble(&src, w, h, &half, &mut SeededPhase::new(Some(21))).unwrap();
        for c in 0..3 {
            assert_eq!(sorted_max_deviation(&channel(&src, c), &channel(&out, c)), 0.0);
        }

        // Same field, different mix: the kept share of original phase shows up
        let full = scramble(&src, w, h, &ScrambleParams::default(), &mut SeededPhase::new(Some(21))).unwrap();
        assert_ne!(out, full);
        assert_ne!(out, src);
    }

    #[test]
    fn test_seed_reproducible() {
        let src = gradient(9, 7);
        let a = scramble(&src, 9, 7, &ScrambleParams::default(), &mut SeededPhase::new(Some(11))).unwrap();
        let b = scramble(&src, 9, 7, &ScrambleParams::default(), &mut SeededPhase::new(Some(11))).unwrap();
        let c = scramble(&src, 9, 7, &ScrambleParams::default(), &mut SeededPhase::new(Some(12))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_constant_image_unchanged() {
        let src = vec![0.4f32; 5 * 5 * 3];
        let mut phase = SeededPhase::new(Some(8));
        let out = scramble(&src, 5, 5, &ScrambleParams::default(), &mut phase).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_invalid_mix_rejected() {
        assert!(ScrambleParams::new(-0.1).is_err());
        assert!(ScrambleParams::new(1.5).is_err());
        assert!(ScrambleParams::new(f32::NAN).is_err());

        let src = gradient(2, 2);
        let bad = ScrambleParams { mix: 2.0 };
        assert!(scramble(&src, 2, 2, &bad, &mut SeededPhase::new(Some(0))).is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let mut phase = SeededPhase::new(Some(0));
        assert!(scramble(&[0.0; 10], 2, 2, &ScrambleParams::default(), &mut phase).is_err());
    }
}
