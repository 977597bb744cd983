//! Random phase fields.
//!
//! A [`PhaseField`] is one `height x width` matrix of angles drawn
//! independently and uniformly from (-pi, pi]. The scrambler asks its
//! [`PhaseSource`] for exactly one field per image and applies it to every
//! colour channel.
//!
//! # Example
//!
//! ```rust
//! use stim_ops::phase::{PhaseSource, SeededPhase};
//!
//! let mut source = SeededPhase::new(Some(1234));
//! let field = source.draw(8, 4);
//! assert_eq!(field.angles().len(), 32);
//! ```

use crate::{OpsError, OpsResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::f64::consts::{PI, TAU};

/// Wraps an angle into (-pi, pi].
pub fn wrap_phase(angle: f64) -> f64 {
    let wrapped = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// A `height x width` matrix of phase angles, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseField {
    width: usize,
    height: usize,
    angles: Vec<f64>,
}

impl PhaseField {
    /// Builds a field from explicit angles.
    pub fn new(width: usize, height: usize, angles: Vec<f64>) -> OpsResult<Self> {
        if angles.len() != width * height {
            return Err(OpsError::InvalidDimensions(format!(
                "phase field {}x{} needs {} angles, got {}",
                width,
                height,
                width * height,
                angles.len()
            )));
        }
        Ok(Self {
            width,
            height,
            angles,
        })
    }

    /// Field width in bins.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Field height in bins.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All angles, row-major.
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }
}

/// Supplier of per-image random phase fields.
pub trait PhaseSource {
    /// Draws a fresh `height x width` field.
    fn draw(&mut self, width: usize, height: usize) -> PhaseField;
}

/// ChaCha20-backed phase source.
///
/// One instance is meant to live for a whole batch: repeated runs with the
/// same seed over the same ordered inputs draw the same fields.
#[derive(Debug, Clone)]
pub struct SeededPhase {
    rng: ChaCha20Rng,
    seed: u64,
}

impl SeededPhase {
    /// Seeds from `seed`, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed in use. Re-running with it reproduces an entropy-seeded batch.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl PhaseSource for SeededPhase {
    fn draw(&mut self, width: usize, height: usize) -> PhaseField {
        // u in [0, 1) maps onto (-pi, pi]
        let angles = (0..width * height)
            .map(|_| PI - TAU * self.rng.gen_range(0.0..1.0))
            .collect();
        PhaseField {
            width,
            height,
            angles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_wrap_phase_range() {
        assert_abs_diff_eq!(wrap_phase(0.0), 0.0);
        assert_abs_diff_eq!(wrap_phase(PI), PI);
        assert_abs_diff_eq!(wrap_phase(-PI), PI);
        assert_abs_diff_eq!(wrap_phase(2.5 * PI), 0.5 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(1.5 * PI), -0.5 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(-1.5 * PI), 0.5 * PI, epsilon = 1e-12);

        for i in -100..100 {
            let w = wrap_phase(i as f64 * 0.173);
            assert!(w > -PI && w <= PI, "{} -> {}", i, w);
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let a = SeededPhase::new(Some(1234)).draw(6, 5);
        let b = SeededPhase::new(Some(1234)).draw(6, 5);
        let c = SeededPhase::new(Some(4321)).draw(6, 5);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_successive_draws_differ() {
        let mut source = SeededPhase::new(Some(7));
        let a = source.draw(4, 4);
        let b = source.draw(4, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_draw_range_and_shape() {
        let field = SeededPhase::new(Some(99)).draw(16, 9);
        assert_eq!(field.width(), 16);
        assert_eq!(field.height(), 9);
        assert!(field.angles().iter().all(|&a| a > -PI && a <= PI));

        let mean = field.angles().iter().sum::<f64>() / field.angles().len() as f64;
        assert!(mean.abs() < 0.8, "mean {}", mean);
    }

    #[test]
    fn test_entropy_seed_is_reported() {
        let source = SeededPhase::new(None);
        let replay = SeededPhase::new(Some(source.seed()));
        assert_eq!(source.clone().draw(3, 3), replay.clone().draw(3, 3));
    }

    #[test]
    fn test_field_new_checks_len() {
        assert!(PhaseField::new(2, 2, vec![0.0; 3]).is_err());
        assert!(PhaseField::new(2, 2, vec![0.0; 4]).is_ok());
    }
}
