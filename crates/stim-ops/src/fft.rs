//! 2-D discrete Fourier transforms over single-channel planes.
//!
//! Planes are row-major `width * height` buffers. Transforms run a row pass
//! followed by a column pass and accept any size, not just powers of two.
//! Work is done in `f64`; inputs and outputs at the pixel level stay `f32`.

use crate::error::check_len;
use crate::OpsResult;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Forward and inverse plans for one `width x height` plane size.
///
/// Planning is the expensive part of a transform; callers that transform
/// several planes of the same size build one plan and reuse it.
pub struct Fft2Plan {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2Plan {
    /// Plans transforms for `width x height` planes.
    pub fn new(width: usize, height: usize) -> OpsResult<Self> {
        check_len(width * height, width, height, 1)?;
        let mut planner = FftPlanner::new();
        Ok(Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            col_forward: planner.plan_fft_forward(height),
            row_inverse: planner.plan_fft_inverse(width),
            col_inverse: planner.plan_fft_inverse(height),
        })
    }

    /// Forward 2-D DFT of a real plane.
    pub fn forward(&self, src: &[f32]) -> OpsResult<Vec<Complex<f64>>> {
        check_len(src.len(), self.width, self.height, 1)?;
        let mut buf: Vec<Complex<f64>> = src.iter().map(|&v| Complex::new(v as f64, 0.0)).collect();
        self.process(&mut buf, &*self.row_forward, &*self.col_forward);
        Ok(buf)
    }

    /// Inverse 2-D DFT in place, normalised by `1 / (width * height)`.
    pub fn inverse(&self, spectrum: &mut [Complex<f64>]) -> OpsResult<()> {
        check_len(spectrum.len(), self.width, self.height, 1)?;
        self.process(spectrum, &*self.row_inverse, &*self.col_inverse);

        let scale = 1.0 / (self.width * self.height) as f64;
        for v in spectrum.iter_mut() {
            *v *= scale;
        }
        Ok(())
    }

    fn process(&self, buf: &mut [Complex<f64>], row_fft: &dyn Fft<f64>, col_fft: &dyn Fft<f64>) {
        let (width, height) = (self.width, self.height);
        for row in buf.chunks_exact_mut(width) {
            row_fft.process(row);
        }

        let mut col_buf = vec![Complex::new(0.0, 0.0); height];
        for x in 0..width {
            for y in 0..height {
                col_buf[y] = buf[y * width + x];
            }
            col_fft.process(&mut col_buf);
            for y in 0..height {
                buf[y * width + x] = col_buf[y];
            }
        }
    }
}

/// Forward 2-D DFT of a real plane.
pub fn fft2(src: &[f32], width: usize, height: usize) -> OpsResult<Vec<Complex<f64>>> {
    check_len(src.len(), width, height, 1)?;
    Fft2Plan::new(width, height)?.forward(src)
}

/// Inverse 2-D DFT in place, normalised by `1 / (width * height)`.
pub fn ifft2(spectrum: &mut [Complex<f64>], width: usize, height: usize) -> OpsResult<()> {
    check_len(spectrum.len(), width, height, 1)?;
    Fft2Plan::new(width, height)?.inverse(spectrum)
}

/// Magnitude of every bin.
pub fn magnitude(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum.iter().map(|c| c.norm()).collect()
}

/// Phase angle of every bin, in (-pi, pi].
pub fn phase(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum.iter().map(|c| c.arg()).collect()
}

/// Index of the bin holding the complex conjugate of bin `index` for a real plane.
///
/// Frequency `(kx, ky)` pairs with `(-kx mod width, -ky mod height)`. Bins that
/// map to themselves (DC and the Nyquist rows/columns of even sizes) must stay
/// real for the inverse transform to be real.
pub fn conjugate_index(index: usize, width: usize, height: usize) -> usize {
    let x = index % width;
    let y = index / width;
    let mx = (width - x) % width;
    let my = (height - y) % height;
    my * width + mx
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_roundtrip_odd_size() {
        let w = 5;
        let h = 3;
        let src: Vec<f32> = (0..w * h).map(|i| (i as f32 * 0.37).sin()).collect();

        let mut spec = fft2(&src, w, h).unwrap();
        ifft2(&mut spec, w, h).unwrap();

        for (a, b) in src.iter().zip(spec.iter()) {
            assert_abs_diff_eq!(*a as f64, b.re, epsilon = 1e-9);
            assert_abs_diff_eq!(0.0, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dc_is_sum() {
        let src = vec![0.25f32; 4 * 4];
        let spec = fft2(&src, 4, 4).unwrap();
        assert_abs_diff_eq!(spec[0].re, 4.0, epsilon = 1e-12);
        for c in &spec[1..] {
            assert_abs_diff_eq!(c.norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_real_input_is_hermitian() {
        let w = 6;
        let h = 4;
        let src: Vec<f32> = (0..w * h).map(|i| ((i * 7) % 11) as f32 / 10.0).collect();
        let spec = fft2(&src, w, h).unwrap();

        for i in 0..w * h {
            let j = conjugate_index(i, w, h);
            assert_abs_diff_eq!(spec[i].re, spec[j].re, epsilon = 1e-9);
            assert_abs_diff_eq!(spec[i].im, -spec[j].im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_conjugate_index_self_pairs() {
        // 4x4: DC, (2,0), (0,2), (2,2) are their own conjugates
        let selfs: Vec<usize> = (0..16).filter(|&i| conjugate_index(i, 4, 4) == i).collect();
        assert_eq!(selfs, vec![0, 2, 8, 10]);
        // Conjugation is an involution
        for i in 0..15 {
            assert_eq!(conjugate_index(conjugate_index(i, 5, 3), 5, 3), i);
        }
    }

    #[test]
    fn test_plan_reused_across_planes() {
        let w = 6;
        let h = 5;
        let plan = Fft2Plan::new(w, h).unwrap();

        for k in 0..3 {
            let src: Vec<f32> = (0..w * h).map(|i| ((i * (k + 3)) % 7) as f32 / 6.0).collect();
            let mut spec = plan.forward(&src).unwrap();
            assert_eq!(spec, fft2(&src, w, h).unwrap());

            plan.inverse(&mut spec).unwrap();
            for (a, b) in src.iter().zip(spec.iter()) {
                assert_abs_diff_eq!(*a as f64, b.re, epsilon = 1e-9);
            }
        }
        assert!(plan.forward(&[0.0; 4]).is_err());
        assert!(Fft2Plan::new(0, 3).is_err());
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(fft2(&[0.0; 5], 2, 2).is_err());
        assert!(fft2(&[], 0, 0).is_err());
    }
}
