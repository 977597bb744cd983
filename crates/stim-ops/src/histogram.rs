//! Order-statistic histogram matching.
//!
//! [`match_histogram`] rearranges a reference distribution onto the spatial
//! ranking of a source plane: the k-th smallest source pixel receives the
//! k-th smallest reference value. With equal population sizes the output is
//! exactly the reference multiset. Otherwise reference values are linearly
//! interpolated at the matching quantile.

use crate::{OpsError, OpsResult};

/// Remaps `src` so its value distribution follows `reference`.
///
/// Ties in `src` are ranked by pixel index, so the mapping is deterministic.
///
/// # Example
///
/// ```rust
/// use stim_ops::histogram::match_histogram;
///
/// let src = [0.9, -0.3, 0.1];
/// let reference = [0.2, 0.4, 0.6];
/// assert_eq!(match_histogram(&src, &reference).unwrap(), vec![0.6, 0.2, 0.4]);
/// ```
pub fn match_histogram(src: &[f32], reference: &[f32]) -> OpsResult<Vec<f32>> {
    if src.is_empty() {
        return Ok(Vec::new());
    }
    if reference.is_empty() {
        return Err(OpsError::InvalidParameter(
            "histogram reference is empty".into(),
        ));
    }

    // sort_by is stable: equal values keep ascending index order
    let mut order: Vec<usize> = (0..src.len()).collect();
    order.sort_by(|&a, &b| src[a].total_cmp(&src[b]));

    let mut sorted_ref = reference.to_vec();
    sorted_ref.sort_by(f32::total_cmp);

    let mut out = vec![0.0f32; src.len()];
    if src.len() == sorted_ref.len() {
        for (rank, &idx) in order.iter().enumerate() {
            out[idx] = sorted_ref[rank];
        }
        return Ok(out);
    }

    for (rank, &idx) in order.iter().enumerate() {
        out[idx] = quantile(&sorted_ref, rank, src.len());
    }
    Ok(out)
}

/// Value of `sorted` at the quantile of `rank` among `n` ranks.
fn quantile(sorted: &[f32], rank: usize, n: usize) -> f32 {
    let last = sorted.len() - 1;
    if n == 1 || last == 0 {
        return sorted[last / 2];
    }
    let pos = rank as f64 * last as f64 / (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f64;
    (sorted[lo] as f64 * (1.0 - frac) + sorted[hi] as f64 * frac) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(v: &[f32]) -> Vec<f32> {
        let mut v = v.to_vec();
        v.sort_by(f32::total_cmp);
        v
    }

    #[test]
    fn test_exact_multiset_with_duplicates() {
        // Reference with repeated levels must come back with the same repeats
        let reference = [0.0, 0.0, 1.0, 1.0, 0.5, 0.5, 0.5, 0.25];
        let src = [3.0, -1.0, 2.5, 0.0, 9.0, 4.4, -7.0, 1.0];

        let out = match_histogram(&src, &reference).unwrap();
        assert_eq!(sorted(&out), sorted(&reference));
    }

    #[test]
    fn test_preserves_source_ranking() {
        let reference = [0.1, 0.2, 0.3, 0.4, 0.5];
        let src = [5.0, 1.0, 4.0, 2.0, 3.0];
        let out = match_histogram(&src, &reference).unwrap();
        assert_eq!(out, vec![0.5, 0.1, 0.4, 0.2, 0.3]);
    }

    #[test]
    fn test_ties_ranked_by_index() {
        let reference = [0.3, 0.1, 0.2];
        let src = [7.0, 7.0, 7.0];
        let out = match_histogram(&src, &reference).unwrap();
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_identity_on_self() {
        let x = [0.2, 0.8, 0.8, 0.1, 0.5];
        assert_eq!(match_histogram(&x, &x).unwrap(), x.to_vec());
    }

    #[test]
    fn test_unequal_sizes_interpolate() {
        let reference = [0.0, 1.0];
        let src = [10.0, 30.0, 20.0];
        let out = match_histogram(&src, &reference).unwrap();
        assert_eq!(out, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_single_pixel_source() {
        let out = match_histogram(&[4.0], &[0.2, 0.4, 0.6]).unwrap();
        assert_eq!(out, vec![0.4]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(match_histogram(&[], &[0.5]).unwrap().is_empty());
        assert!(match_histogram(&[0.5], &[]).is_err());
    }
}
