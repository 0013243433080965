//! Normalized payout.
//!
//! payout_norm = clip(payout_factor * (corr20V2 * 0.5 + mmc * 2.0), -0.5, 0.5)
//!
//! Same shape as the staking payout but without the stake multiplier, so
//! models with different stakes are comparable. Pure function.

const CORR_WEIGHT: f64 = 0.5;
const MMC_WEIGHT: f64 = 2.0;
const PAYOUT_CLIP: f64 = 0.5;

/// Scalar form. NaN in, NaN out.
#[inline]
pub fn normalized_payout(corr20_v2: f64, mmc: f64, round_payout_factor: f64) -> f64 {
    let raw = round_payout_factor * (corr20_v2 * CORR_WEIGHT + mmc * MMC_WEIGHT);
    // f64::clamp keeps NaN as NaN
    raw.clamp(-PAYOUT_CLIP, PAYOUT_CLIP)
}

/// Missing-aware form: any missing or NaN input gives a missing output.
#[inline]
pub fn normalize(
    corr20_v2: Option<f64>,
    mmc: Option<f64>,
    round_payout_factor: Option<f64>,
) -> Option<f64> {
    let v = normalized_payout(corr20_v2?, mmc?, round_payout_factor?);
    (!v.is_nan()).then_some(v)
}

/// Element-wise over equal-length columns. Extra elements of longer
/// columns are ignored.
pub fn normalize_all(
    corr20_v2: &[Option<f64>],
    mmc: &[Option<f64>],
    round_payout_factor: &[Option<f64>],
) -> Vec<Option<f64>> {
    corr20_v2
        .iter()
        .zip(mmc)
        .zip(round_payout_factor)
        .map(|((&c, &m), &f)| normalize(c, m, f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_point_is_zero_for_any_factor() {
        for factor in [0.0, 0.5, 1.0, 3.7, -2.0] {
            assert_eq!(normalized_payout(0.0, 0.0, factor), 0.0);
        }
    }

    #[test]
    fn test_clip_boundaries() {
        // raw = 1.0 * (1.2 * 0.5) = 0.6
        assert_eq!(normalized_payout(1.2, 0.0, 1.0), 0.5);
        // raw = 1.0 * (-0.3 * 2.0) = -0.6
        assert_eq!(normalized_payout(0.0, -0.3, 1.0), -0.5);
    }

    #[test]
    fn test_output_in_range() {
        for c in [-1.0, -0.1, 0.0, 0.03, 0.4, 1.0] {
            for m in [-0.5, -0.01, 0.0, 0.02, 0.3] {
                for f in [0.0, 0.25, 1.0, 2.0] {
                    let p = normalized_payout(c, m, f);
                    assert!((-0.5..=0.5).contains(&p), "c={c} m={m} f={f} -> {p}");
                }
            }
        }
    }

    #[test]
    fn test_reference_value() {
        let p = normalized_payout(0.02, 0.01, 1.0);
        assert!((p - 0.03).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_nan_and_missing_propagate() {
        assert!(normalized_payout(f64::NAN, 0.01, 1.0).is_nan());
        assert_eq!(normalize(Some(f64::NAN), Some(0.01), Some(1.0)), None);
        assert_eq!(normalize(Some(0.02), None, Some(1.0)), None);
        assert_eq!(normalize(Some(0.02), Some(0.01), None), None);
    }

    #[test]
    fn test_element_wise() {
        let out = normalize_all(
            &[Some(0.02), None, Some(2.0)],
            &[Some(0.01), Some(0.01), Some(0.0)],
            &[Some(1.0), Some(1.0), Some(1.0)],
        );
        assert_eq!(out.len(), 3);
        assert!((out[0].unwrap() - 0.03).abs() < 1e-12);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(0.5));
    }
}
