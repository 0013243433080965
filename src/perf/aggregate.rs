use super::payout;
use super::RoundPerformanceRecord;
use statrs::statistics::Statistics;

/// Mean and sample standard deviation (ddof = 1) of one column.
/// Missing when undefined: no values for the mean, fewer than two for the std.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct Moments {
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

impl Moments {
    /// Missing values are skipped.
    pub fn of(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let present: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();

        Self {
            mean: finite(present.iter().mean()),
            std: finite(present.iter().std_dev()),
        }
    }
}

/// statrs reports undefined statistics as NaN.
#[inline]
fn finite(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

/// Per-model summary of its round history.
///
/// `res_*` covers resolved rounds with a score. `unres_*` covers every round
/// with a score, resolved or not, so the two buckets overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct AggregateStats {
    pub n_res: usize,
    pub res_payout_norm: Moments,
    pub unres_payout_norm: Moments,
    pub res_corr: Moments,
    pub res_mmc: Moments,
    pub unres_corr: Moments,
    pub unres_mmc: Moments,
}

#[derive(Debug, Clone, Copy, Default)]
struct BucketStats {
    rows: usize,
    payout_norm: Moments,
    corr: Moments,
    mmc: Moments,
}

impl AggregateStats {
    /// Column names and values in output order.
    pub fn columns(&self) -> [(&'static str, Option<f64>); 12] {
        [
            ("res_payout_norm_mean", self.res_payout_norm.mean),
            ("res_payout_norm_std", self.res_payout_norm.std),
            ("unres_payout_norm_mean", self.unres_payout_norm.mean),
            ("unres_payout_norm_std", self.unres_payout_norm.std),
            ("res_corr_mean", self.res_corr.mean),
            ("res_corr_std", self.res_corr.std),
            ("res_mmc_mean", self.res_mmc.mean),
            ("res_mmc_std", self.res_mmc.std),
            ("unres_corr_mean", self.unres_corr.mean),
            ("unres_corr_std", self.unres_corr.std),
            ("unres_mmc_mean", self.unres_mmc.mean),
            ("unres_mmc_std", self.unres_mmc.std),
        ]
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .and_then(|(_, v)| v)
    }
}

#[inline]
fn is_scored(r: &RoundPerformanceRecord) -> bool {
    r.corr20_v2.is_some_and(|c| !c.is_nan())
}

fn bucket<'a>(rows: impl Iterator<Item = &'a RoundPerformanceRecord> + Clone) -> BucketStats {
    let corr: Vec<Option<f64>> = rows.clone().map(|r| r.corr20_v2).collect();
    let mmc: Vec<Option<f64>> = rows.clone().map(|r| r.mmc).collect();
    let factor: Vec<Option<f64>> = rows.map(|r| r.round_payout_factor).collect();

    // payout_norm is recomputed from exactly this subset
    let payout_norm = payout::normalize_all(&corr, &mmc, &factor);

    BucketStats {
        rows: corr.len(),
        payout_norm: Moments::of(payout_norm),
        corr: Moments::of(corr),
        mmc: Moments::of(mmc),
    }
}

/// Reduce one model's rounds into its summary statistics.
pub fn reduce(records: &[RoundPerformanceRecord]) -> AggregateStats {
    let resolved = bucket(records.iter().filter(|r| r.round_resolved && is_scored(r)));
    let scored = bucket(records.iter().filter(|r| is_scored(r)));

    AggregateStats {
        n_res: resolved.rows,
        res_payout_norm: resolved.payout_norm,
        unres_payout_norm: scored.payout_norm,
        res_corr: resolved.corr,
        res_mmc: resolved.mmc,
        unres_corr: scored.corr,
        unres_mmc: scored.mmc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::testing::{round, utc};

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_empty_input_is_missing_not_zero() {
        let stats = reduce(&[]);
        assert_eq!(stats.n_res, 0);
        assert_eq!(stats.res_payout_norm, Moments::default());
        assert_eq!(stats.unres_corr.mean, None);
        assert_eq!(stats.unres_mmc.std, None);
    }

    #[test]
    fn test_no_resolved_rounds() {
        let rounds = vec![
            round(1, utc(2024, 1, 2), false, Some(0.02), Some(0.01), 1.0),
            round(2, utc(2024, 1, 3), false, Some(0.04), Some(0.03), 1.0),
        ];
        let stats = reduce(&rounds);

        assert_eq!(stats.n_res, 0);
        assert_eq!(stats.res_payout_norm.mean, None);
        assert_eq!(stats.res_corr.std, None);
        assert!(close(stats.unres_corr.mean, 0.03));
        assert!(stats.unres_corr.std.is_some());
    }

    #[test]
    fn test_single_round_has_mean_but_no_std() {
        let rounds = vec![round(1, utc(2024, 1, 2), true, Some(0.02), Some(0.01), 1.0)];
        let stats = reduce(&rounds);

        assert_eq!(stats.n_res, 1);
        assert!(close(stats.res_payout_norm.mean, 0.03));
        assert_eq!(stats.res_payout_norm.std, None);
    }

    #[test]
    fn test_buckets_overlap() {
        let rounds = vec![
            round(1, utc(2024, 1, 2), true, Some(0.02), Some(0.00), 1.0),
            round(2, utc(2024, 1, 3), true, Some(0.04), Some(0.00), 1.0),
            round(3, utc(2024, 1, 4), false, Some(0.06), Some(0.00), 1.0),
            round(4, utc(2024, 1, 5), false, None, None, 1.0),
            round(5, utc(2024, 1, 6), true, None, Some(0.02), 1.0),
        ];
        let stats = reduce(&rounds);

        assert_eq!(stats.n_res, 2);
        assert!(close(stats.res_corr.mean, 0.03));
        // unresolved bucket includes the two resolved rounds
        assert!(close(stats.unres_corr.mean, 0.04));
        assert!(close(stats.unres_corr.std, 0.02));
        assert!(close(stats.unres_payout_norm.mean, 0.02));
    }

    #[test]
    fn test_sample_std() {
        let rounds = vec![
            round(1, utc(2024, 1, 2), true, Some(0.01), Some(0.0), 1.0),
            round(2, utc(2024, 1, 3), true, Some(0.03), Some(0.0), 1.0),
        ];
        let stats = reduce(&rounds);
        // ddof = 1: sqrt(((0.01-0.02)^2 + (0.03-0.02)^2) / 1)
        assert!(close(stats.res_corr.std, 0.0002_f64.sqrt()));
    }

    #[test]
    fn test_missing_mmc_skipped_per_column() {
        let rounds = vec![
            round(1, utc(2024, 1, 2), true, Some(0.02), Some(0.01), 1.0),
            round(2, utc(2024, 1, 3), true, Some(0.04), None, 1.0),
        ];
        let stats = reduce(&rounds);

        assert_eq!(stats.n_res, 2);
        assert!(close(stats.res_corr.mean, 0.03));
        assert!(close(stats.res_mmc.mean, 0.01));
        // payout_norm is missing for the round without mmc
        assert!(close(stats.res_payout_norm.mean, 0.03));
        assert_eq!(stats.res_payout_norm.std, None);
    }

    #[test]
    fn test_column_lookup() {
        let rounds = vec![round(1, utc(2024, 1, 2), true, Some(0.02), Some(0.01), 1.0)];
        let stats = reduce(&rounds);
        assert!(close(stats.get("res_corr_mean"), 0.02));
        assert_eq!(stats.get("res_corr_std"), None);
        assert_eq!(stats.get("not_a_column"), None);
    }
}
