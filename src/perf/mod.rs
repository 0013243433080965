pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod dashboard;
pub mod fetch;
pub mod parent;
pub mod payout;
pub mod table;

use crate::errors::DashboardResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One tournament round for one model.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RoundPerformanceRecord {
    #[serde(rename = "roundNumber")]
    pub round_number: i64,
    #[serde(rename = "roundOpenTime")]
    pub round_open_time: DateTime<Utc>,
    #[serde(rename = "roundResolveTime")]
    pub round_resolve_time: Option<DateTime<Utc>>,
    #[serde(rename = "roundResolved")]
    pub round_resolved: bool,
    #[serde(rename = "corr20V2")]
    pub corr20_v2: Option<f64>,
    pub mmc: Option<f64>,
    #[serde(rename = "roundPayoutFactor")]
    pub round_payout_factor: Option<f64>,
    pub payout: Option<f64>,
    #[serde(rename = "selectedStakeValue")]
    pub selected_stake_value: Option<f64>,
    /// Filled in by the cache on fetch.
    pub payout_norm: Option<f64>,
}

/// A model's windowed, normalized round history, shared out of the cache.
pub type RoundTable = Arc<Vec<RoundPerformanceRecord>>;

/// External source of per-round results.
/// Implementations receive the lower-cased model identifier.
#[async_trait::async_trait]
pub trait RoundPerformanceSource: Send + Sync {
    async fn round_performances(
        &self,
        model_name: &str,
    ) -> DashboardResult<Vec<RoundPerformanceRecord>>;
}
