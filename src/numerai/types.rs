use crate::perf::RoundPerformanceRecord;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ── GraphQL envelope ──

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

// ── Round model performances ──

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfileData {
    #[serde(rename = "v3UserProfile")]
    pub v3_user_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "roundModelPerformances")]
    pub round_model_performances: Option<Vec<RoundModelPerformance>>,
}

/// The API sends some decimals as strings (payouts, stakes, factors).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        };
        v.filter(|x| !x.is_nan())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoundModelPerformance {
    #[serde(rename = "roundNumber")]
    pub round_number: Option<i64>,
    #[serde(rename = "roundOpenTime")]
    pub round_open_time: Option<String>,
    #[serde(rename = "roundResolveTime")]
    pub round_resolve_time: Option<String>,
    #[serde(rename = "roundResolved")]
    pub round_resolved: Option<bool>,
    #[serde(rename = "corr20V2")]
    pub corr20_v2: Option<Numeric>,
    pub mmc: Option<Numeric>,
    #[serde(rename = "roundPayoutFactor")]
    pub round_payout_factor: Option<Numeric>,
    pub payout: Option<Numeric>,
    #[serde(rename = "selectedStakeValue")]
    pub selected_stake_value: Option<Numeric>,
}

impl RoundModelPerformance {
    /// Rounds without a number or a parseable open time cannot be windowed
    /// and are dropped.
    pub fn into_record(self) -> Option<RoundPerformanceRecord> {
        let round_number = self.round_number?;
        let round_open_time = parse_api_time(self.round_open_time.as_deref()?)?;

        Some(RoundPerformanceRecord {
            round_number,
            round_open_time,
            round_resolve_time: self.round_resolve_time.as_deref().and_then(parse_api_time),
            round_resolved: self.round_resolved.unwrap_or(false),
            corr20_v2: self.corr20_v2.as_ref().and_then(Numeric::as_f64),
            mmc: self.mmc.as_ref().and_then(Numeric::as_f64),
            round_payout_factor: self.round_payout_factor.as_ref().and_then(Numeric::as_f64),
            payout: self.payout.as_ref().and_then(Numeric::as_f64),
            selected_stake_value: self.selected_stake_value.as_ref().and_then(Numeric::as_f64),
            payout_norm: None,
        })
    }
}

pub fn parse_api_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accepts_numbers_and_strings() {
        let n: Numeric = serde_json::from_str("0.25").unwrap();
        let s: Numeric = serde_json::from_str("\"1.5\"").unwrap();
        let junk: Numeric = serde_json::from_str("\"n/a\"").unwrap();
        assert_eq!(n.as_f64(), Some(0.25));
        assert_eq!(s.as_f64(), Some(1.5));
        assert_eq!(junk.as_f64(), None);
    }

    #[test]
    fn test_round_without_open_time_is_dropped() {
        let raw: RoundModelPerformance =
            serde_json::from_str(r#"{"roundNumber": 600, "roundOpenTime": null}"#).unwrap();
        assert!(raw.into_record().is_none());
    }

    #[test]
    fn test_api_time_formats() {
        assert!(parse_api_time("2024-01-02T00:00:00Z").is_some());
        assert!(parse_api_time("2024-01-02T00:00:00+00:00").is_some());
        assert!(parse_api_time("2024-01-02T00:00:00").is_some());
        assert!(parse_api_time("02/01/2024").is_none());
    }
}
