use crate::errors::{DashboardError, DashboardResult};
use crate::perf::cache::DEFAULT_TTL;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use std::str::FromStr;

/// How a failing model affects the rest of a fetch batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPolicy {
    /// First failure fails the whole batch.
    Abort,
    /// Failing models are reported next to the successful ones.
    Isolate,
}

impl FromStr for FetchPolicy {
    type Err = DashboardError;

    fn from_str(s: &str) -> DashboardResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "isolate" => Ok(Self::Isolate),
            other => Err(DashboardError::Config(format!(
                "FETCH_POLICY: expected 'abort' or 'isolate', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub models_table_path: Option<PathBuf>,
    pub synthetic_model_count: usize,
    pub synthetic_model_prefix: String,
    pub synthetic_start: NaiveDateTime,
    pub include_benchmarks: bool,
    pub cache_ttl_secs: u64,
    pub fetch_policy: FetchPolicy,
    pub http_timeout_secs: u64,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> DashboardResult<Self> {
        dotenvy::dotenv().ok();

        let synthetic_model_count = env_var_or("SYNTHETIC_MODEL_COUNT", "10")
            .parse::<usize>()
            .map_err(|e| DashboardError::Config(format!("SYNTHETIC_MODEL_COUNT: {e}")))?;

        let synthetic_start = NaiveDate::parse_from_str(
            &env_var_or("SYNTHETIC_START", "2024-03-01"),
            "%Y-%m-%d",
        )
        .map_err(|e| DashboardError::Config(format!("SYNTHETIC_START: {e}")))?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DashboardError::Config("SYNTHETIC_START: invalid midnight".into()))?;

        let include_benchmarks = env_var_or("INCLUDE_BENCHMARKS", "false")
            .parse::<bool>()
            .map_err(|e| DashboardError::Config(format!("INCLUDE_BENCHMARKS: {e}")))?;

        let cache_ttl_secs = env_var_or("CACHE_TTL_SECS", &DEFAULT_TTL.as_secs().to_string())
            .parse::<u64>()
            .map_err(|e| DashboardError::Config(format!("CACHE_TTL_SECS: {e}")))?;

        let fetch_policy = env_var_or("FETCH_POLICY", "isolate").parse::<FetchPolicy>()?;

        let http_timeout_secs = env_var_or("HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| DashboardError::Config(format!("HTTP_TIMEOUT_SECS: {e}")))?;

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| DashboardError::Config(format!("SERVER_PORT: {e}")))?;

        Ok(Self {
            api_url: env_var_or("NUMERAI_API_URL", "https://api-tournament.numer.ai"),
            models_table_path: std::env::var("MODELS_TABLE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            synthetic_model_count,
            synthetic_model_prefix: env_var_or("SYNTHETIC_MODEL_PREFIX", "RPICA_"),
            synthetic_start,
            include_benchmarks,
            cache_ttl_secs,
            fetch_policy,
            http_timeout_secs,
            server_port,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_policy_parsing() {
        assert_eq!("abort".parse::<FetchPolicy>().unwrap(), FetchPolicy::Abort);
        assert_eq!(" Isolate ".parse::<FetchPolicy>().unwrap(), FetchPolicy::Isolate);
        assert!("retry".parse::<FetchPolicy>().is_err());
    }

    #[test]
    fn test_ttl_default_matches_cache() {
        std::env::remove_var("CACHE_TTL_SECS");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.cache_ttl_secs, DEFAULT_TTL.as_secs());
    }
}
