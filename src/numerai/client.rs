use super::types::*;
use crate::errors::{DashboardError, DashboardResult};
use crate::perf::{RoundPerformanceRecord, RoundPerformanceSource};
use reqwest::Client;
use std::time::Duration;

const ROUND_MODEL_PERFORMANCES_QUERY: &str = r#"
query($username: String!) {
  v3UserProfile(modelName: $username) {
    roundModelPerformances {
      roundNumber
      roundOpenTime
      roundResolveTime
      roundResolved
      roundPayoutFactor
      corr20V2
      mmc
      payout
      selectedStakeValue
    }
  }
}
"#;

/// Tournament GraphQL client. Public queries only, no auth.
#[derive(Clone)]
pub struct TournamentClient {
    client: Client,
    endpoint: String,
}

impl TournamentClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn graphql<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> DashboardResult<GraphQlResponse<T>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DashboardError::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<GraphQlResponse<T>>()
            .await
            .map_err(|e| DashboardError::Parse(format!("graphql response: {e}")))
    }

    /// All rounds the tournament reports for `model_name` (already lower-cased).
    pub async fn round_model_performances(
        &self,
        model_name: &str,
    ) -> DashboardResult<Vec<RoundPerformanceRecord>> {
        let resp: GraphQlResponse<UserProfileData> = self
            .graphql(
                ROUND_MODEL_PERFORMANCES_QUERY,
                serde_json::json!({ "username": model_name }),
            )
            .await?;
        decode_performances(resp)
    }
}

#[async_trait::async_trait]
impl RoundPerformanceSource for TournamentClient {
    async fn round_performances(
        &self,
        model_name: &str,
    ) -> DashboardResult<Vec<RoundPerformanceRecord>> {
        self.round_model_performances(model_name)
            .await
            .map_err(|e| match e {
                e @ DashboardError::SourceUnavailable { .. } => e,
                other => DashboardError::source_unavailable(model_name, other),
            })
    }
}

/// Unwrap the GraphQL envelope. Any GraphQL error or a missing profile
/// fails the whole model.
pub fn decode_performances(
    resp: GraphQlResponse<UserProfileData>,
) -> DashboardResult<Vec<RoundPerformanceRecord>> {
    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(DashboardError::Api {
            status: 200,
            body: messages.join("; "),
        });
    }

    let profile = resp
        .data
        .and_then(|d| d.v3_user_profile)
        .ok_or_else(|| DashboardError::Parse("response has no user profile".into()))?;

    let raw = profile.round_model_performances.unwrap_or_default();
    let total = raw.len();
    let records: Vec<RoundPerformanceRecord> =
        raw.into_iter().filter_map(RoundModelPerformance::into_record).collect();

    if records.len() < total {
        tracing::debug!(
            dropped = total - records.len(),
            "rounds without number or open time dropped"
        );
    }
    Ok(records)
}
