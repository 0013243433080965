use super::aggregate::{reduce, AggregateStats};
use super::chart::{performance_chart, PerformanceChart};
use super::fetch::{fetch_all, ModelPerformance};
use super::table::{assemble, column_order, ModelsTable};
use crate::config::FetchPolicy;
use crate::registry::{self, ModelRegistry, RegistryOrigin};
use crate::state::{AppState, PerfCounters};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

/// Whether a view can be trusted as complete.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ViewStatus {
    Ok,
    Degraded { reasons: Vec<String> },
}

impl ViewStatus {
    fn from_reasons(reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            Self::Ok
        } else {
            Self::Degraded { reasons }
        }
    }

    #[inline]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Everything one dashboard render needs: the summary table, each model's
/// rounds and the chart series built from them.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardView {
    pub status: ViewStatus,
    pub registry_origin: Option<RegistryOrigin>,
    pub fetch_policy: FetchPolicy,
    pub table: ModelsTable,
    pub performances: Vec<ModelPerformance>,
    pub chart: PerformanceChart,
    pub elapsed_ms: u64,
    pub built_at: DateTime<Utc>,
}

/// Registry -> fetch -> reduce -> assemble -> chart, in one pass.
///
/// Never fails: registry fallbacks, failing models and aborted batches all
/// end up as a degraded status with the reasons listed.
pub async fn build_dashboard(state: &AppState) -> DashboardView {
    let started = Instant::now();
    let built_at = Utc::now();
    let policy = state.config.fetch_policy;
    let mut reasons = Vec::new();

    let loaded = match registry::load_with_fallback(&state.registry, &state.fallback_registry) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "registry load failed");
            reasons.push(format!("registry unavailable: {e}"));
            return DashboardView {
                status: ViewStatus::from_reasons(reasons),
                registry_origin: None,
                fetch_policy: policy,
                table: ModelsTable::default(),
                performances: Vec::new(),
                chart: performance_chart(&ModelRegistry::default(), &[], built_at),
                elapsed_ms: started.elapsed().as_millis() as u64,
                built_at,
            };
        }
    };

    if let RegistryOrigin::Fallback { reason, .. } = &loaded.origin {
        PerfCounters::bump(&state.counters.registry_fallbacks, 1);
        reasons.push(format!(
            "models table unavailable, showing synthetic models: {reason}"
        ));
    }

    let mut registry = loaded.registry;
    if state.config.include_benchmarks {
        registry = registry.with_benchmark_models();
    }

    let outcome = fetch_all(&registry.models, &state.cache, state.source.as_ref()).await;
    PerfCounters::bump(&state.counters.models_fetched, outcome.results.len() as u64);
    PerfCounters::bump(
        &state.counters.model_fetch_failures,
        outcome.failure_count() as u64,
    );

    let (performances, failures) = match policy {
        FetchPolicy::Abort => match outcome.into_strict() {
            Ok(performances) => (performances, HashMap::new()),
            Err(e) => {
                PerfCounters::bump(&state.counters.aborted_batches, 1);
                tracing::error!(error = %e, "performance batch aborted");
                reasons.push(format!("performance fetch aborted: {e}"));
                let table = ModelsTable {
                    columns: column_order(&registry),
                    rows: Vec::new(),
                };
                PerfCounters::bump(&state.counters.dashboards_built, 1);
                return DashboardView {
                    status: ViewStatus::from_reasons(reasons),
                    registry_origin: Some(loaded.origin),
                    fetch_policy: policy,
                    table,
                    performances: Vec::new(),
                    chart: performance_chart(&registry, &[], built_at),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    built_at,
                };
            }
        },
        FetchPolicy::Isolate => outcome.partition(),
    };

    if !failures.is_empty() {
        let mut failed: Vec<&str> = failures.keys().map(String::as_str).collect();
        failed.sort_unstable();
        reasons.push(format!(
            "no performance data for {} model(s): {}",
            failed.len(),
            failed.join(", ")
        ));
    }

    let aggregates: HashMap<String, AggregateStats> = performances
        .iter()
        .map(|p| (p.model.clone(), reduce(&p.rounds)))
        .collect();

    let mut table = assemble(&registry, &aggregates);
    table.annotate_failures(&failures);
    let chart = performance_chart(&registry, &performances, built_at);

    PerfCounters::bump(&state.counters.dashboards_built, 1);
    let status = ViewStatus::from_reasons(reasons);
    tracing::info!(
        models = table.rows.len(),
        degraded = status.is_degraded(),
        "dashboard built"
    );

    DashboardView {
        status,
        registry_origin: Some(loaded.origin),
        fetch_policy: policy,
        table,
        performances,
        chart,
        elapsed_ms: started.elapsed().as_millis() as u64,
        built_at,
    }
}
