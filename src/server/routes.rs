use crate::perf::dashboard::{build_dashboard, DashboardView};
use crate::perf::fetch::ModelPerformance;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct PerformancesQuery {
    pub model: Option<String>,
}

/// GET /api/dashboard -- full render: table, rounds and chart series
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(build_dashboard(&state).await)
}

/// GET /api/models -- summary table with its status label
pub async fn get_models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let view = build_dashboard(&state).await;
    Json(serde_json::json!({
        "status": view.status,
        "registry_origin": view.registry_origin,
        "table": view.table,
        "built_at": view.built_at,
    }))
}

/// GET /api/performances -- per-model round records, optionally one model
pub async fn get_performances(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PerformancesQuery>,
) -> Json<serde_json::Value> {
    let view = build_dashboard(&state).await;
    let performances: Vec<ModelPerformance> = match params.model.as_deref() {
        Some(name) => view
            .performances
            .into_iter()
            .filter(|p| p.model.eq_ignore_ascii_case(name))
            .collect(),
        None => view.performances,
    };
    Json(serde_json::json!({
        "status": view.status,
        "performances": performances,
    }))
}

/// GET /api/chart -- chart-ready series
pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let view = build_dashboard(&state).await;
    Json(serde_json::json!({
        "status": view.status,
        "chart": view.chart,
    }))
}

/// GET /api/counters -- performance counters and cache stats (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "dashboards_built": state.counters.dashboards_built.load(Relaxed),
        "models_fetched": state.counters.models_fetched.load(Relaxed),
        "model_fetch_failures": state.counters.model_fetch_failures.load(Relaxed),
        "aborted_batches": state.counters.aborted_batches.load(Relaxed),
        "registry_fallbacks": state.counters.registry_fallbacks.load(Relaxed),
        "cache": state.cache.stats(),
        "cache_ttl_secs": state.cache.ttl().as_secs(),
    }))
}

/// GET /api/health
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use crate::config::FetchPolicy;
    use crate::perf::dashboard::tests::test_config;
    use crate::perf::testing::{round, utc, StaticSource};
    use crate::perf::RoundPerformanceSource;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(source: StaticSource) -> axum::Router {
        let source: Arc<dyn RoundPerformanceSource> = Arc::new(source);
        crate::server::router(AppState::new(test_config(None, FetchPolicy::Isolate), source))
    }

    async fn get_json(app: axum::Router, uri: &str) -> serde_json::Value {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_models_route() {
        let source = StaticSource::default().with(
            "rpica_1",
            vec![round(1, utc(2024, 3, 2), true, Some(0.02), Some(0.01), 1.0)],
        );
        let json = get_json(app(source), "/api/models").await;

        assert_eq!(json["status"]["state"], "ok");
        assert_eq!(json["registry_origin"]["kind"], "synthetic");
        assert_eq!(json["table"]["columns"][0], "n_res");
        assert_eq!(json["table"]["rows"][0]["model"], "RPICA_1");
        assert_eq!(json["table"]["rows"][0]["cells"][0], 1);
    }

    #[tokio::test]
    async fn test_performances_filter() {
        let source = StaticSource::default().with(
            "rpica_2",
            vec![round(7, utc(2024, 3, 5), false, Some(0.01), Some(0.0), 1.0)],
        );
        let json = get_json(app(source), "/api/performances?model=rpica_2").await;

        let perfs = json["performances"].as_array().unwrap();
        assert_eq!(perfs.len(), 1);
        assert_eq!(perfs[0]["model"], "RPICA_2");
        assert_eq!(perfs[0]["rounds"][0]["roundNumber"], 7);
        assert_eq!(perfs[0]["rounds"][0]["corr20V2"], 0.01);
    }

    #[tokio::test]
    async fn test_degraded_label_on_failure() {
        let source = StaticSource::default().failing("rpica_3");
        let json = get_json(app(source), "/api/chart").await;

        assert_eq!(json["status"]["state"], "degraded");
        assert_eq!(json["chart"]["series"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health_route() {
        let json = get_json(app(StaticSource::default()), "/api/health").await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let resp = app(StaticSource::default())
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
