use super::cache::RoundPerformanceCache;
use super::{RoundPerformanceSource, RoundTable};
use crate::errors::DashboardResult;
use crate::registry::Model;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One model's round table, as handed to rendering.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelPerformance {
    pub model: String,
    pub rounds: RoundTable,
}

/// Result of one model's fetch.
#[derive(Debug)]
pub struct ModelFetch {
    pub model: String,
    pub result: DashboardResult<RoundTable>,
}

/// Per-model results of a batch, in registry order.
#[derive(Debug)]
pub struct FetchOutcome {
    pub results: Vec<ModelFetch>,
    pub elapsed: Duration,
}

impl FetchOutcome {
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|f| f.result.is_err()).count()
    }

    /// All-or-nothing: the first failing model (registry order) fails the batch.
    pub fn into_strict(self) -> DashboardResult<Vec<ModelPerformance>> {
        self.results
            .into_iter()
            .map(|f| {
                f.result.map(|rounds| ModelPerformance {
                    model: f.model,
                    rounds,
                })
            })
            .collect()
    }

    /// Successful tables plus an error message per failing model.
    pub fn partition(self) -> (Vec<ModelPerformance>, HashMap<String, String>) {
        let mut performances = Vec::with_capacity(self.results.len());
        let mut failures = HashMap::new();

        for fetch in self.results {
            match fetch.result {
                Ok(rounds) => performances.push(ModelPerformance {
                    model: fetch.model,
                    rounds,
                }),
                Err(e) => {
                    failures.insert(fetch.model, e.to_string());
                }
            }
        }
        (performances, failures)
    }
}

/// Fetch every model's rounds through the cache. Models are independent and
/// fetched concurrently; the cache keeps one in-flight call per key.
pub async fn fetch_all(
    models: &[Model],
    cache: &RoundPerformanceCache,
    source: &dyn RoundPerformanceSource,
) -> FetchOutcome {
    let started = Instant::now();

    let results = join_all(models.iter().map(|model| async move {
        let result = cache.get_from(model, source).await;
        if let Err(e) = &result {
            tracing::warn!(model = %model.name, error = %e, "round performance fetch failed");
        }
        ModelFetch {
            model: model.name.clone(),
            result,
        }
    }))
    .await;

    let outcome = FetchOutcome {
        results,
        elapsed: started.elapsed(),
    };

    tracing::info!(
        models = models.len(),
        failed = outcome.failure_count(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "model performances fetched"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::cache::DEFAULT_TTL;
    use crate::perf::testing::{round, utc, StaticSource};

    fn models(names: &[&str]) -> Vec<Model> {
        names
            .iter()
            .map(|n| Model::new(*n, utc(2024, 1, 1).naive_utc()))
            .collect()
    }

    #[tokio::test]
    async fn test_one_table_per_model_in_order() {
        let source = StaticSource::default()
            .with(
                "a",
                vec![round(1, utc(2024, 1, 2), true, Some(0.02), Some(0.01), 1.0)],
            )
            .with("b", vec![]);
        let cache = RoundPerformanceCache::new(DEFAULT_TTL);
        let outcome = fetch_all(&models(&["A", "b"]), &cache, &source).await;

        assert_eq!(outcome.failure_count(), 0);
        let performances = outcome.into_strict().unwrap();
        assert_eq!(performances.len(), 2);
        assert_eq!(performances[0].model, "A");
        assert_eq!(performances[0].rounds.len(), 1);
        assert!(performances[1].rounds.is_empty());
    }

    #[tokio::test]
    async fn test_strict_aborts_on_any_failure() {
        let source = StaticSource::default().failing("b");
        let cache = RoundPerformanceCache::new(DEFAULT_TTL);
        let outcome = fetch_all(&models(&["a", "b", "c"]), &cache, &source).await;

        assert_eq!(outcome.failure_count(), 1);
        assert!(outcome.into_strict().is_err());
    }

    #[tokio::test]
    async fn test_partition_isolates_failures() {
        let source = StaticSource::default().failing("b");
        let cache = RoundPerformanceCache::new(DEFAULT_TTL);
        let outcome = fetch_all(&models(&["a", "b", "c"]), &cache, &source).await;
        let (performances, failures) = outcome.partition();

        let names: Vec<&str> = performances.iter().map(|p| p.model.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(failures["b"].contains("unknown model"));
    }

    #[tokio::test]
    async fn test_second_batch_served_from_cache() {
        let source = StaticSource::default();
        let cache = RoundPerformanceCache::new(DEFAULT_TTL);
        let registry = models(&["a", "b"]);

        fetch_all(&registry, &cache, &source).await;
        fetch_all(&registry, &cache, &source).await;
        assert_eq!(source.calls(), 2);
    }
}
