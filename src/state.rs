use crate::config::AppConfig;
use crate::perf::cache::RoundPerformanceCache;
use crate::perf::RoundPerformanceSource;
use crate::registry::synthetic::SyntheticRegistry;
use crate::registry::RegistryProvider;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub dashboards_built: AtomicU64,
    pub models_fetched: AtomicU64,
    pub model_fetch_failures: AtomicU64,
    pub aborted_batches: AtomicU64,
    pub registry_fallbacks: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            dashboards_built: AtomicU64::new(0),
            models_fetched: AtomicU64::new(0),
            model_fetch_failures: AtomicU64::new(0),
            aborted_batches: AtomicU64::new(0),
            registry_fallbacks: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,

    /// Lives for the whole process; entries only expire.
    pub cache: RoundPerformanceCache,

    pub source: Arc<dyn RoundPerformanceSource>,

    pub registry: RegistryProvider,
    pub fallback_registry: SyntheticRegistry,

    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn RoundPerformanceSource>) -> Arc<Self> {
        let fallback_registry = SyntheticRegistry::new(
            config.synthetic_model_count,
            &config.synthetic_model_prefix,
            config.synthetic_start,
        );
        let registry = match &config.models_table_path {
            Some(path) => RegistryProvider::File(path.clone()),
            None => RegistryProvider::Synthetic(fallback_registry.clone()),
        };
        let cache = RoundPerformanceCache::new(Duration::from_secs(config.cache_ttl_secs));

        Arc::new(Self {
            config,
            cache,
            source,
            registry,
            fallback_registry,
            counters: PerfCounters::new(),
        })
    }
}
