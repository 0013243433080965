use super::payout;
use super::{RoundPerformanceRecord, RoundPerformanceSource, RoundTable};
use crate::errors::DashboardResult;
use crate::registry::Model;
use chrono::NaiveDateTime;
use portable_atomic::{AtomicU64, Ordering};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

/// Default time-to-live of a cached round table (15 min).
pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// Rounds opened up to this many days before a model's start still count.
const WINDOW_LEAD_DAYS: i64 = 2;

/// A model name alone is not enough: two runs of the same name with
/// different starts must not share history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub model: String,
    pub start: NaiveDateTime,
}

impl CacheKey {
    pub fn for_model(model: &Model) -> Self {
        Self {
            model: model.name.clone(),
            start: model.start,
        }
    }
}

struct CacheEntry {
    table: RoundTable,
    fetched_at: Instant,
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub keys: usize,
}

/// Process-wide TTL cache of round tables.
///
/// Each key owns an async slot; a miss holds the slot while it fetches, so
/// concurrent callers of one key wait for that fetch instead of issuing
/// their own. The key map lock is never held across an await.
/// Entries expire by age only, no capacity bound. Failed fetches are not
/// stored.
pub struct RoundPerformanceCache {
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RoundPerformanceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached table for `model`, calling `fetch` with the lower-cased model
    /// name when the entry is missing or stale.
    pub async fn get<F, Fut>(&self, model: &Model, fetch: F) -> DashboardResult<RoundTable>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = DashboardResult<Vec<RoundPerformanceRecord>>>,
    {
        let key = CacheKey::for_model(model);
        let slot = self.slot(&key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&cached.table));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let raw = fetch(model.name.to_lowercase()).await?;
        let fetched = raw.len();
        let table: RoundTable = Arc::new(prepare_rounds(raw, model.start));

        tracing::debug!(
            model = %model.name,
            fetched = fetched,
            kept = table.len(),
            "round performances cached"
        );

        *entry = Some(CacheEntry {
            table: Arc::clone(&table),
            fetched_at: Instant::now(),
        });
        Ok(table)
    }

    /// `get` backed by a performance source.
    pub async fn get_from(
        &self,
        model: &Model,
        source: &dyn RoundPerformanceSource,
    ) -> DashboardResult<RoundTable> {
        self.get(model, move |name| async move {
            source.round_performances(&name).await
        })
        .await
    }

    pub fn stats(&self) -> CacheStats {
        let keys = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            keys,
        }
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}

/// Window a raw source response to the model's lifetime and attach
/// `payout_norm`. Keeps rounds opened strictly after `start - 2 days`.
pub fn prepare_rounds(
    raw: Vec<RoundPerformanceRecord>,
    model_start: NaiveDateTime,
) -> Vec<RoundPerformanceRecord> {
    let window_open = model_start.and_utc() - chrono::Duration::days(WINDOW_LEAD_DAYS);

    raw.into_iter()
        .filter(|r| r.round_open_time > window_open)
        .map(|mut r| {
            r.payout_norm = payout::normalize(r.corr20_v2, r.mmc, r.round_payout_factor);
            r
        })
        .collect()
}
