pub mod file;
pub mod synthetic;

use crate::errors::{DashboardError, DashboardResult};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::PathBuf;
use synthetic::SyntheticRegistry;

/// Reference models appended on request so live models can be compared
/// against them. Their start is pinned to the earliest registry start.
pub const BENCHMARK_MODELS: [&str; 6] = [
    "v4_lgbm_tyler20",
    "v42_teager_ensemble",
    "v4_lgbm_victor20",
    "v4_lgbm_ralph20",
    "v43_lgbm_teager60",
    "v43_lgbm_teager20",
];

// ── Validation-period statistics ──

/// The precomputed validation statistics a registry may carry per model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationField {
    Sharpe,
    MaxDrawdown,
    CorrMean,
    CorrStd,
    MmcMean,
    MmcStd,
}

impl ValidationField {
    pub const ALL: [ValidationField; 6] = [
        Self::Sharpe,
        Self::MaxDrawdown,
        Self::CorrMean,
        Self::CorrStd,
        Self::MmcMean,
        Self::MmcStd,
    ];

    #[inline]
    pub fn column(&self) -> &'static str {
        match self {
            Self::Sharpe => "val_sharpe",
            Self::MaxDrawdown => "val_max_drawdown",
            Self::CorrMean => "val_corr_mean",
            Self::CorrStd => "val_corr_std",
            Self::MmcMean => "val_mmc_mean",
            Self::MmcStd => "val_mmc_std",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ValidationStats {
    pub sharpe: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub corr_mean: Option<f64>,
    pub corr_std: Option<f64>,
    pub mmc_mean: Option<f64>,
    pub mmc_std: Option<f64>,
}

impl ValidationStats {
    #[inline]
    pub fn get(&self, field: ValidationField) -> Option<f64> {
        match field {
            ValidationField::Sharpe => self.sharpe,
            ValidationField::MaxDrawdown => self.max_drawdown,
            ValidationField::CorrMean => self.corr_mean,
            ValidationField::CorrStd => self.corr_std,
            ValidationField::MmcMean => self.mmc_mean,
            ValidationField::MmcStd => self.mmc_std,
        }
    }

    #[inline]
    pub fn set(&mut self, field: ValidationField, value: Option<f64>) {
        let slot = match field {
            ValidationField::Sharpe => &mut self.sharpe,
            ValidationField::MaxDrawdown => &mut self.max_drawdown,
            ValidationField::CorrMean => &mut self.corr_mean,
            ValidationField::CorrStd => &mut self.corr_std,
            ValidationField::MmcMean => &mut self.mmc_mean,
            ValidationField::MmcStd => &mut self.mmc_std,
        };
        *slot = value;
    }
}

// ── Registry rows ──

/// One registry row.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Model {
    pub name: String,
    /// Naive UTC.
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub parent: Option<String>,
    pub validation: ValidationStats,
    /// Registry columns without a dedicated field, as raw text.
    pub extra: HashMap<String, String>,
}

impl Model {
    pub fn new(name: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            start,
            end: None,
            parent: None,
            validation: ValidationStats::default(),
            extra: HashMap::new(),
        }
    }
}

/// Models in registry order plus the registry's column names (index excluded)
/// in their original order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ModelRegistry {
    pub columns: Vec<String>,
    pub models: Vec<Model>,
}

impl ModelRegistry {
    #[inline]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Index of `name` in registry order.
    #[inline]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name == name)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.position(name).map(|i| &self.models[i])
    }

    /// Append the benchmark models, all starting at the earliest registry start.
    /// A benchmark already in the registry only has its start moved.
    pub fn with_benchmark_models(mut self) -> Self {
        let Some(earliest) = self.models.iter().map(|m| m.start).min() else {
            return self;
        };

        for name in BENCHMARK_MODELS {
            match self.models.iter_mut().find(|m| m.name == name) {
                Some(existing) => existing.start = earliest,
                None => self.models.push(Model::new(name, earliest)),
            }
        }
        self
    }
}

// ── Providers ──

/// Where the registry comes from. Chosen by configuration.
#[derive(Debug, Clone)]
pub enum RegistryProvider {
    File(PathBuf),
    Synthetic(SyntheticRegistry),
}

impl RegistryProvider {
    pub fn load(&self) -> DashboardResult<ModelRegistry> {
        match self {
            Self::File(path) => file::load_models_table(path),
            Self::Synthetic(synthetic) => Ok(synthetic.build()),
        }
    }
}

/// Which provider actually produced the registry of a render.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryOrigin {
    File { path: String },
    Synthetic,
    Fallback { path: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedRegistry {
    pub registry: ModelRegistry,
    pub origin: RegistryOrigin,
}

/// Load the configured registry. An unavailable file degrades to the
/// synthetic registry; any other error propagates.
pub fn load_with_fallback(
    provider: &RegistryProvider,
    fallback: &SyntheticRegistry,
) -> DashboardResult<LoadedRegistry> {
    match provider.load() {
        Ok(registry) => {
            let origin = match provider {
                RegistryProvider::File(path) => RegistryOrigin::File {
                    path: path.display().to_string(),
                },
                RegistryProvider::Synthetic(_) => {
                    tracing::info!("working with public data only: no local models table");
                    RegistryOrigin::Synthetic
                }
            };
            Ok(LoadedRegistry { registry, origin })
        }
        Err(DashboardError::RegistryUnavailable(reason)) => {
            let path = match provider {
                RegistryProvider::File(path) => path.display().to_string(),
                RegistryProvider::Synthetic(_) => String::new(),
            };
            tracing::warn!(
                path = %path,
                reason = %reason,
                "models table unavailable, using synthetic registry"
            );
            Ok(LoadedRegistry {
                registry: fallback.build(),
                origin: RegistryOrigin::Fallback { path, reason },
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_validation_field_columns_round_trip() {
        for field in ValidationField::ALL {
            assert_eq!(ValidationField::from_column(field.column()), Some(field));
        }
        assert_eq!(ValidationField::from_column("start"), None);
    }

    #[test]
    fn test_benchmarks_use_earliest_start() {
        let registry = ModelRegistry {
            columns: vec!["start".into()],
            models: vec![
                Model::new("late", ts(2024, 6, 1)),
                Model::new("early", ts(2024, 1, 15)),
                Model::new("v4_lgbm_tyler20", ts(2024, 9, 1)),
            ],
        }
        .with_benchmark_models();

        assert_eq!(registry.models.len(), 3 + BENCHMARK_MODELS.len() - 1);
        for name in BENCHMARK_MODELS {
            assert_eq!(registry.get(name).unwrap().start, ts(2024, 1, 15), "{name}");
        }
        assert_eq!(registry.get("late").unwrap().start, ts(2024, 6, 1));
    }

    #[test]
    fn test_benchmarks_on_empty_registry_is_noop() {
        let registry = ModelRegistry::default().with_benchmark_models();
        assert!(registry.models.is_empty());
    }

    #[test]
    fn test_missing_file_falls_back_to_synthetic() {
        let provider = RegistryProvider::File(PathBuf::from("/nonexistent/models_table.csv"));
        let fallback = SyntheticRegistry::new(3, "RPICA_", ts(2024, 3, 1));
        let loaded = load_with_fallback(&provider, &fallback).unwrap();

        assert_eq!(loaded.registry.models.len(), 3);
        assert!(matches!(loaded.origin, RegistryOrigin::Fallback { .. }));
    }

    #[test]
    fn test_synthetic_provider_origin() {
        let synthetic = SyntheticRegistry::new(2, "RPICA_", ts(2024, 3, 1));
        let provider = RegistryProvider::Synthetic(synthetic.clone());
        let loaded = load_with_fallback(&provider, &synthetic).unwrap();
        assert_eq!(loaded.origin, RegistryOrigin::Synthetic);
    }
}
