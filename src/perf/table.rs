use super::aggregate::AggregateStats;
use super::parent::resolve_validation_stats;
use crate::registry::{Model, ModelRegistry, ValidationField};
use chrono::NaiveDateTime;
use std::collections::HashMap;

const N_RES: &str = "n_res";

/// One cell of the output table. Missing values serialize as null.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Cell {
    Count(Option<usize>),
    Number(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<NaiveDateTime>),
}

#[cfg(test)]
impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => *v,
            Self::Count(v) => v.map(|n| n as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TableRow {
    pub model: String,
    pub cells: Vec<Cell>,
    /// Why this model has no statistics, when its fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The per-model summary table, rows in registry order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ModelsTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ModelsTable {
    /// Attach fetch errors to the affected rows.
    pub fn annotate_failures(&mut self, failures: &HashMap<String, String>) {
        for row in &mut self.rows {
            if let Some(reason) = failures.get(&row.model) {
                row.error = Some(reason.clone());
            }
        }
    }
}

#[cfg(test)]
impl ModelsTable {
    pub fn row(&self, model: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.model == model)
    }

    pub fn value(&self, model: &str, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.row(model)?.cells.get(idx)
    }
}

/// Calculated columns first (aggregates, then validation stats the registry
/// carries), then the remaining registry columns in their original order.
pub fn column_order(registry: &ModelRegistry) -> Vec<String> {
    let mut columns = vec![N_RES.to_string()];
    columns.extend(
        AggregateStats::default()
            .columns()
            .iter()
            .map(|(name, _)| name.to_string()),
    );
    columns.extend(
        ValidationField::ALL
            .iter()
            .map(|f| f.column())
            .filter(|c| registry.has_column(c))
            .map(str::to_string),
    );

    let rest: Vec<String> = registry
        .columns
        .iter()
        .filter(|c| !columns.contains(c))
        .cloned()
        .collect();
    columns.extend(rest);
    columns
}

/// Merge registry rows, parent-resolved validation stats and per-model
/// aggregates into one table. Models without aggregates get missing cells.
pub fn assemble(
    registry: &ModelRegistry,
    aggregates: &HashMap<String, AggregateStats>,
) -> ModelsTable {
    let columns = column_order(registry);
    let resolved = resolve_validation_stats(&registry.models);

    let rows = resolved
        .iter()
        .map(|model| {
            let stats = aggregates.get(&model.name);
            TableRow {
                model: model.name.clone(),
                cells: columns
                    .iter()
                    .map(|column| cell_for(model, stats, column))
                    .collect(),
                error: None,
            }
        })
        .collect();

    ModelsTable { columns, rows }
}

fn cell_for(model: &Model, stats: Option<&AggregateStats>, column: &str) -> Cell {
    if column == N_RES {
        return Cell::Count(stats.map(|s| s.n_res));
    }
    if let Some(field) = ValidationField::from_column(column) {
        return Cell::Number(model.validation.get(field));
    }
    match column {
        "start" => Cell::Timestamp(Some(model.start)),
        "end" => Cell::Timestamp(model.end),
        "parent" => Cell::Text(model.parent.clone()),
        other => match stats {
            Some(s) if other.starts_with("res_") || other.starts_with("unres_") => {
                Cell::Number(s.get(other))
            }
            None if other.starts_with("res_") || other.starts_with("unres_") => Cell::Number(None),
            _ => Cell::Text(model.extra.get(other).cloned()),
        },
    }
}
