use super::{Model, ModelRegistry, ValidationField};
use crate::errors::{DashboardError, DashboardResult};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

const INDEX_COLUMN: &str = "model_name";

/// Read the local models table (CSV, indexed by `model_name`).
pub fn load_models_table(path: &Path) -> DashboardResult<ModelRegistry> {
    let file = std::fs::File::open(path).map_err(|e| {
        DashboardError::RegistryUnavailable(format!("open {}: {e}", path.display()))
    })?;
    let registry = parse_models_table(file)?;
    tracing::info!(
        path = %path.display(),
        models = registry.models.len(),
        "models table loaded"
    );
    Ok(registry)
}

pub fn parse_models_table<R: Read>(reader: R) -> DashboardResult<ModelRegistry> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let index_pos = headers
        .iter()
        .position(|h| h == INDEX_COLUMN)
        .ok_or_else(|| {
            DashboardError::RegistryUnavailable(format!("missing index column '{INDEX_COLUMN}'"))
        })?;
    if !headers.iter().any(|h| h == "start") {
        return Err(DashboardError::RegistryUnavailable("missing column 'start'".into()));
    }

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index_pos)
        .map(|(_, h)| h.clone())
        .collect();

    let mut seen = HashSet::new();
    let mut models = Vec::new();

    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let name = record.get(index_pos).unwrap_or_default().to_string();
        if name.is_empty() {
            return Err(DashboardError::RegistryUnavailable(format!(
                "row {}: empty {INDEX_COLUMN}",
                line + 1
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(DashboardError::RegistryUnavailable(format!(
                "duplicate model '{name}'"
            )));
        }

        let mut start = None;
        let mut model = Model::new(name.clone(), NaiveDateTime::MIN);

        for (i, header) in headers.iter().enumerate() {
            if i == index_pos {
                continue;
            }
            let cell = record.get(i).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }

            match header.as_str() {
                "start" => start = parse_timestamp(cell),
                "end" => {
                    model.end = parse_timestamp(cell);
                    if model.end.is_none() {
                        log_unparsed(&name, header, cell);
                    }
                }
                "parent" => model.parent = Some(cell.to_string()),
                other => match ValidationField::from_column(other) {
                    Some(field) => {
                        let value = parse_float(cell);
                        if value.is_none() {
                            log_unparsed(&name, header, cell);
                        }
                        model.validation.set(field, value);
                    }
                    None => {
                        model.extra.insert(other.to_string(), cell.to_string());
                    }
                },
            }
        }

        model.start = start.ok_or_else(|| {
            DashboardError::RegistryUnavailable(format!("model '{name}': missing or invalid start"))
        })?;
        models.push(model);
    }

    Ok(ModelRegistry { columns, models })
}

/// Accepts plain dates, naive datetimes and RFC 3339 (converted to naive UTC).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[inline]
fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn log_unparsed(model: &str, column: &str, value: &str) {
    tracing::debug!(model, column, value, "unparseable cell treated as missing");
}
