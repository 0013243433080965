use crate::registry::{Model, ValidationField};
use std::collections::HashMap;

/// Replace each child model's validation statistics with its parent's.
///
/// Lookups go against the original rows, so inheritance is single-hop: a
/// grandchild receives its parent's own values, never the grandparent's.
/// A parent that is not in the registry leaves the child untouched. A parent
/// that exists but lacks a value passes that missing value on.
pub fn resolve_validation_stats(models: &[Model]) -> Vec<Model> {
    let originals: HashMap<&str, &Model> =
        models.iter().map(|m| (m.name.as_str(), m)).collect();

    models
        .iter()
        .map(|model| {
            let mut resolved = model.clone();
            let parent = model
                .parent
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .and_then(|p| originals.get(p));

            match parent {
                Some(parent) => {
                    for field in ValidationField::ALL {
                        resolved.validation.set(field, parent.validation.get(field));
                    }
                }
                None if model.parent.is_some() => {
                    tracing::debug!(
                        model = %model.name,
                        parent = ?model.parent,
                        "parent not in registry, keeping own validation stats"
                    );
                }
                None => {}
            }
            resolved
        })
        .collect()
}
