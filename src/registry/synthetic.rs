use super::{Model, ModelRegistry};
use chrono::NaiveDateTime;

/// Placeholder registry used when no local models table exists:
/// `count` models named `{prefix}1..={count}`, all starting at `start`.
#[derive(Debug, Clone)]
pub struct SyntheticRegistry {
    pub count: usize,
    pub prefix: String,
    pub start: NaiveDateTime,
}

impl SyntheticRegistry {
    pub fn new(count: usize, prefix: &str, start: NaiveDateTime) -> Self {
        Self {
            count,
            prefix: prefix.to_string(),
            start,
        }
    }

    pub fn build(&self) -> ModelRegistry {
        let models = (1..=self.count)
            .map(|n| Model::new(format!("{}{n}", self.prefix), self.start))
            .collect();

        ModelRegistry {
            columns: vec!["start".to_string()],
            models,
        }
    }
}
