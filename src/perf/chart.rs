use super::fetch::ModelPerformance;
use crate::registry::ModelRegistry;
use chrono::{DateTime, Utc};

/// Plotly's default qualitative palette. Models keep their colour across
/// panels by registry position.
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChartPanel {
    pub metric: &'static str,
    pub title: &'static str,
    /// Relative height of the panel.
    pub weight: u8,
    pub zero_line: bool,
}

pub const PANELS: [ChartPanel; 3] = [
    ChartPanel {
        metric: "payout_norm",
        title: "Normalized payout",
        weight: 3,
        zero_line: true,
    },
    ChartPanel {
        metric: "corr20V2",
        title: "Corr20v2",
        weight: 1,
        zero_line: true,
    },
    ChartPanel {
        metric: "mmc",
        title: "MMC",
        weight: 1,
        zero_line: true,
    },
];

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChartPoint {
    pub round: i64,
    /// Round resolve time.
    pub x: Option<DateTime<Utc>>,
    pub payout_norm: Option<f64>,
    #[serde(rename = "corr20V2")]
    pub corr20_v2: Option<f64>,
    pub mmc: Option<f64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChartSeries {
    pub model: String,
    pub color: &'static str,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PerformanceChart {
    pub title: &'static str,
    /// "Now" marker drawn on every panel.
    pub now: DateTime<Utc>,
    pub panels: [ChartPanel; 3],
    pub series: Vec<ChartSeries>,
}

#[inline]
pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Chart-ready series, one per model, points in cached round order.
///
/// Colours come from each model's registry position, so a model missing from
/// `performances` does not shift the colours of the ones after it.
pub fn performance_chart(
    registry: &ModelRegistry,
    performances: &[ModelPerformance],
    now: DateTime<Utc>,
) -> PerformanceChart {
    let series = performances
        .iter()
        .enumerate()
        .map(|(i, perf)| ChartSeries {
            model: perf.model.clone(),
            color: color_for(registry.position(&perf.model).unwrap_or(i)),
            points: perf
                .rounds
                .iter()
                .map(|r| ChartPoint {
                    round: r.round_number,
                    x: r.round_resolve_time,
                    payout_norm: r.payout_norm,
                    corr20_v2: r.corr20_v2,
                    mmc: r.mmc,
                })
                .collect(),
        })
        .collect();

    PerformanceChart {
        title: "Models performances",
        now,
        panels: PANELS,
        series,
    }
}
