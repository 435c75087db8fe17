//! Line-chart series derived from pollutant history.

use crate::model::{PollutantEntry, Report};

/// Most trend charts shown at once.
pub const MAX_TREND_CHARTS: usize = 4;

/// Display metadata for a pollutant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollutantInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

const CATALOGUE: &[(&str, PollutantInfo)] = &[
    ("pm2_5", PollutantInfo {
        name: "PM2.5",
        description: "Fine particles that can penetrate deep into the lungs and enter the bloodstream.",
        color: "#3b82f6",
    }),
    ("pm10", PollutantInfo {
        name: "PM10",
        description: "Inhalable particles that can irritate your eyes, nose, and throat.",
        color: "#8b5cf6",
    }),
    ("nitrogen_dioxide", PollutantInfo {
        name: "NO2",
        description: "Gas from vehicles that irritates airways and aggravates respiratory diseases.",
        color: "#ef4444",
    }),
    ("ozone", PollutantInfo {
        name: "Ozone",
        description: "Ground-level ozone can trigger asthma and reduce lung function.",
        color: "#10b981",
    }),
    ("sulphur_dioxide", PollutantInfo {
        name: "SO2",
        description: "Produced by burning fossil fuels, harmful to the respiratory system.",
        color: "#f59e0b",
    }),
    ("carbon_monoxide", PollutantInfo {
        name: "CO",
        description: "Reduces oxygen delivery to the body's organs and tissues.",
        color: "#6366f1",
    }),
    ("uv_index", PollutantInfo {
        name: "UV Index",
        description: "Measure of the strength of sunburn-producing ultraviolet radiation.",
        color: "#ec4899",
    }),
    ("aerosol_optical_depth", PollutantInfo {
        name: "AOD",
        description: "Measure of how much sunlight is prevented from reaching the ground by particles.",
        color: "#64748b",
    }),
    ("dust", PollutantInfo {
        name: "Dust",
        description: "Fine powder of earth or waste matter.",
        color: "#a8a29e",
    }),
];

const FALLBACK_COLOR: &str = "#9ca3af";

/// Catalogue entry for a known key.
pub fn pollutant_info(key: &str) -> Option<PollutantInfo> {
    CATALOGUE.iter().find(|(k, _)| *k == key).map(|(_, info)| *info)
}

/// Human label: catalogue name, or the upper-cased key.
pub fn pollutant_label(key: &str) -> String {
    pollutant_info(key).map(|i| i.name.to_string()).unwrap_or_else(|| key.to_uppercase())
}

/// One line chart: x labels and y values of equal length. A `None` point
/// is a gap in the line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub key: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub labels: Vec<String>,
    pub points: Vec<Option<f64>>,
}

impl ChartSeries {
    /// `None` when the entry has no history to draw.
    pub fn from_entry(key: &str, entry: &PollutantEntry) -> Option<Self> {
        if !entry.has_history() {
            return None;
        }

        let (title, description, color) = match pollutant_info(key) {
            Some(info) => (info.name.to_string(), info.description.to_string(), info.color),
            None => (key.to_uppercase(), "Pollutant data.".to_string(), FALLBACK_COLOR),
        };

        Some(Self {
            key: key.to_string(),
            title,
            description,
            color: color.to_string(),
            labels: axis_labels(entry),
            points: entry.history.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(min, max)` of the plotted values, gaps skipped.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().flatten().copied().filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

// Hour-of-day labels when `times` covers every point, positional indices
// otherwise. A time that cannot be parsed keeps its index.
fn axis_labels(entry: &PollutantEntry) -> Vec<String> {
    let timed = entry.times.len() >= entry.history.len();

    (0..entry.history.len())
        .map(|i| {
            let hour = if timed { entry.times[i].hour() } else { None };
            match hour {
                Some(h) => format!("{h}:00"),
                None => i.to_string(),
            }
        })
        .collect()
}

/// Charts for the first [`MAX_TREND_CHARTS`] pollutants that have history,
/// in report order.
pub fn trend_charts(report: &Report) -> Vec<ChartSeries> {
    report
        .pollutants
        .iter()
        .filter_map(|(key, entry)| ChartSeries::from_entry(key, entry))
        .take(MAX_TREND_CHARTS)
        .collect()
}
