//! Sidebar view models.
//!
//! Everything here is a pure function of a report and the loading flag;
//! renderers (terminal, web) only have to lay the values out.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    chart::{self, ChartSeries},
    model::{Coordinates, OpenAqMeasurement, Priority, Report},
};

/// Section headers shown before any point has been picked.
pub const SECTION_HEADERS: [&str; 3] = ["Location", "Pollutants", "Recommendations"];

/// Colour cue shared by metric cards, the status badge and recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Good,
    Moderate,
    Elevated,
    Poor,
    Neutral,
}

impl Accent {
    pub fn hex(&self) -> &'static str {
        match self {
            Accent::Good => "#10b981",
            Accent::Moderate => "#f59e0b",
            Accent::Elevated => "#f97316",
            Accent::Poor => "#ef4444",
            Accent::Neutral => "#9ca3af",
        }
    }
}

impl Priority {
    pub fn accent(&self) -> Accent {
        match self {
            Priority::High => Accent::Poor,
            Priority::Medium => Accent::Moderate,
            Priority::Low => Accent::Good,
        }
    }
}

/// Air-quality banding from the PM2.5 reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQualityStatus {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Poor,
    Unknown,
}

impl AirQualityStatus {
    pub fn from_pm2_5(value: Option<f64>) -> Self {
        match value {
            None => Self::Unknown,
            Some(v) if v < 12.0 => Self::Good,
            Some(v) if v < 35.4 => Self::Moderate,
            Some(v) if v < 55.4 => Self::UnhealthyForSensitiveGroups,
            Some(_) => Self::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Poor => "Poor",
            Self::Unknown => "Unknown",
        }
    }

    pub fn accent(&self) -> Accent {
        match self {
            Self::Good => Accent::Good,
            Self::Moderate => Accent::Moderate,
            Self::UnhealthyForSensitiveGroups => Accent::Elevated,
            Self::Poor => Accent::Poor,
            Self::Unknown => Accent::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub key: String,
    pub label: String,
    pub value: Option<f64>,
    pub unit: String,
    pub accent: Accent,
}

impl MetricCard {
    fn new(key: &str, value: Option<f64>, unit: &str) -> Self {
        let accent = match value {
            None => Accent::Neutral,
            Some(v) if v > 40.0 => Accent::Poor,
            Some(v) if v > 15.0 => Accent::Moderate,
            Some(_) => Accent::Good,
        };
        Self {
            key: key.to_string(),
            label: chart::pollutant_label(key),
            value,
            unit: unit.to_string(),
            accent,
        }
    }

    /// `"42.3 µg/m³"`, or `"—"` when the value is unknown.
    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) if self.unit.is_empty() => format!("{v:.1}"),
            Some(v) => format!("{v:.1} {}", self.unit),
            None => "—".to_string(),
        }
    }
}

/// Ground-station average with its severity cue.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAqItem {
    pub name: String,
    pub mean_value: Option<f64>,
    pub accent: Accent,
}

impl From<&OpenAqMeasurement> for OpenAqItem {
    fn from(m: &OpenAqMeasurement) -> Self {
        let accent = match m.mean_value {
            None => Accent::Neutral,
            Some(v) if v > 100.0 => Accent::Poor,
            Some(v) if v > 50.0 => Accent::Moderate,
            Some(_) => Accent::Good,
        };
        Self { name: m.name.clone(), mean_value: m.mean_value, accent }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationItem {
    pub text: String,
    pub reason: String,
    pub priority: Priority,
    pub accent: Accent,
}

/// Everything a populated sidebar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub coordinates: Coordinates,
    pub updated: Option<DateTime<Utc>>,
    pub status: AirQualityStatus,
    pub metrics: Vec<MetricCard>,
    pub openaq: Vec<OpenAqItem>,
    pub recommendations: Vec<RecommendationItem>,
    pub trends: Vec<ChartSeries>,
}

impl ReportView {
    pub fn from_report(report: &Report) -> Self {
        let pm2_5 = report.pollutants.get("pm2_5").and_then(|p| p.value);

        Self {
            coordinates: report.coordinates(),
            updated: report.timestamp,
            status: AirQualityStatus::from_pm2_5(pm2_5),
            metrics: report
                .pollutants
                .iter()
                .map(|(key, entry)| MetricCard::new(key, entry.value, &entry.unit))
                .collect(),
            openaq: report.openaq.iter().map(OpenAqItem::from).collect(),
            recommendations: report
                .recommendations
                .iter()
                .map(|r| RecommendationItem {
                    text: r.text.clone(),
                    reason: r.reason.clone(),
                    priority: r.priority,
                    accent: r.priority.accent(),
                })
                .collect(),
            trends: chart::trend_charts(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarView {
    /// Nothing picked yet: section headers only.
    Empty,
    Loading,
    Populated(Box<ReportView>),
}

/// Loading wins over a report still held by the caller.
pub fn sidebar_view(report: Option<&Report>, loading: bool) -> SidebarView {
    match (report, loading) {
        (_, true) => SidebarView::Loading,
        (Some(report), false) => SidebarView::Populated(Box::new(ReportView::from_report(report))),
        (None, false) => SidebarView::Empty,
    }
}

/// Pretty JSON of the raw body with numbers rounded to two decimals.
pub fn raw_json(report: &Report) -> String {
    let rounded = round_numbers(&report.raw);
    serde_json::to_string_pretty(&rounded).unwrap_or_else(|_| report.raw.to_string())
}

fn round_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| (f * 100.0).round() / 100.0)
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(round_numbers).collect()),
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), round_numbers(v))).collect())
        }
        other => other.clone(),
    }
}
