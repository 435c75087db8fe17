//! Plain-text rendering of the sidebar views.

use std::fmt;

use airmap_core::{
    ReportState,
    chart::ChartSeries,
    map::Popup,
    panel::{Accent, ReportView, SECTION_HEADERS, SidebarView},
};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn dot(accent: Accent) -> &'static str {
    match accent {
        Accent::Good => "[+]",
        Accent::Moderate => "[~]",
        Accent::Elevated => "[!]",
        Accent::Poor => "[!!]",
        Accent::Neutral => "[ ]",
    }
}

struct StateText<'a>(&'a ReportState);

impl fmt::Display for StateText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SidebarText(&self.0.sidebar()))?;
        if let Some(message) = self.0.error() {
            writeln!(f, "Error: {message}")?;
        }
        Ok(())
    }
}

struct SidebarText<'a>(&'a SidebarView);

impl fmt::Display for SidebarText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            SidebarView::Empty => {
                writeln!(f, "Select a location on the map to see air quality insights.")?;
                for header in SECTION_HEADERS {
                    writeln!(f, "\n## {header}")?;
                }
                Ok(())
            }
            SidebarView::Loading => {
                writeln!(f, "Loading…")?;
                writeln!(f, "Please wait while we fetch data for the clicked point.")
            }
            SidebarView::Populated(view) => write!(f, "{}", ReportText(view)),
        }
    }
}

struct ReportText<'a>(&'a ReportView);

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;

        writeln!(f, "## Location")?;
        writeln!(f, "{}", view.coordinates)?;
        match view.updated {
            Some(t) => writeln!(f, "Updated {}", t.format("%H:%M UTC"))?,
            None => writeln!(f, "Updated just now")?,
        }
        writeln!(
            f,
            "Air Quality Index: {} {} (based on PM2.5 levels)",
            dot(view.status.accent()),
            view.status.label()
        )?;

        writeln!(f, "\n## Pollutants")?;
        if view.metrics.is_empty() {
            writeln!(f, "No pollutant data available.")?;
        }
        for card in &view.metrics {
            writeln!(f, "{} {:<10} {}", dot(card.accent), card.label, card.display_value())?;
        }

        if !view.openaq.is_empty() {
            writeln!(f, "\n## OpenAQ")?;
            for m in &view.openaq {
                match m.mean_value {
                    Some(v) => writeln!(f, "{} {}: {v}", dot(m.accent), m.name)?,
                    None => writeln!(f, "{} {}: —", dot(m.accent), m.name)?,
                }
            }
        }

        if !view.trends.is_empty() {
            writeln!(f, "\n## Pollutant Trends")?;
            for series in &view.trends {
                write!(f, "{}", ChartText(series))?;
            }
        }

        writeln!(f, "\n## Recommendations")?;
        if view.recommendations.is_empty() {
            writeln!(f, "No recommendations.")?;
        }
        for (i, rec) in view.recommendations.iter().enumerate() {
            writeln!(f, "{}. {} {}", i + 1, dot(rec.accent), rec.text)?;
            if !rec.reason.is_empty() {
                writeln!(f, "     {} ({})", rec.reason, rec.priority)?;
            }
        }
        Ok(())
    }
}

struct ChartText<'a>(&'a ChartSeries);

impl ChartText<'_> {
    // Gaps and non-finite values leave a blank column.
    fn bar(&self, point: Option<f64>, lo: f64, hi: f64) -> char {
        match point {
            Some(v) if v.is_finite() && hi > lo => {
                let idx = ((v - lo) / (hi - lo) * (SPARK.len() - 1) as f64).round() as usize;
                SPARK[idx.min(SPARK.len() - 1)]
            }
            Some(v) if v.is_finite() => SPARK[SPARK.len() / 2],
            _ => ' ',
        }
    }
}

impl fmt::Display for ChartText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let series = self.0;
        writeln!(f, "{} ({})", series.title, series.description)?;

        let bounds = series.bounds();
        let line: String = match bounds {
            Some((lo, hi)) => series.points.iter().map(|p| self.bar(*p, lo, hi)).collect(),
            None => String::new(),
        };
        writeln!(f, "  {line}")?;

        if let (Some(first), Some(last)) = (series.labels.first(), series.labels.last()) {
            let (lo, hi) = bounds.unwrap_or_default();
            writeln!(f, "  {first} … {last}   min {lo:.1} / max {hi:.1}")?;
        }
        Ok(())
    }
}

pub fn state(state: &ReportState) -> String {
    StateText(state).to_string()
}

pub fn sidebar(view: &SidebarView) -> String {
    SidebarText(view).to_string()
}

pub fn chart(series: &ChartSeries) -> String {
    ChartText(series).to_string()
}

pub fn popup(popup: &Popup) -> String {
    popup.to_string().lines().map(|l| format!("  | {l}\n")).collect()
}
