//! Map surface state: the single marker, its popup, and the viewport.
//!
//! No tiles are drawn here; a front-end renders from this state.

use std::fmt;

use crate::{
    error::FetchError,
    model::{Coordinates, Report},
    orchestrator::Submission,
};

pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Initial view: centre of North America.
pub const INITIAL_CENTER: Coordinates = Coordinates { lat: 39.8283, lon: -98.5795 };
pub const INITIAL_ZOOM: u8 = 4;

/// Viewport width below which sidebars start closed.
pub const SIDEBAR_BREAKPOINT: u32 = 768;
pub const LEFT_SIDEBAR_WIDTH: u32 = 340;
pub const RIGHT_SIDEBAR_WIDTH: u32 = 450;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(u64);

/// What the marker popup says below the coordinate line.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupBody {
    Loading,
    Recommendation { text: String, reason: String, priority: String },
    Pollutant { key: String, value: f64, unit: String },
    /// Report arrived but had nothing worth summarising.
    Empty,
    FetchFailed,
    NetworkError,
    InvalidCoordinates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub coordinates: Coordinates,
    pub body: PopupBody,
}

impl Popup {
    pub fn loading(coordinates: Coordinates) -> Self {
        Self { coordinates, body: PopupBody::Loading }
    }

    /// Short summary: first recommendation, else first pollutant with a value.
    pub fn summary(coordinates: Coordinates, report: &Report) -> Self {
        let body = if let Some(first) = report.recommendations.first() {
            PopupBody::Recommendation {
                text: first.text.clone(),
                reason: first.reason.clone(),
                priority: first.priority.to_string(),
            }
        } else if let Some((key, entry)) = report.pollutants.first_with_value() {
            PopupBody::Pollutant {
                key: key.to_string(),
                value: entry.value.unwrap_or_default(),
                unit: entry.unit.clone(),
            }
        } else {
            PopupBody::Empty
        };
        Self { coordinates, body }
    }

    pub fn failure(coordinates: Coordinates, err: &FetchError) -> Self {
        let body = match err {
            FetchError::InvalidCoordinates(_) => PopupBody::InvalidCoordinates,
            e if e.is_network() => PopupBody::NetworkError,
            _ => PopupBody::FetchFailed,
        };
        Self { coordinates, body }
    }

    pub fn from_submission(submission: &Submission) -> Self {
        let coordinates = submission.ticket.coordinates;
        match &submission.outcome {
            Ok(report) => Self::summary(coordinates, report),
            Err(err) => Self::failure(coordinates, err),
        }
    }
}

impl fmt::Display for Popup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinates\nLat: {:.3}\nLon: {:.3}", self.coordinates.lat, self.coordinates.lon)?;
        match &self.body {
            PopupBody::Loading => write!(f, "\n---\nLoading…"),
            PopupBody::Recommendation { text, reason, priority } => {
                write!(f, "\n---\n{text}\n{reason} ({priority})")
            }
            PopupBody::Pollutant { key, value, unit } => {
                write!(f, "\n---\n{key}: {value} {unit}")
            }
            PopupBody::Empty => Ok(()),
            PopupBody::FetchFailed => write!(f, "\n---\nError fetching data"),
            PopupBody::NetworkError => write!(f, "\n---\nNetwork error"),
            PopupBody::InvalidCoordinates => write!(f, "\n---\nInvalid coordinates"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: Coordinates,
    pub popup: Popup,
}

/// Tile map with at most one marker.
#[derive(Debug, Clone)]
pub struct MapSurface {
    pub center: Coordinates,
    pub zoom: u8,
    width: u32,
    marker: Option<Marker>,
    next_id: u64,
}

impl MapSurface {
    pub fn new(width: u32) -> Self {
        Self { center: INITIAL_CENTER, zoom: INITIAL_ZOOM, width, marker: None, next_id: 0 }
    }

    /// Replace any existing marker with one at the click, showing the loading popup.
    pub fn click(&mut self, position: Coordinates) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.marker = Some(Marker { id, position, popup: Popup::loading(position) });
        id
    }

    /// Returns false if `id` is no longer the marker on the map.
    pub fn set_popup(&mut self, id: MarkerId, popup: Popup) -> bool {
        match self.marker.as_mut() {
            Some(marker) if marker.id == id => {
                marker.popup = popup;
                true
            }
            _ => false,
        }
    }

    pub fn remove_marker(&mut self) -> Option<Marker> {
        self.marker.take()
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Recompute the drawable size after the surrounding layout changed.
    pub fn invalidate_size(&mut self, width: u32) {
        if self.width != width {
            tracing::debug!(from = self.width, to = width, "Map resized");
            self.width = width;
        }
    }
}

/// Sidebar visibility around the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub viewport_width: u32,
    pub left_open: bool,
    pub right_open: bool,
}

impl Layout {
    /// Sidebars start open on tablet and desktop widths.
    pub fn for_viewport(viewport_width: u32) -> Self {
        let wide = viewport_width >= SIDEBAR_BREAKPOINT;
        Self { viewport_width, left_open: wide, right_open: wide }
    }

    pub fn map_width(&self) -> u32 {
        let left = if self.left_open { LEFT_SIDEBAR_WIDTH } else { 0 };
        let right = if self.right_open { RIGHT_SIDEBAR_WIDTH } else { 0 };
        self.viewport_width.saturating_sub(left + right)
    }

    pub fn toggle_left(&mut self) {
        self.left_open = !self.left_open;
    }

    pub fn toggle_right(&mut self) {
        self.right_open = !self.right_open;
    }

    /// Close or reopen the sidebars when the viewport crosses the breakpoint.
    pub fn resize(&mut self, viewport_width: u32) {
        let was_wide = self.viewport_width >= SIDEBAR_BREAKPOINT;
        let wide = viewport_width >= SIDEBAR_BREAKPOINT;
        self.viewport_width = viewport_width;
        if was_wide != wide {
            self.left_open = wide;
            self.right_open = wide;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Coordinates {
        Coordinates::new(30.0444, 31.2357)
    }

    #[test]
    fn click_replaces_the_previous_marker() {
        let mut map = MapSurface::new(1024);
        let first = map.click(Coordinates::new(1.0, 1.0));
        let second = map.click(here());

        assert_ne!(first, second);
        let marker = map.marker().expect("one marker");
        assert_eq!(marker.id, second);
        assert_eq!(marker.popup.body, PopupBody::Loading);

        // popup for a replaced marker is ignored
        assert!(!map.set_popup(first, Popup::loading(here())));
        assert!(map.set_popup(second, Popup { coordinates: here(), body: PopupBody::Empty }));

        assert!(map.remove_marker().is_some());
        assert!(map.marker().is_none());
    }

    #[test]
    fn loading_popup_text() {
        let text = Popup::loading(here()).to_string();
        assert_eq!(text, "Coordinates\nLat: 30.044\nLon: 31.236\n---\nLoading…");
    }

    #[test]
    fn summary_prefers_first_recommendation() {
        let report = Report::from_json(
            r#"{"lat": 1, "lon": 2,
                "pollutants": {"pm2_5": {"value": 9.1, "unit": "µg/m³"}},
                "recommendations": [
                    {"text": "Ventilate indoors", "reason": "Low wind", "priority": "medium"},
                    {"text": "Second", "reason": "x", "priority": "low"}
                ]}"#,
        )
        .expect("decode");

        let popup = Popup::summary(here(), &report);
        assert!(popup.to_string().ends_with("Ventilate indoors\nLow wind (medium)"));
    }

    #[test]
    fn summary_falls_back_to_first_pollutant_with_value() {
        let report = Report::from_json(
            r#"{"lat": 1, "lon": 2,
                "pollutants": {"ozone": {"value": null}, "pm10": {"value": 21.5, "unit": "µg/m³"}},
                "recommendations": []}"#,
        )
        .expect("decode");

        let popup = Popup::summary(here(), &report);
        assert_eq!(
            popup.body,
            PopupBody::Pollutant { key: "pm10".into(), value: 21.5, unit: "µg/m³".into() }
        );
        assert!(popup.to_string().ends_with("pm10: 21.5 µg/m³"));
    }

    #[test]
    fn failure_popups() {
        let http = Popup::failure(here(), &FetchError::Http { status: 500, detail: None });
        assert!(http.to_string().ends_with("Error fetching data"));

        let net = Popup::failure(here(), &FetchError::Transport("refused".into()));
        assert!(net.to_string().ends_with("Network error"));

        let timeout = Popup::failure(here(), &FetchError::Timeout);
        assert_eq!(timeout.body, PopupBody::NetworkError);
    }

    #[test]
    fn layout_follows_breakpoint_and_toggles() {
        let mut layout = Layout::for_viewport(1280);
        assert!(layout.left_open && layout.right_open);
        assert_eq!(layout.map_width(), 1280 - 340 - 450);

        layout.toggle_right();
        assert_eq!(layout.map_width(), 940);

        layout.resize(600);
        assert!(!layout.left_open && !layout.right_open);
        assert_eq!(layout.map_width(), 600);

        // staying on the same side of the breakpoint keeps manual choices
        layout.toggle_left();
        layout.resize(700);
        assert!(layout.left_open);

        assert!(!Layout::for_viewport(500).left_open);
    }
}
