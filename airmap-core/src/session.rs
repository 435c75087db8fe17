//! The map page: map surface, sidebar layout and orchestrator wired together.

use tokio::sync::Mutex;

use crate::{
    error::{CoordinateError, FetchError},
    map::{Layout, MapSurface, Marker, Popup},
    model::Coordinates,
    orchestrator::{Orchestrator, ReportState, Submission},
    panel::SidebarView,
};

#[derive(Debug)]
pub struct MapSession {
    orchestrator: Orchestrator,
    map: Mutex<MapSurface>,
    layout: Mutex<Layout>,
}

impl MapSession {
    pub fn new(orchestrator: Orchestrator, viewport_width: u32) -> Self {
        let layout = Layout::for_viewport(viewport_width);
        Self {
            orchestrator,
            map: Mutex::new(MapSurface::new(layout.map_width())),
            layout: Mutex::new(layout),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Handle a click on the map: move the marker, fetch, then update the
    /// marker popup if this click is still the latest one.
    ///
    /// The marker and the request sequence number are taken under the same
    /// map lock, so the newest marker always belongs to the newest request.
    pub async fn click(&self, lat: f64, lon: f64) -> Result<Submission, CoordinateError> {
        let position = Coordinates::new(lat, lon);

        let (marker, ticket) = {
            let mut map = self.map.lock().await;
            let marker = map.click(position);
            match self.orchestrator.prepare(position).await {
                Ok(ticket) => (marker, ticket),
                Err(err) => {
                    map.set_popup(marker, Popup::failure(position, &FetchError::from(err.clone())));
                    return Err(err);
                }
            }
        };

        let submission = self.orchestrator.fetch(ticket).await;
        if submission.is_applied() {
            self.map.lock().await.set_popup(marker, Popup::from_submission(&submission));
        }
        Ok(submission)
    }

    /// Remove the marker and drop the report.
    pub async fn clear(&self) {
        let mut map = self.map.lock().await;
        map.remove_marker();
        self.orchestrator.clear().await;
    }

    /// Where the map is looking: centre and zoom level.
    pub async fn view(&self) -> (Coordinates, u8) {
        let map = self.map.lock().await;
        (map.center, map.zoom)
    }

    pub async fn toggle_left_sidebar(&self) -> Layout {
        self.update_layout(Layout::toggle_left).await
    }

    pub async fn toggle_right_sidebar(&self) -> Layout {
        self.update_layout(Layout::toggle_right).await
    }

    pub async fn resize_viewport(&self, width: u32) -> Layout {
        self.update_layout(|layout| layout.resize(width)).await
    }

    async fn update_layout(&self, change: impl FnOnce(&mut Layout)) -> Layout {
        let mut layout = self.layout.lock().await;
        change(&mut layout);
        self.map.lock().await.invalidate_size(layout.map_width());
        *layout
    }

    pub async fn layout(&self) -> Layout {
        *self.layout.lock().await
    }

    pub async fn marker(&self) -> Option<Marker> {
        self.map.lock().await.marker().cloned()
    }

    pub async fn map_width(&self) -> u32 {
        self.map.lock().await.width()
    }

    pub async fn state(&self) -> ReportState {
        self.orchestrator.state().await
    }

    pub async fn sidebar(&self) -> SidebarView {
        self.orchestrator.state().await.sidebar()
    }
}
