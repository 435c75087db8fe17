use async_trait::async_trait;
use reqwest::Client;

use crate::{Coordinates, Report, error::FetchError};

use super::{ReportProvider, join_url, read_report, send_error};

/// `POST {base_url}/coords` with `{"lat": .., "lon": ..}`; answers with the flat report shape.
#[derive(Debug, Clone)]
pub struct CoordsProvider {
    base_url: String,
    http: Client,
}

impl CoordsProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }

    pub fn url(&self) -> String {
        join_url(&self.base_url, "coords")
    }
}

#[async_trait]
impl ReportProvider for CoordsProvider {
    async fn fetch_report(&self, coords: Coordinates) -> Result<Report, FetchError> {
        let url = self.url();
        tracing::debug!(%url, lat = coords.lat, lon = coords.lon, "POST coords");

        let res = self.http.post(&url).json(&coords).send().await.map_err(send_error)?;

        read_report(res).await
    }
}
