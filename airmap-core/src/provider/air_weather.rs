use async_trait::async_trait;
use reqwest::Client;

use crate::{Coordinates, Report, error::FetchError};

use super::{ReportProvider, join_url, read_report, send_error};

pub const DEFAULT_HOURS: u32 = 48;

/// `GET {base_url}/air_weather?lat=..&lon=..&hours=..`; answers with the
/// report nested under `data`.
#[derive(Debug, Clone)]
pub struct AirWeatherProvider {
    base_url: String,
    http: Client,
    hours: u32,
}

impl AirWeatherProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new(), DEFAULT_HOURS)
    }

    pub fn with_client(base_url: impl Into<String>, http: Client, hours: u32) -> Self {
        Self { base_url: base_url.into(), http, hours: hours.max(1) }
    }

    pub fn url(&self) -> String {
        join_url(&self.base_url, "air_weather")
    }
}

#[async_trait]
impl ReportProvider for AirWeatherProvider {
    async fn fetch_report(&self, coords: Coordinates) -> Result<Report, FetchError> {
        let url = self.url();
        tracing::debug!(%url, lat = coords.lat, lon = coords.lon, hours = self.hours, "GET air_weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("hours", self.hours.to_string()),
            ])
            .send()
            .await
            .map_err(send_error)?;

        read_report(res).await
    }
}
