use crate::{
    Config, Coordinates, Report,
    error::FetchError,
    provider::{air_weather::AirWeatherProvider, coords::CoordsProvider},
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::fmt::Debug;

pub mod air_weather;
pub mod coords;

/// Which backend route a report is requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endpoint {
    /// `POST /coords` with a JSON body.
    #[default]
    Coords,
    /// `GET /air_weather` with query parameters.
    AirWeather,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Coords => "coords",
            Endpoint::AirWeather => "air_weather",
        }
    }

    pub const fn all() -> &'static [Endpoint] {
        &[Endpoint::Coords, Endpoint::AirWeather]
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Endpoint {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase().replace('-', "_");

        match lower.as_str() {
            "coords" => Ok(Endpoint::Coords),
            "air_weather" => Ok(Endpoint::AirWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown endpoint '{value}'. Supported endpoints: coords, air_weather."
            )),
        }
    }
}

/// Source of reports for a coordinate.
#[async_trait]
pub trait ReportProvider: Send + Sync + Debug {
    async fn fetch_report(&self, coords: Coordinates) -> Result<Report, FetchError>;
}

/// Construct a provider for an explicit endpoint.
pub fn provider_from_config(
    endpoint: Endpoint,
    config: &Config,
) -> anyhow::Result<Box<dyn ReportProvider>> {
    let base_url = config.resolve_base_url();
    let http = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

    tracing::debug!(%endpoint, %base_url, "Using report provider");

    let boxed: Box<dyn ReportProvider> = match endpoint {
        Endpoint::Coords => Box::new(CoordsProvider::with_client(base_url, http)),
        Endpoint::AirWeather => {
            Box::new(AirWeatherProvider::with_client(base_url, http, config.http.hours))
        }
    };

    Ok(boxed)
}

/// Construct the provider for the configured default endpoint.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ReportProvider>> {
    let endpoint = config.default_endpoint()?;
    provider_from_config(endpoint, config)
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn send_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Turn a response into a report, mapping non-2xx statuses to
/// [`FetchError::Http`] with the service's `detail` message when it sent one.
pub(crate) async fn read_report(res: Response) -> Result<Report, FetchError> {
    let status = res.status();
    let body = res.text().await.map_err(send_error)?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| match d {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            });
        tracing::debug!(status = status.as_u16(), body = %truncate_body(&body), "Service returned an error");
        return Err(FetchError::Http { status: status.as_u16(), detail });
    }

    Report::from_json(&body)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
