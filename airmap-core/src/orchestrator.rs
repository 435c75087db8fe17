//! Turns a picked coordinate into a report request and the resulting state
//! transition.
//!
//! The current slot holds a request sequence number next to the state.
//! Each submission takes a new number; a completion is applied only while
//! its number is still the latest, so a slow response to an earlier click
//! can never overwrite the answer to a later one.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    Config,
    error::{CoordinateError, FetchError},
    model::{Coordinates, Report},
    panel::{self, SidebarView},
    provider::{self, Endpoint, ReportProvider},
    retry::RetryPolicy,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReportState {
    #[default]
    Idle,
    Loading {
        coordinates: Coordinates,
    },
    Ready {
        report: Arc<Report>,
    },
    Failed {
        coordinates: Option<Coordinates>,
        message: String,
    },
}

impl ReportState {
    pub fn report(&self) -> Option<&Report> {
        match self {
            ReportState::Ready { report } => Some(report.as_ref()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ReportState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ReportState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn sidebar(&self) -> SidebarView {
        panel::sidebar_view(self.report(), self.is_loading())
    }
}

/// The current slot: latest sequence number and the state it produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub seq: u64,
    pub state: ReportState,
}

/// Handle for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticket {
    pub seq: u64,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer submission (or a clear) happened first; the result was dropped.
    Stale,
}

/// Result of one submission, whether or not it reached the slot.
#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: Ticket,
    pub outcome: Result<Arc<Report>, FetchError>,
    pub completion: Completion,
}

impl Submission {
    pub fn is_applied(&self) -> bool {
        self.completion == Completion::Applied
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    provider: Arc<dyn ReportProvider>,
    retry: RetryPolicy,
    slot: Arc<RwLock<Snapshot>>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ReportProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry, slot: Arc::new(RwLock::new(Snapshot::default())) }
    }

    /// Orchestrator for the given endpoint, with timeout and retry from config.
    pub fn from_config(endpoint: Endpoint, config: &Config) -> anyhow::Result<Self> {
        let provider = provider::provider_from_config(endpoint, config)?;
        Ok(Self::new(Arc::from(provider), config.retry_policy()))
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.slot.read().await.clone()
    }

    pub async fn state(&self) -> ReportState {
        self.slot.read().await.state.clone()
    }

    /// Validate, fetch and store the report for a coordinate.
    ///
    /// Invalid input replaces the current state with the validation
    /// message and makes no request.
    pub async fn submit(&self, coordinates: Coordinates) -> Result<Submission, CoordinateError> {
        let ticket = self.prepare(coordinates).await?;
        Ok(self.fetch(ticket).await)
    }

    /// Validate and take a sequence number. On rejection the state shows
    /// the validation message and any request in flight becomes stale.
    pub async fn prepare(&self, coordinates: Coordinates) -> Result<Ticket, CoordinateError> {
        if let Err(err) = coordinates.validate() {
            let mut slot = self.slot.write().await;
            slot.seq += 1;
            slot.state = ReportState::Failed { coordinates: Some(coordinates), message: err.to_string() };
            tracing::debug!(error = %err, "Rejected coordinates");
            return Err(err);
        }

        Ok(self.begin(coordinates).await)
    }

    /// Run the request for `ticket` under the retry policy and store the outcome.
    pub async fn fetch(&self, ticket: Ticket) -> Submission {
        let provider = &self.provider;
        let coordinates = ticket.coordinates;
        let result = self.retry.run(|_| provider.fetch_report(coordinates)).await;

        let outcome = result.map(Arc::new);
        let completion = self.complete(ticket, outcome.clone()).await;

        Submission { ticket, outcome, completion }
    }

    /// Start a request: new sequence number, loading state, previous report dropped.
    pub async fn begin(&self, coordinates: Coordinates) -> Ticket {
        let mut slot = self.slot.write().await;
        slot.seq += 1;
        slot.state = ReportState::Loading { coordinates };
        tracing::debug!(seq = slot.seq, lat = coordinates.lat, lon = coordinates.lon, "Fetching report");
        Ticket { seq: slot.seq, coordinates }
    }

    /// Store the outcome of `ticket` unless a newer request has started since.
    pub async fn complete(
        &self,
        ticket: Ticket,
        outcome: Result<Arc<Report>, FetchError>,
    ) -> Completion {
        let mut slot = self.slot.write().await;
        if slot.seq != ticket.seq {
            tracing::warn!(seq = ticket.seq, current = slot.seq, "Discarding stale report response");
            return Completion::Stale;
        }

        slot.state = match outcome {
            Ok(report) => {
                tracing::info!(
                    seq = ticket.seq,
                    pollutants = report.pollutants.len(),
                    recommendations = report.recommendations.len(),
                    "Report received"
                );
                ReportState::Ready { report }
            }
            Err(err) => {
                tracing::warn!(seq = ticket.seq, error = %err, "Report request failed");
                ReportState::Failed { coordinates: Some(ticket.coordinates), message: err.to_string() }
            }
        };

        Completion::Applied
    }

    /// Drop the current report and invalidate anything still in flight.
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        slot.seq += 1;
        slot.state = ReportState::Idle;
    }
}
