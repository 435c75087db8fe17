//! Core library for the `airmap` air-quality client.
//!
//! This crate defines:
//! - The report model and a single decoder for both service response shapes
//! - Report providers for the `/coords` and `/air_weather` endpoints
//! - The fetch orchestrator, which guards the current report with a request sequence number
//! - Map surface, sidebar and chart view models
//! - Configuration handling
//!
//! It is used by `airmap-cli`, but can also back other front-ends.

pub mod chart;
pub mod config;
pub mod error;
pub mod map;
pub mod model;
pub mod orchestrator;
pub mod panel;
pub mod provider;
pub mod retry;
pub mod route;
pub mod session;

pub use config::Config;
pub use error::{CoordinateError, FetchError};
pub use model::{Coordinates, PollutantEntry, Priority, Recommendation, Report};
pub use orchestrator::{Orchestrator, ReportState};
pub use provider::{Endpoint, ReportProvider};
pub use route::Route;
pub use session::MapSession;
