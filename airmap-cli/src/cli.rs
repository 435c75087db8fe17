use airmap_core::{
    Config, Coordinates, Endpoint, MapSession, Orchestrator, Route,
    map::{Popup, TILE_ATTRIBUTION},
    panel,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Select, Text};

use crate::{pages, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "airmap", version, about = "Air-quality map client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the service location and default endpoint. Prompts when no flags are given.
    Configure {
        /// Full service URL, e.g. "https://aq.example.org".
        #[arg(long)]
        base_url: Option<String>,

        /// Host used when no base URL is set.
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// "coords" or "air_weather".
        #[arg(long)]
        endpoint: Option<String>,

        /// Forecast window sent to `air_weather`, in hours.
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Fetch and show the report for one coordinate.
    #[command(allow_negative_numbers = true)]
    Query {
        lat: f64,
        lon: f64,

        /// Override the configured endpoint.
        #[arg(long)]
        endpoint: Option<String>,

        /// Forecast window for `air_weather`; overrides the config.
        #[arg(long)]
        hours: Option<u32>,

        /// Also print the raw response.
        #[arg(long)]
        raw: bool,
    },

    /// Interactive map session: enter coordinates as clicks.
    Explore {
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        hours: Option<u32>,

        /// Terminal width used for the sidebar layout.
        #[arg(long, default_value_t = 1280)]
        width: u32,
    },

    /// Open a page by path, e.g. "/", "/dashboard", "/prototype", "/about".
    Open { path: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { base_url, host, port, endpoint, hours } => {
                if base_url.is_none()
                    && host.is_none()
                    && port.is_none()
                    && endpoint.is_none()
                    && hours.is_none()
                {
                    configure_interactive(&mut config)?;
                } else {
                    config.base_url = base_url.or(config.base_url);
                    config.host = host.or(config.host);
                    config.port = port.unwrap_or(config.port);
                    if let Some(e) = endpoint {
                        config.set_default_endpoint(Endpoint::try_from(e.as_str())?);
                    }
                    config = with_hours(config, hours);
                }
                let path = config.save()?;
                println!("Saved configuration to {}", path.display());
                println!("Service: {}", config.resolve_base_url());
            }
            Command::Query { lat, lon, endpoint, hours, raw } => {
                let endpoint = resolve_endpoint(&config, endpoint.as_deref())?;
                let config = with_hours(config, hours);
                query(&config, endpoint, Coordinates::new(lat, lon), raw).await?;
            }
            Command::Explore { endpoint, hours, width } => {
                let endpoint = resolve_endpoint(&config, endpoint.as_deref())?;
                let config = with_hours(config, hours);
                explore(&config, endpoint, width).await?;
            }
            Command::Open { path } => match Route::from_path(&path)? {
                Route::Home => print!("{}", pages::home()),
                Route::About => print!("{}", pages::about()),
                route => {
                    let endpoint = route.endpoint().unwrap_or_default();
                    println!("{} ({})", route.title(), route.path());
                    explore(&config, endpoint, 1280).await?;
                }
            },
        }

        Ok(())
    }
}

fn resolve_endpoint(config: &Config, flag: Option<&str>) -> anyhow::Result<Endpoint> {
    match flag {
        Some(s) => Endpoint::try_from(s),
        None => config.default_endpoint(),
    }
}

/// Config with the forecast window replaced, when one was given.
fn with_hours(mut config: Config, hours: Option<u32>) -> Config {
    if let Some(hours) = hours {
        config.http.hours = hours.max(1);
    }
    config
}

fn configure_interactive(config: &mut Config) -> anyhow::Result<()> {
    let current = config.resolve_base_url();
    let base_url = Text::new("Service base URL:")
        .with_default(&current)
        .with_help_message("Leave as is to keep the current value")
        .prompt()
        .context("Configuration aborted")?;
    if base_url.trim() != current {
        config.base_url = Some(base_url.trim().to_string());
    }

    let endpoint = Select::new("Default endpoint:", Endpoint::all().to_vec())
        .prompt()
        .context("Configuration aborted")?;
    config.set_default_endpoint(endpoint);

    let hours = CustomType::<u32>::new("Hours (forecast window):")
        .with_default(config.http.hours)
        .with_error_message("Enter a whole number of hours")
        .prompt()
        .context("Configuration aborted")?;
    config.http.hours = hours.max(1);

    Ok(())
}

async fn query(
    config: &Config,
    endpoint: Endpoint,
    coords: Coordinates,
    raw: bool,
) -> anyhow::Result<()> {
    coords.validate()?;
    let orchestrator = Orchestrator::from_config(endpoint, config)?;

    let submission = orchestrator.submit(coords).await?;
    let report = submission.outcome?;

    print!("{}", render::sidebar(&panel::sidebar_view(Some(report.as_ref()), false)));
    if raw {
        println!("\n## Raw response\n{}", panel::raw_json(&report));
    }
    Ok(())
}

const EXPLORE_HELP: &str =
    "Enter \"lat,lon\" to click the map, or: form, clear, left, right, raw, quit";

async fn explore(config: &Config, endpoint: Endpoint, width: u32) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_config(endpoint, config)?;
    let session = MapSession::new(orchestrator, width);

    let (center, zoom) = session.view().await;
    println!("Service: {} ({endpoint})", config.resolve_base_url());
    if endpoint == Endpoint::AirWeather {
        println!("Forecast window: {} h", config.http.hours);
    }
    println!("Map centred on {center}, zoom {zoom}. Tiles {TILE_ATTRIBUTION}");
    print!("{}", render::sidebar(&session.sidebar().await));

    loop {
        let input = match Text::new("map>").with_help_message(EXPLORE_HELP).prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match input.trim() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "clear" => {
                session.clear().await;
                print!("{}", render::sidebar(&session.sidebar().await));
            }
            "left" => {
                let layout = session.toggle_left_sidebar().await;
                println!("Left sidebar {}, map width {}px", open_closed(layout.left_open), layout.map_width());
            }
            "right" => {
                let layout = session.toggle_right_sidebar().await;
                println!("Right sidebar {}, map width {}px", open_closed(layout.right_open), layout.map_width());
            }
            "raw" => match session.state().await.report() {
                Some(report) => println!("{}", panel::raw_json(report)),
                None => println!("No report to show."),
            },
            "form" => {
                if let Some(coords) = coordinate_form()? {
                    click(&session, coords).await;
                }
            }
            other => match other.parse::<Coordinates>() {
                Ok(coords) => click(&session, coords).await,
                Err(e) => println!("{e}"),
            },
        }
    }

    Ok(())
}

async fn click(session: &MapSession, coords: Coordinates) {
    println!("{}", render::popup(&Popup::loading(coords)));
    if let Err(e) = session.click(coords.lat, coords.lon).await {
        tracing::debug!(error = %e, "Click rejected");
    }

    if let Some(marker) = session.marker().await {
        print!("{}", render::popup(&marker.popup));
    }
    print!("{}", render::state(&session.state().await));
}

/// Latitude and longitude as two fields. Out-of-range input is reported
/// here and never reaches the map.
fn coordinate_form() -> anyhow::Result<Option<Coordinates>> {
    let lat = match Text::new("Latitude:").with_placeholder("e.g. 31.438037").prompt() {
        Ok(lat) => lat,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let lon = match Text::new("Longitude:").with_placeholder("e.g. 31.438037").prompt() {
        Ok(lon) => lon,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match Coordinates::parse(&lat, &lon) {
        Ok(coords) => Ok(Some(coords)),
        Err(e) => {
            println!("{e}");
            Ok(None)
        }
    }
}

fn open_closed(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_flag_overrides_config() {
        let config = Config::default();
        assert_eq!(with_hours(config.clone(), None).http.hours, 48);
        assert_eq!(with_hours(config.clone(), Some(12)).http.hours, 12);
        assert_eq!(with_hours(config, Some(0)).http.hours, 1);
    }

    #[test]
    fn query_accepts_hours_and_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "airmap", "query", "-33.9", "18.4", "--endpoint", "air_weather", "--hours", "24",
        ])
        .expect("valid arguments");

        match cli.command {
            Command::Query { lat, lon, endpoint, hours, raw } => {
                assert_eq!((lat, lon), (-33.9, 18.4));
                assert_eq!(endpoint.as_deref(), Some("air_weather"));
                assert_eq!(hours, Some(24));
                assert!(!raw);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn configure_accepts_hours() {
        let cli = Cli::try_parse_from(["airmap", "configure", "--hours", "72"]).expect("valid arguments");
        assert!(matches!(cli.command, Command::Configure { hours: Some(72), .. }));
    }
}
