use std::fmt;

use crate::provider::Endpoint;

/// Pages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    /// Coordinate form backed by `air_weather`.
    Dashboard,
    /// Click-to-query map backed by `coords`.
    Prototype,
    About,
}

impl Route {
    pub const fn all() -> &'static [Route] {
        &[Route::Home, Route::Dashboard, Route::Prototype, Route::About]
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
            Route::Prototype => "/prototype",
            Route::About => "/about",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Dashboard => "Dashboard",
            Route::Prototype => "App",
            Route::About => "About",
        }
    }

    /// Query string and fragment are ignored; a trailing slash is optional.
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim().trim_end_matches('/');
        let normalized = if trimmed.starts_with('/') || trimmed.is_empty() {
            trimmed.to_lowercase()
        } else {
            format!("/{}", trimmed.to_lowercase())
        };

        match normalized.as_str() {
            "" => Ok(Route::Home),
            "/dashboard" => Ok(Route::Dashboard),
            "/prototype" | "/app" => Ok(Route::Prototype),
            "/about" => Ok(Route::About),
            _ => Err(anyhow::anyhow!(
                "No page at '{path}'. Known pages: {}.",
                Route::all().iter().map(Route::path).collect::<Vec<_>>().join(", ")
            )),
        }
    }

    /// Backend variant a map page talks to; `None` for static pages.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Route::Dashboard => Some(Endpoint::AirWeather),
            Route::Prototype => Some(Endpoint::Coords),
            Route::Home | Route::About => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
