#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for civic safety area ratings and route analysis.
//!
//! The server is a thin adapter: handlers translate JSON bodies into
//! analysis calls and map validation errors to HTTP 400. Upstream outages
//! never produce a 5xx; they show up in each response's `data_source`.
//!
//! Configuration comes from environment variables, see [`AppState::from_env`].

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use civic_safety_analysis::{AnalysisError, AreaAnalyzer, ScoringConfig};
use civic_safety_geocoder::{GeocodeError, GeocoderChain};
use civic_safety_routing::{DirectionsError, DirectionsProvider, GoogleDirections, RouteAnalyzer};
use civic_safety_source::SourceError;
use civic_safety_source::sources::nyc_311::Nyc311Source;
use civic_safety_store::{IncidentStore, StoreConfig};

/// Errors building the application state.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The incident source could not be created.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The geocoder chain could not be created.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// The directions client could not be created.
    #[error(transparent)]
    Directions(#[from] DirectionsError),

    /// The scoring config override could not be loaded.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Shared application state.
pub struct AppState {
    /// Area ratings and borough comparison.
    pub areas: Arc<AreaAnalyzer>,
    /// Route analysis.
    pub routes: Arc<RouteAnalyzer>,
}

impl AppState {
    /// Wires the analyzers together.
    #[must_use]
    pub fn new(areas: Arc<AreaAnalyzer>, directions: Option<Arc<dyn DirectionsProvider>>) -> Self {
        let routes = Arc::new(RouteAnalyzer::new(directions, areas.clone()));
        Self { areas, routes }
    }

    /// Builds the state from environment variables:
    ///
    /// * `GOOGLE_MAPS_API_KEY`: enables Google geocoding and directions
    /// * `SOCRATA_APP_TOKEN`: sent as `X-App-Token`
    /// * `NYC_311_API_URL`: dataset endpoint override
    /// * `CIVIC_SAFETY_SCORING_CONFIG`: path to a scoring TOML override
    /// * `CIVIC_SAFETY_CACHE_TTL_SECS`: cache TTL (default 3600)
    /// * `CIVIC_SAFETY_LOOKBACK_DAYS`: fetch window (default 182)
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if an HTTP client cannot be built or the
    /// scoring override is unreadable or invalid.
    pub fn from_env() -> Result<Self, ServerError> {
        let google_key = env_var("GOOGLE_MAPS_API_KEY");

        let mut source = Nyc311Source::new()?.with_app_token(env_var("SOCRATA_APP_TOKEN"));
        if let Some(url) = env_var("NYC_311_API_URL") {
            log::info!("Using incident endpoint {url}");
            source = source.with_api_url(url);
        }

        let mut store_config = StoreConfig::default();
        if let Some(secs) = env_parse::<i64>("CIVIC_SAFETY_CACHE_TTL_SECS") {
            store_config.ttl = chrono::Duration::seconds(secs);
        }
        if let Some(days) = env_parse::<u32>("CIVIC_SAFETY_LOOKBACK_DAYS") {
            store_config.lookback_days = days;
        }

        let scoring = match env_var("CIVIC_SAFETY_SCORING_CONFIG") {
            Some(path) => {
                log::info!("Loading scoring config from {path}");
                ScoringConfig::from_path(path)?
            }
            None => ScoringConfig::default(),
        };

        let store = Arc::new(IncidentStore::new(Arc::new(source), store_config));
        let geocoder = Arc::new(GeocoderChain::from_registry(google_key.as_deref())?);
        let areas = Arc::new(AreaAnalyzer::new(store, geocoder, scoring));

        let directions: Option<Arc<dyn DirectionsProvider>> = match google_key {
            Some(key) => Some(Arc::new(GoogleDirections::new(key)?)),
            None => None,
        };

        Ok(Self::new(areas, directions))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    raw.trim().parse().map_or_else(
        |_| {
            log::warn!("Ignoring unparseable {name}={raw}");
            None
        },
        Some,
    )
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/safety", web::post().to(handlers::area_safety))
            .route(
                "/safety/borough-comparison",
                web::get().to(handlers::borough_comparison),
            )
            .route("/safety/refresh", web::post().to(handlers::refresh))
            .route("/safe-routes", web::post().to(handlers::safe_routes)),
    );
}

/// Starts the API server on `BIND_ADDR:PORT` (default `127.0.0.1:8080`).
///
/// This is a regular async function; the caller provides the actix
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
