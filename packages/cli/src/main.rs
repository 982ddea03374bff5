#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for civic safety area ratings and route analysis.
//!
//! ```text
//! civic_safety area --zip 10001
//! civic_safety area --address "350 5th Ave, New York" --radius 0.25
//! civic_safety boroughs
//! civic_safety route "Times Square" "Barclays Center" --mode walking
//! civic_safety refresh [--borough brooklyn]
//! civic_safety validate [--borough queens]
//! civic_safety serve
//! ```
//!
//! Results are printed as pretty JSON. Configuration is read from the same
//! environment variables as the server.

use clap::{Parser, Subcommand};
use civic_safety_analysis_models::AreaQuery;
use civic_safety_incident_models::{Borough, IncidentScope};
use civic_safety_server::AppState;

#[derive(Parser)]
#[command(
    name = "civic_safety",
    about = "Area safety ratings and safe routes from NYC 311 data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate an area by postal code, borough, or address
    Area {
        /// Five-digit postal code
        #[arg(long)]
        zip: Option<String>,
        /// Borough name (e.g. "brooklyn", "staten island")
        #[arg(long)]
        borough: Option<String>,
        /// Address to geocode
        #[arg(long)]
        address: Option<String>,
        /// Radius around the address, in miles
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Compare safety scores across the five boroughs
    Boroughs,
    /// Score alternative routes between two addresses
    Route {
        /// Origin address
        origin: String,
        /// Destination address
        destination: String,
        /// Travel mode: driving, walking, bicycling, or transit
        #[arg(long)]
        mode: Option<String>,
    },
    /// Refetch incident data, for one borough or everything
    Refresh {
        /// Borough to refresh
        #[arg(long)]
        borough: Option<String>,
    },
    /// Check that incident data is loaded and usable
    Validate {
        /// Borough to check
        #[arg(long)]
        borough: Option<String>,
    },
    /// Start the API server
    Serve,
}

fn parse_scope(borough: Option<&str>) -> Result<IncidentScope, Box<dyn std::error::Error>> {
    Ok(borough.map_or(Ok(IncidentScope::All), str::parse)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let state = AppState::from_env()?;

    match cli.command {
        Commands::Area {
            zip,
            borough,
            address,
            radius,
        } => {
            let query = AreaQuery {
                zip_code: zip,
                borough: borough.as_deref().map(Borough::from_raw),
                address,
                radius_miles: radius,
            };
            let report = state.areas.rate_area(&query).await?;
            print_json(&report)?;
        }
        Commands::Boroughs => {
            print_json(&state.areas.borough_comparison().await)?;
        }
        Commands::Route {
            origin,
            destination,
            mode,
        } => {
            let mode = civic_safety_routing::parse_mode(mode.as_deref())?;
            let analysis = state
                .routes
                .analyze_routes(&origin, &destination, mode)
                .await?;
            print_json(&analysis)?;
        }
        Commands::Refresh { borough } => {
            let scope = parse_scope(borough.as_deref())?;
            if state.areas.store().refresh(scope).await {
                println!("Refreshed incident data for {scope}");
            } else {
                eprintln!("Failed to refresh incident data for {scope}; serving previous data");
                std::process::exit(1);
            }
        }
        Commands::Validate { borough } => {
            let scope = parse_scope(borough.as_deref())?;
            let store = state.areas.store();
            store.load(scope).await;
            if store.validate(scope).await {
                println!("Incident data for {scope} is loaded and usable");
            } else {
                eprintln!("Incident data for {scope} is missing, empty, or in fallback mode");
                std::process::exit(1);
            }
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(civic_safety_server::run_server(state))
            })
            .await??;
        }
    }

    Ok(())
}
