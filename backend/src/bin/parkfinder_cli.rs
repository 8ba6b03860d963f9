use std::{fs::File, io::BufReader, path::PathBuf};

use clap::{Parser, Subcommand};
use parkfinder::{
    models::{GeoPoint, PathInput},
    recommend::{DEFAULT_MAX_RESULTS, DEFAULT_RADIUS_KM, recommend},
    repository::{JsonFileRepository, LotStatusRepository},
    routing::{DEFAULT_DEVIATION_THRESHOLD_M, check_deviation, decode_path, route_rng, synthesize_route},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run parking recommendations and route geometry offline, printing JSON"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank lots from a JSON lot snapshot around a destination
    Recommend {
        /// JSON array of lot status records
        #[arg(long)]
        lots: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max: usize,
        #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
        radius_km: f64,
    },
    /// Generate a synthetic route between two points
    Synthesize {
        #[arg(long, allow_hyphen_values = true)]
        start_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        start_lng: f64,
        #[arg(long, allow_hyphen_values = true)]
        goal_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        goal_lng: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check a location against a route path stored as JSON
    Deviation {
        /// JSON path: list of points or flat [lng, lat, ...] array
        #[arg(long)]
        path: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, default_value_t = DEFAULT_DEVIATION_THRESHOLD_M)]
        threshold: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = match Args::parse().command {
        Command::Recommend {
            lots,
            lat,
            lng,
            max,
            radius_km,
        } => {
            let repository = JsonFileRepository::from_file(&lots)?;
            let snapshot = repository.latest_snapshots().await?;
            tracing::info!("scoring {} lots from {:?}", snapshot.len(), lots);
            let result = recommend(GeoPoint::new(lat, lng), &snapshot, max, radius_km)?;
            serde_json::to_string_pretty(&result)?
        }
        Command::Synthesize {
            start_lat,
            start_lng,
            goal_lat,
            goal_lng,
            seed,
        } => {
            let route = synthesize_route(
                GeoPoint::new(start_lat, start_lng),
                GeoPoint::new(goal_lat, goal_lng),
                &mut route_rng(seed),
            )?;
            serde_json::to_string_pretty(&route)?
        }
        Command::Deviation {
            path,
            lat,
            lng,
            threshold,
        } => {
            let input: PathInput = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
            let points = decode_path(input)?;
            let check = check_deviation(&points, GeoPoint::new(lat, lng), threshold)?;
            serde_json::to_string_pretty(&check)?
        }
    };

    println!("{output}");
    Ok(())
}
