use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::{directions::DirectionsConfig, models::GeoPoint};

pub const DEFAULT_NAVER_URL: &str = "https://maps.apigw.ntruss.com";

#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Parking recommendation and route geometry service"
)]
pub struct ServerArgs {
    /// Address the HTTP server listens on
    #[arg(long, env = "PARKFINDER_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// JSON export of the latest lot status records
    #[arg(long, env = "LOTS_JSON", default_value = "backend/data/lots.json")]
    pub lots: PathBuf,

    /// Naver Cloud client id; without credentials routes are always synthesized
    #[arg(long, env = "NAVER_CLIENT_ID")]
    pub naver_client_id: Option<String>,

    #[arg(long, env = "NAVER_CLIENT_SECRET", hide_env_values = true)]
    pub naver_client_secret: Option<String>,

    #[arg(long, env = "NAVER_DIRECTIONS_URL", default_value = DEFAULT_NAVER_URL)]
    pub naver_url: String,

    /// Timeout for a single directions request, in seconds
    #[arg(long, env = "DIRECTIONS_TIMEOUT_SECS", default_value_t = 5)]
    pub directions_timeout_secs: u64,

    /// Seed for synthetic routes (random when absent)
    #[arg(long, env = "ROUTE_SEED")]
    pub route_seed: Option<u64>,

    /// Restrict accepted coordinates to a region
    #[arg(long, env = "REGION_POLICY", value_enum, default_value = "none")]
    pub region: RegionChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RegionChoice {
    None,
    Korea,
}

impl ServerArgs {
    /// Provider settings, present only when both credentials are set.
    pub fn directions_config(&self) -> Option<DirectionsConfig> {
        match (&self.naver_client_id, &self.naver_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(DirectionsConfig {
                    base_url: self.naver_url.clone(),
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                    timeout: Duration::from_secs(self.directions_timeout_secs),
                })
            }
            _ => None,
        }
    }

    pub fn region_policy(&self) -> Option<RegionPolicy> {
        match self.region {
            RegionChoice::None => None,
            RegionChoice::Korea => Some(RegionPolicy::KOREA),
        }
    }
}

/// Application-level bound on accepted coordinates, checked at the HTTP
/// boundary only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPolicy {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl RegionPolicy {
    pub const KOREA: RegionPolicy = RegionPolicy {
        min_lat: 33.0,
        max_lat: 39.0,
        min_lng: 124.0,
        max_lng: 132.0,
    };

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lng..=self.max_lng).contains(&point.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_credentials_disable_provider() {
        let args = ServerArgs::try_parse_from(["parkfinder"]).unwrap();
        assert!(args.directions_config().is_none());
        assert!(args.region_policy().is_none());
        assert_eq!(args.directions_timeout_secs, 5);
    }

    #[test]
    fn credentials_enable_provider() {
        let args = ServerArgs::try_parse_from([
            "parkfinder",
            "--naver-client-id",
            "id",
            "--naver-client-secret",
            "secret",
            "--directions-timeout-secs",
            "2",
            "--region",
            "korea",
        ])
        .unwrap();
        let config = args.directions_config().unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(args.region_policy(), Some(RegionPolicy::KOREA));
    }

    #[test]
    fn korea_policy_bounds() {
        assert!(RegionPolicy::KOREA.contains(GeoPoint::new(37.5663, 126.9779)));
        assert!(!RegionPolicy::KOREA.contains(GeoPoint::new(48.8566, 2.3522)));
        assert!(RegionPolicy::KOREA.contains(GeoPoint::new(33.0, 132.0)));
    }
}
