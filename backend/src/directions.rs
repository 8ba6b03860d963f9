use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::CoreError,
    geo::bounding_box,
    models::{DirectionsRoute, GeoPoint, GuideStep, RerouteResponse, RouteOption, TurnType},
    routing::{route_rng, synthesize_route_via, turn_instruction},
};

/// Intermediate stops accepted by the Directions 5 driving endpoint.
pub const MAX_WAYPOINTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directions provider answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid directions payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("directions provider found no route: {0}")]
    NoRoute(String),
}

/// Live driving-directions source.
///
/// Implementations report every failure as an error; deciding what to do
/// about it is left to [`RouteService`].
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Route from `start` to `goal` passing through `waypoints` in order.
    async fn driving_route(
        &self,
        start: GeoPoint,
        goal: GeoPoint,
        waypoints: &[GeoPoint],
        option: RouteOption,
    ) -> Result<DirectionsRoute, DirectionsError>;
}

/// Connection settings for the Naver Directions 5 API.
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

pub struct NaverDirections {
    client: reqwest::Client,
    config: DirectionsConfig,
}

impl NaverDirections {
    pub fn new(config: DirectionsConfig) -> Result<Self, DirectionsError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DirectionsProvider for NaverDirections {
    async fn driving_route(
        &self,
        start: GeoPoint,
        goal: GeoPoint,
        waypoints: &[GeoPoint],
        option: RouteOption,
    ) -> Result<DirectionsRoute, DirectionsError> {
        let url = format!(
            "{}/map-direction/v1/driving",
            self.config.base_url.trim_end_matches('/')
        );
        tracing::debug!(
            "requesting {} route via {} waypoints from {url}",
            option.as_str(),
            waypoints.len()
        );

        let mut query = vec![
            ("start", lng_lat(start)),
            ("goal", lng_lat(goal)),
            ("option", option.as_str().to_string()),
        ];
        if let Some(stops) = waypoints_param(waypoints) {
            query.push(("waypoints", stops));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header("X-NCP-APIGW-API-KEY-ID", &self.config.client_id)
            .header("X-NCP-APIGW-API-KEY", &self.config.client_secret)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DirectionsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_naver_route(option, &body)
    }
}

fn lng_lat(point: GeoPoint) -> String {
    format!("{},{}", point.longitude, point.latitude)
}

/// `lng,lat:lng,lat:...`, or nothing without stops.
fn waypoints_param(waypoints: &[GeoPoint]) -> Option<String> {
    if waypoints.is_empty() {
        return None;
    }
    Some(
        waypoints
            .iter()
            .map(|p| lng_lat(*p))
            .collect::<Vec<_>>()
            .join(":"),
    )
}

#[derive(Debug, Deserialize)]
struct NaverResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    route: HashMap<String, Vec<NaverRoute>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaverRoute {
    summary: NaverSummary,
    #[serde(default)]
    path: Vec<[f64; 2]>,
    #[serde(default)]
    guide: Vec<NaverGuide>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaverSummary {
    distance: f64,
    /// milliseconds
    duration: f64,
    #[serde(default)]
    toll_fare: u64,
    #[serde(default)]
    fuel_price: u64,
    #[serde(default)]
    bbox: Option<[[f64; 2]; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaverGuide {
    point_index: usize,
    #[serde(rename = "type")]
    kind: u16,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    distance: f64,
    /// milliseconds
    #[serde(default)]
    duration: f64,
}

/// Converts a Naver driving response body into a route. Paths arrive as
/// `[lng, lat]` pairs and durations in milliseconds.
pub fn parse_naver_route(option: RouteOption, body: &str) -> Result<DirectionsRoute, DirectionsError> {
    let mut response: NaverResponse = serde_json::from_str(body)?;
    if response.code != 0 {
        return Err(DirectionsError::NoRoute(
            response
                .message
                .unwrap_or_else(|| format!("provider code {}", response.code)),
        ));
    }

    let route = response
        .route
        .remove(option.as_str())
        .and_then(|routes| routes.into_iter().next())
        .filter(|route| !route.path.is_empty())
        .ok_or_else(|| DirectionsError::NoRoute(format!("no {} route in response", option.as_str())))?;

    let path: Vec<GeoPoint> = route
        .path
        .iter()
        .map(|[lng, lat]| GeoPoint::new(*lat, *lng))
        .collect();
    let bbox = match route.summary.bbox {
        Some([[min_lng, min_lat], [max_lng, max_lat]]) => [min_lng, min_lat, max_lng, max_lat],
        None => bounding_box(&path, 0.0),
    };
    let guide = route
        .guide
        .into_iter()
        .map(|step| {
            let turn = TurnType::from_code(step.kind);
            GuideStep {
                turn,
                code: step.kind,
                instructions: step
                    .instructions
                    .unwrap_or_else(|| turn_instruction(turn).to_string()),
                distance_meters: step.distance,
                duration_seconds: step.duration / 1000.0,
                point_index: step.point_index,
            }
        })
        .collect();

    Ok(DirectionsRoute {
        option,
        distance_meters: route.summary.distance,
        duration_seconds: route.summary.duration / 1000.0,
        toll_fare: route.summary.toll_fare,
        fuel_price: route.summary.fuel_price,
        path,
        guide,
        bbox,
        used_fallback: false,
    })
}

/// Route lookups that never fail for valid input: whenever the live
/// provider is missing or errors, a synthetic route is returned instead,
/// flagged with `used_fallback`.
#[derive(Clone)]
pub struct RouteService {
    provider: Option<Arc<dyn DirectionsProvider>>,
    seed: Option<u64>,
}

impl RouteService {
    pub fn new(provider: Option<Arc<dyn DirectionsProvider>>, seed: Option<u64>) -> Self {
        Self { provider, seed }
    }

    /// Synthetic routes only.
    pub fn offline(seed: Option<u64>) -> Self {
        Self::new(None, seed)
    }

    pub async fn route(
        &self,
        start: GeoPoint,
        goal: GeoPoint,
        option: RouteOption,
    ) -> Result<DirectionsRoute, CoreError> {
        self.route_via(start, &[], goal, option).await
    }

    /// Like [`route`](Self::route) with intermediate stops. The synthetic
    /// fallback chains one leg per stop.
    pub async fn route_via(
        &self,
        start: GeoPoint,
        waypoints: &[GeoPoint],
        goal: GeoPoint,
        option: RouteOption,
    ) -> Result<DirectionsRoute, CoreError> {
        validate_endpoints(start, goal)?;
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(CoreError::invalid(format!(
                "at most {MAX_WAYPOINTS} waypoints are supported, got {}",
                waypoints.len()
            )));
        }
        if let Some(bad) = waypoints.iter().position(|p| !p.is_valid()) {
            return Err(CoreError::invalid(format!("waypoint {bad} is not a valid coordinate")));
        }

        let Some(provider) = &self.provider else {
            tracing::debug!("no directions provider configured, synthesizing route");
            return self.synthesize_via(start, waypoints, goal, option, None);
        };

        match provider.driving_route(start, goal, waypoints, option).await {
            Ok(route) => {
                tracing::info!(
                    "provider route {}: {:.0} m, {} points",
                    option.as_str(),
                    route.distance_meters,
                    route.path.len()
                );
                Ok(route)
            }
            Err(err) => {
                tracing::warn!("directions provider failed ({err}), falling back to synthetic route");
                self.synthesize_via(start, waypoints, goal, option, None)
            }
        }
    }

    /// One route per provider option, requested concurrently. Failed
    /// options are dropped; if all fail a single synthetic route is returned.
    pub async fn route_options(
        &self,
        start: GeoPoint,
        goal: GeoPoint,
    ) -> Result<Vec<DirectionsRoute>, CoreError> {
        validate_endpoints(start, goal)?;

        let Some(provider) = &self.provider else {
            return Ok(vec![self.synthesize(start, goal, RouteOption::Fastest, None)?]);
        };

        let [fastest, comfort, optimal] = RouteOption::ALL;
        let results = tokio::join!(
            provider.driving_route(start, goal, &[], fastest),
            provider.driving_route(start, goal, &[], comfort),
            provider.driving_route(start, goal, &[], optimal),
        );

        let routes: Vec<DirectionsRoute> = [results.0, results.1, results.2]
            .into_iter()
            .zip(RouteOption::ALL)
            .filter_map(|(result, option)| match result {
                Ok(route) => Some(route),
                Err(err) => {
                    tracing::warn!("route option {} failed: {err}", option.as_str());
                    None
                }
            })
            .collect();

        if routes.is_empty() {
            tracing::warn!("every route option failed, falling back to synthetic route");
            return Ok(vec![self.synthesize(start, goal, RouteOption::Fastest, None)?]);
        }
        Ok(routes)
    }

    pub async fn reroute(
        &self,
        current: GeoPoint,
        goal: GeoPoint,
        option: RouteOption,
    ) -> Result<RerouteResponse, CoreError> {
        let route = self.route(current, goal, option).await?;
        Ok(RerouteResponse {
            route,
            rerouted: true,
            rerouted_at: Utc::now(),
        })
    }

    /// Synthetic route; `seed` overrides the service-wide seed.
    pub fn synthesize(
        &self,
        start: GeoPoint,
        goal: GeoPoint,
        option: RouteOption,
        seed: Option<u64>,
    ) -> Result<DirectionsRoute, CoreError> {
        self.synthesize_via(start, &[], goal, option, seed)
    }

    fn synthesize_via(
        &self,
        start: GeoPoint,
        waypoints: &[GeoPoint],
        goal: GeoPoint,
        option: RouteOption,
        seed: Option<u64>,
    ) -> Result<DirectionsRoute, CoreError> {
        let mut rng = route_rng(seed.or(self.seed));
        let mut route = synthesize_route_via(start, waypoints, goal, &mut rng)?;
        route.option = option;
        Ok(route)
    }
}

fn validate_endpoints(start: GeoPoint, goal: GeoPoint) -> Result<(), CoreError> {
    if !start.is_valid() {
        return Err(CoreError::invalid("start is not a valid coordinate"));
    }
    if !goal.is_valid() {
        return Err(CoreError::invalid("goal is not a valid coordinate"));
    }
    Ok(())
}
