pub mod config;
pub mod congestion;
pub mod directions;
pub mod error;
pub mod geo;
pub mod models;
pub mod recommend;
pub mod repository;
pub mod routing;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::RegionPolicy;
use crate::congestion::lot_detail;
use crate::directions::RouteService;
use crate::error::{CoreError, ServiceError};
use crate::models::{
    ApiError, DeviationCheck, DeviationCheckRequest, DirectionsRequest, DirectionsRoute, GeoPoint,
    LotDetail, RecommendRequest, RecommendationResult, RerouteRequest, RerouteResponse,
    SynthesizeRequest, WaypointDirectionsRequest,
};
use crate::recommend::{DEFAULT_MAX_RESULTS, DEFAULT_RADIUS_KM, recommend};
use crate::repository::LotStatusRepository;
use crate::routing::{check_deviation, decode_path};

/// Upper bound on recommendations per request at the HTTP boundary.
pub const MAX_RECOMMENDATIONS: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub lots: Arc<dyn LotStatusRepository>,
    pub routes: RouteService,
    pub region: Option<RegionPolicy>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/parking/recommend", post(recommend_handler))
        .route("/api/parking/detail/:code", get(lot_detail_handler))
        .route("/api/navigation/directions", post(directions_handler))
        .route(
            "/api/navigation/directions/waypoints",
            post(waypoint_directions_handler),
        )
        .route(
            "/api/navigation/directions/multiple",
            post(multiple_directions_handler),
        )
        .route(
            "/api/navigation/route/deviation-check",
            post(deviation_check_handler),
        )
        .route("/api/navigation/route/reroute", post(reroute_handler))
        .route("/api/navigation/route/synthesize", post(synthesize_handler))
        .layer(cors)
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

async fn health_handler() -> &'static str {
    "ok"
}

async fn recommend_handler(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> ApiResult<RecommendationResult> {
    state.check_region(&[req.destination])?;

    let max_results = match req.max_results {
        None => DEFAULT_MAX_RESULTS,
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(MAX_RECOMMENDATIONS),
        Some(n) => {
            return Err(api_error(CoreError::InvalidArgument(format!(
                "max_results must be at least 1, got {n}"
            ))))
        }
    };
    let radius_km = req.radius_km.unwrap_or(DEFAULT_RADIUS_KM);

    let lots = state.lots.latest_snapshots().await.map_err(api_error)?;
    tracing::info!(
        "recommend near ({}, {}) among {} lots, max {max_results}, radius {radius_km} km",
        req.destination.latitude,
        req.destination.longitude,
        lots.len()
    );

    recommend(req.destination, &lots, max_results, radius_km)
        .map(Json)
        .map_err(api_error)
}

async fn lot_detail_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<LotDetail> {
    let lot = state
        .lots
        .find(&code)
        .await
        .map_err(api_error)?
        .ok_or_else(|| api_error(ServiceError::LotNotFound(code)))?;
    Ok(Json(lot_detail(lot)))
}

async fn directions_handler(
    State(state): State<AppState>,
    Json(req): Json<DirectionsRequest>,
) -> ApiResult<DirectionsRoute> {
    state.check_region(&[req.start, req.goal])?;
    tracing::info!("directions request: {:?} -> {:?}", req.start, req.goal);

    state
        .routes
        .route(req.start, req.goal, req.option)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn waypoint_directions_handler(
    State(state): State<AppState>,
    Json(req): Json<WaypointDirectionsRequest>,
) -> ApiResult<DirectionsRoute> {
    let mut stops = Vec::with_capacity(req.waypoints.len() + 2);
    stops.push(req.start);
    stops.extend_from_slice(&req.waypoints);
    stops.push(req.goal);
    state.check_region(&stops)?;
    tracing::info!(
        "directions request: {:?} -> {:?} via {} waypoints",
        req.start,
        req.goal,
        req.waypoints.len()
    );

    state
        .routes
        .route_via(req.start, &req.waypoints, req.goal, req.option)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn multiple_directions_handler(
    State(state): State<AppState>,
    Json(req): Json<DirectionsRequest>,
) -> ApiResult<Vec<DirectionsRoute>> {
    state.check_region(&[req.start, req.goal])?;

    state
        .routes
        .route_options(req.start, req.goal)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn deviation_check_handler(
    Json(req): Json<DeviationCheckRequest>,
) -> ApiResult<DeviationCheck> {
    let path = decode_path(req.path).map_err(api_error)?;
    let check =
        check_deviation(&path, req.current_location, req.threshold_meters).map_err(api_error)?;
    if check.is_deviated {
        tracing::debug!(
            "location {:?} is {:.1} m from the route",
            req.current_location,
            check.nearest_point.distance_meters
        );
    }
    Ok(Json(check))
}

async fn reroute_handler(
    State(state): State<AppState>,
    Json(req): Json<RerouteRequest>,
) -> ApiResult<RerouteResponse> {
    state.check_region(&[req.current_location, req.goal])?;
    tracing::info!(
        "rerouting from {:?} to {:?}",
        req.current_location,
        req.goal
    );

    state
        .routes
        .reroute(req.current_location, req.goal, req.option)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn synthesize_handler(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> ApiResult<DirectionsRoute> {
    state
        .routes
        .synthesize(req.start, req.goal, Default::default(), req.seed)
        .map(Json)
        .map_err(api_error)
}

impl AppState {
    fn check_region(&self, points: &[GeoPoint]) -> Result<(), (StatusCode, Json<ApiError>)> {
        let Some(policy) = self.region else {
            return Ok(());
        };
        match points.iter().find(|p| !policy.contains(**p)) {
            Some(p) => Err(api_error(ServiceError::OutOfRegion(format!(
                "({}, {})",
                p.latitude, p.longitude
            )))),
            None => Ok(()),
        }
    }
}

fn api_error(err: impl Into<ServiceError>) -> (StatusCode, Json<ApiError>) {
    let err = err.into();
    let status = match &err {
        ServiceError::Core(CoreError::InvalidArgument(_)) | ServiceError::OutOfRegion(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::LotNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Repository(e) => {
            tracing::error!("lot repository failure: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
