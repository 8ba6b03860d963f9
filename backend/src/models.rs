use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use shared::{
    ApiError, CongestionTier, DeviationCheck, DeviationCheckRequest, DirectionsRequest,
    DirectionsRoute, GeoPoint, GuideStep, LotDetail, LotStatusSnapshot, NearestPointResult,
    PathInput, RecommendRequest, RecommendationResult, RerouteRequest, RouteOption,
    ScoredRecommendation, SynthesizeRequest, TurnType, WaypointDirectionsRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerouteResponse {
    #[serde(flatten)]
    pub route: DirectionsRoute,
    pub rerouted: bool,
    pub rerouted_at: DateTime<Utc>,
}
