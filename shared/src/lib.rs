use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CongestionTier {
    Quiet,
    Normal,
    Congested,
    Unknown,
}

/// One parking lot as known at recommendation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotStatusSnapshot {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub current_occupancy: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    #[serde(flatten)]
    pub lot: LotStatusSnapshot,
    pub distance_km: f64,
    pub available_spaces: u32,
    pub congestion_tier: CongestionTier,
    pub congestion_score: u8,
    pub distance_score: f64,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<ScoredRecommendation>,
    pub total_found: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub destination: GeoPoint,
    #[serde(default)]
    pub max_results: Option<i64>,
    #[serde(default)]
    pub radius_km: Option<f64>,
}

/// Lot detail view: the snapshot enriched with its congestion reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotDetail {
    #[serde(flatten)]
    pub lot: LotStatusSnapshot,
    pub available_spaces: u32,
    pub congestion_tier: CongestionTier,
}

/// Route preference understood by the directions provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteOption {
    #[default]
    #[serde(rename = "trafast")]
    Fastest,
    #[serde(rename = "tracomfort")]
    Comfort,
    #[serde(rename = "traoptimal")]
    Optimal,
}

impl RouteOption {
    pub const ALL: [RouteOption; 3] = [Self::Fastest, Self::Comfort, Self::Optimal];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fastest => "trafast",
            Self::Comfort => "tracomfort",
            Self::Optimal => "traoptimal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnType {
    Straight,
    Left,
    Right,
    /// Reached an intermediate stop.
    Waypoint,
    Arrival,
}

impl TurnType {
    /// Guide code used by the directions provider.
    pub fn code(self) -> u16 {
        match self {
            Self::Straight => 1,
            Self::Left => 2,
            Self::Right => 3,
            Self::Waypoint => 87,
            Self::Arrival => 88,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            2 | 12 => Self::Left,
            3 | 13 => Self::Right,
            87 => Self::Waypoint,
            88 => Self::Arrival,
            _ => Self::Straight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideStep {
    pub turn: TurnType,
    pub code: u16,
    pub instructions: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub point_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRoute {
    pub option: RouteOption,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub toll_fare: u64,
    pub fuel_price: u64,
    pub path: Vec<GeoPoint>,
    pub guide: Vec<GuideStep>,
    /// `[min_lng, min_lat, max_lng, max_lat]`
    pub bbox: [f64; 4],
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub start: GeoPoint,
    pub goal: GeoPoint,
    #[serde(default)]
    pub option: RouteOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizeRequest {
    pub start: GeoPoint,
    pub goal: GeoPoint,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointDirectionsRequest {
    pub start: GeoPoint,
    pub goal: GeoPoint,
    #[serde(default)]
    pub waypoints: Vec<GeoPoint>,
    #[serde(default)]
    pub option: RouteOption,
}

/// A route path as sent by clients: provider `[lng, lat]` pairs, explicit
/// points, or the provider's flat `[lng, lat, lng, lat, ...]` array.
///
/// `Pairs` comes first: serde would otherwise read a two-element array as a
/// `GeoPoint` in `[latitude, longitude]` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathInput {
    Pairs(Vec<[f64; 2]>),
    Points(Vec<GeoPoint>),
    Flat(Vec<f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationCheckRequest {
    pub current_location: GeoPoint,
    pub path: PathInput,
    #[serde(default = "default_threshold_meters")]
    pub threshold_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestPointResult {
    pub index: usize,
    pub distance_meters: f64,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationCheck {
    pub is_deviated: bool,
    pub nearest_point: NearestPointResult,
    pub threshold_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerouteRequest {
    pub current_location: GeoPoint,
    pub goal: GeoPoint,
    #[serde(default)]
    pub option: RouteOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

pub fn default_threshold_meters() -> f64 {
    50.0
}
