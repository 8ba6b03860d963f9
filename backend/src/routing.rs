use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    error::CoreError,
    geo::{bounding_box, haversine_distance_meters, interpolate},
    models::{
        DeviationCheck, DirectionsRoute, GeoPoint, GuideStep, NearestPointResult, PathInput,
        RouteOption, TurnType,
    },
};

pub const DEFAULT_DEVIATION_THRESHOLD_M: f64 = 50.0;

const STRAIGHT_TOLERANCE_DEG: f64 = 15.0;

const WAYPOINT_SPACING_M: f64 = 2_000.0;
const MIN_WAYPOINT_SEGMENTS: usize = 2;
const MAX_WAYPOINT_SEGMENTS: usize = 8;
const STEPS_PER_SEGMENT: usize = 15;

const ROAD_FACTOR_MIN: f64 = 1.3;
const ROAD_FACTOR_MAX: f64 = 1.5;
const AVERAGE_SPEED_KMH: f64 = 35.0;
const TOLL_FREE_DISTANCE_M: f64 = 10_000.0;
const TOLL_PER_KM: f64 = 100.0;
const FUEL_EFFICIENCY_KM_PER_L: f64 = 10.0;
const FUEL_PRICE_PER_L: f64 = 1_600.0;
const BBOX_MARGIN_DEG: f64 = 0.01;

/// Closest path point to `location` by great-circle distance. The first
/// point wins on ties.
pub fn nearest_point(path: &[GeoPoint], location: GeoPoint) -> Result<NearestPointResult, CoreError> {
    if !location.is_valid() {
        return Err(CoreError::invalid("current location is not a valid coordinate"));
    }
    if let Some(bad) = path.iter().position(|p| !p.is_valid()) {
        return Err(CoreError::invalid(format!("path point {bad} is not a valid coordinate")));
    }

    let mut points = path.iter().copied().enumerate();
    let (_, first) = points
        .next()
        .ok_or_else(|| CoreError::invalid("path must contain at least one point"))?;

    let mut best = NearestPointResult {
        index: 0,
        distance_meters: haversine_distance_meters(location, first),
        point: first,
    };
    for (index, point) in points {
        let distance = haversine_distance_meters(location, point);
        if distance < best.distance_meters {
            best = NearestPointResult {
                index,
                distance_meters: distance,
                point,
            };
        }
    }
    Ok(best)
}

/// True when the nearest path point is strictly farther than `threshold_meters`.
pub fn is_route_deviated(
    path: &[GeoPoint],
    location: GeoPoint,
    threshold_meters: f64,
) -> Result<bool, CoreError> {
    Ok(check_deviation(path, location, threshold_meters)?.is_deviated)
}

pub fn check_deviation(
    path: &[GeoPoint],
    location: GeoPoint,
    threshold_meters: f64,
) -> Result<DeviationCheck, CoreError> {
    if !threshold_meters.is_finite() || threshold_meters < 0.0 {
        return Err(CoreError::invalid(format!(
            "threshold must be a non-negative number of meters, got {threshold_meters}"
        )));
    }
    let nearest = nearest_point(path, location)?;
    Ok(DeviationCheck {
        is_deviated: nearest.distance_meters > threshold_meters,
        nearest_point: nearest,
        threshold_meters,
    })
}

/// Turns a client path into points. Nested pairs and flat arrays follow the
/// provider's `[lng, lat]` order.
pub fn decode_path(input: PathInput) -> Result<Vec<GeoPoint>, CoreError> {
    let points = match input {
        PathInput::Pairs(pairs) => pairs
            .into_iter()
            .map(|[lng, lat]| GeoPoint::new(lat, lng))
            .collect(),
        PathInput::Points(points) => points,
        PathInput::Flat(values) => {
            if values.len() % 2 != 0 {
                return Err(CoreError::invalid(format!(
                    "flat path must hold lng/lat pairs, got {} values",
                    values.len()
                )));
            }
            values
                .chunks_exact(2)
                .map(|pair| GeoPoint::new(pair[1], pair[0]))
                .collect()
        }
    };
    if let Some(bad) = points.iter().position(|p| !p.is_valid()) {
        return Err(CoreError::invalid(format!("path point {bad} is not a valid coordinate")));
    }
    Ok(points)
}

/// Classifies the manoeuvre at `current` when travelling `prev -> current -> next`.
///
/// Direction vectors are taken as (north, east) with the east component
/// scaled by cos(latitude), so a positive signed angle is a clockwise turn
/// on a north-up map. This is a local planar approximation; it is only
/// meaningful for short urban segments away from the poles.
pub fn turn_type(prev: GeoPoint, current: GeoPoint, next: GeoPoint) -> TurnType {
    let east_scale = current.latitude.to_radians().cos();
    let v1 = (
        current.latitude - prev.latitude,
        (current.longitude - prev.longitude) * east_scale,
    );
    let v2 = (
        next.latitude - current.latitude,
        (next.longitude - current.longitude) * east_scale,
    );

    let cross = v1.0 * v2.1 - v1.1 * v2.0;
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    classify_turn_angle(cross.atan2(dot).to_degrees())
}

/// `|angle| < 15` is straight, `angle > 15` is right, anything else is left.
/// Exactly +15 degrees therefore counts as a left turn.
fn classify_turn_angle(angle_deg: f64) -> TurnType {
    if angle_deg.abs() < STRAIGHT_TOLERANCE_DEG {
        TurnType::Straight
    } else if angle_deg > STRAIGHT_TOLERANCE_DEG {
        TurnType::Right
    } else {
        TurnType::Left
    }
}

pub fn turn_instruction(turn: TurnType) -> &'static str {
    match turn {
        TurnType::Straight => "Continue straight",
        TurnType::Left => "Turn left",
        TurnType::Right => "Turn right",
        TurnType::Waypoint => "You have reached a waypoint",
        TurnType::Arrival => "You have arrived at your destination",
    }
}

pub fn estimate_toll_fare(distance_meters: f64) -> u64 {
    if distance_meters > TOLL_FREE_DISTANCE_M {
        (distance_meters / 1000.0 * TOLL_PER_KM).round() as u64
    } else {
        0
    }
}

pub fn estimate_fuel_price(distance_meters: f64) -> u64 {
    (distance_meters / 1000.0 / FUEL_EFFICIENCY_KM_PER_L * FUEL_PRICE_PER_L).round() as u64
}

fn travel_seconds(distance_meters: f64) -> f64 {
    distance_meters / 1000.0 / AVERAGE_SPEED_KMH * 3600.0
}

/// Random source for route synthesis: seeded when reproducibility is wanted.
pub fn route_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Builds a plausible-looking driving route without any road data.
///
/// This is a presentation heuristic used when no directions provider answers.
/// The path is not guaranteed to follow any real road.
///
/// ```text
/// segments  = clamp(floor(straight_m / 2000), 2, 8)
/// waypoints = start, lerp(i / segments) + road offset, ..., goal
/// path      = 15 curved steps per waypoint pair, joins shared
/// distance  = straight_m * U[1.3, 1.5)
/// duration  = distance at 35 km/h
/// ```
///
/// The road offset grows towards mid-route (`sin(ratio * pi)`) so the path
/// leaves and reaches its endpoints smoothly. The first and last path points
/// are exactly `start` and `goal`.
pub fn synthesize_route<R: Rng + ?Sized>(
    start: GeoPoint,
    goal: GeoPoint,
    rng: &mut R,
) -> Result<DirectionsRoute, CoreError> {
    synthesize_route_via(start, &[], goal, rng)
}

/// Chains one synthetic leg per consecutive stop in `start, stops.., goal`.
/// Each intermediate stop is a path point and gets a waypoint guide step.
pub fn synthesize_route_via<R: Rng + ?Sized>(
    start: GeoPoint,
    stops: &[GeoPoint],
    goal: GeoPoint,
    rng: &mut R,
) -> Result<DirectionsRoute, CoreError> {
    if !start.is_valid() || !goal.is_valid() {
        return Err(CoreError::invalid("start and goal must be valid coordinates"));
    }
    if let Some(bad) = stops.iter().position(|p| !p.is_valid()) {
        return Err(CoreError::invalid(format!("waypoint {bad} is not a valid coordinate")));
    }

    let mut legs = Vec::with_capacity(stops.len() + 2);
    legs.push(start);
    legs.extend_from_slice(stops);
    legs.push(goal);
    let last_leg = legs.len() - 2;

    let mut path = vec![start];
    let mut guide = Vec::new();
    let mut distance_meters = 0.0;

    for (leg, pair) in legs.windows(2).enumerate() {
        let straight_m = haversine_distance_meters(pair[0], pair[1]);
        let waypoints = generate_waypoints(pair[0], pair[1], straight_m, rng);
        let offset = path.len() - 1;

        path.reserve((waypoints.len() - 1) * STEPS_PER_SEGMENT);
        for segment in waypoints.windows(2) {
            extend_segment(&mut path, segment[0], segment[1]);
        }

        guide.extend(waypoints.windows(3).enumerate().map(|(i, w)| {
            let turn = turn_type(w[0], w[1], w[2]);
            let leg_m = haversine_distance_meters(w[0], w[1]);
            GuideStep {
                turn,
                code: turn.code(),
                instructions: turn_instruction(turn).to_string(),
                distance_meters: leg_m,
                duration_seconds: travel_seconds(leg_m),
                point_index: offset + (i + 1) * STEPS_PER_SEGMENT,
            }
        }));

        let stop = if leg == last_leg {
            TurnType::Arrival
        } else {
            TurnType::Waypoint
        };
        guide.push(GuideStep {
            turn: stop,
            code: stop.code(),
            instructions: turn_instruction(stop).to_string(),
            distance_meters: 0.0,
            duration_seconds: 0.0,
            point_index: path.len() - 1,
        });

        distance_meters += (straight_m * rng.gen_range(ROAD_FACTOR_MIN..ROAD_FACTOR_MAX)).round();
    }

    tracing::debug!(
        "synthesized route: {} legs, {} points, {:.0} m",
        legs.len() - 1,
        path.len(),
        distance_meters
    );

    Ok(DirectionsRoute {
        option: RouteOption::default(),
        distance_meters,
        duration_seconds: travel_seconds(distance_meters).round(),
        toll_fare: estimate_toll_fare(distance_meters),
        fuel_price: estimate_fuel_price(distance_meters),
        guide,
        bbox: bounding_box(&legs, BBOX_MARGIN_DEG),
        path,
        used_fallback: true,
    })
}

fn generate_waypoints<R: Rng + ?Sized>(
    start: GeoPoint,
    goal: GeoPoint,
    straight_m: f64,
    rng: &mut R,
) -> Vec<GeoPoint> {
    let segments = ((straight_m / WAYPOINT_SPACING_M).floor() as usize)
        .clamp(MIN_WAYPOINT_SEGMENTS, MAX_WAYPOINT_SEGMENTS);

    let mut waypoints = Vec::with_capacity(segments + 1);
    waypoints.push(start);
    for i in 1..segments {
        let ratio = i as f64 / segments as f64;
        let base_offset = (ratio * PI).sin() * 0.008 * (straight_m / 5_000.0).min(1.0);
        let zigzag = (ratio * PI * 4.0).sin() * 0.003;

        let mut point = interpolate(start, goal, ratio);
        point.latitude += (rng.gen::<f64>() - 0.5) * base_offset + zigzag * 0.5;
        point.longitude += (rng.gen::<f64>() - 0.5) * base_offset * 1.5 + zigzag * 0.8;
        waypoints.push(point);
    }
    waypoints.push(goal);
    waypoints
}

/// Appends the curved points from `from` (exclusive) to `to` (inclusive).
fn extend_segment(path: &mut Vec<GeoPoint>, from: GeoPoint, to: GeoPoint) {
    for step in 1..STEPS_PER_SEGMENT {
        let ratio = step as f64 / STEPS_PER_SEGMENT as f64;
        let main_curve = (ratio * PI * 2.0).sin() * 0.0008;
        let ripple = (ratio * PI * 6.0).sin() * 0.0003;
        let s_bend = (ratio * PI * 1.5).sin() * 0.0006;

        let mut point = interpolate(from, to, ratio);
        point.latitude += main_curve + ripple + s_bend * 0.7;
        point.longitude += main_curve * 1.2 + ripple * 0.6 + s_bend;
        path.push(point);
    }
    path.push(to);
}
