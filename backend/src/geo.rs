use crate::models::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6_371.0;
pub const EARTH_RADIUS_M: f64 = 6_371e3;

/// Great-circle distance in kilometers.
///
/// Inputs are assumed to be finite coordinates; callers validate before
/// calling.
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_with_radius(a, b, EARTH_RADIUS_KM)
}

/// Great-circle distance in meters.
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_with_radius(a, b, EARTH_RADIUS_M)
}

fn haversine_with_radius(a: GeoPoint, b: GeoPoint, radius: f64) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    radius * c
}

/// Linear interpolation in lat/lng space.
pub fn interpolate(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    GeoPoint {
        latitude: a.latitude + (b.latitude - a.latitude) * t,
        longitude: a.longitude + (b.longitude - a.longitude) * t,
    }
}

/// `[min_lng, min_lat, max_lng, max_lat]` expanded by `margin_deg` on every side.
/// An empty input yields an all-zero box.
pub fn bounding_box(points: &[GeoPoint], margin_deg: f64) -> [f64; 4] {
    let Some(first) = points.first() else {
        return [0.0; 4];
    };
    let mut bbox = [first.longitude, first.latitude, first.longitude, first.latitude];
    for p in &points[1..] {
        bbox[0] = bbox[0].min(p.longitude);
        bbox[1] = bbox[1].min(p.latitude);
        bbox[2] = bbox[2].max(p.longitude);
        bbox[3] = bbox[3].max(p.latitude);
    }
    [
        bbox[0] - margin_deg,
        bbox[1] - margin_deg,
        bbox[2] + margin_deg,
        bbox[3] + margin_deg,
    ]
}

/// Round to two decimal places, the precision distances are reported with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEOUL_CITY_HALL: GeoPoint = GeoPoint::new(37.5663, 126.9779);
    const GANGNAM_STATION: GeoPoint = GeoPoint::new(37.4979, 127.0276);

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine_distance_km(SEOUL_CITY_HALL, SEOUL_CITY_HALL), 0.0);
        assert_eq!(haversine_distance_meters(GANGNAM_STATION, GANGNAM_STATION), 0.0);
    }

    #[test]
    fn test_city_hall_to_gangnam() {
        let km = haversine_distance_km(SEOUL_CITY_HALL, GANGNAM_STATION);
        assert!((8.4..=8.6).contains(&km), "got {km}");
    }

    #[test]
    fn test_meters_and_km_agree() {
        let km = haversine_distance_km(SEOUL_CITY_HALL, GANGNAM_STATION);
        let m = haversine_distance_meters(SEOUL_CITY_HALL, GANGNAM_STATION);
        assert!((m - km * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_longitude_on_equator() {
        let m = haversine_distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((m - 111_195.0).abs() < 10.0);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let d = haversine_distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_interpolate_endpoints() {
        assert_eq!(interpolate(SEOUL_CITY_HALL, GANGNAM_STATION, 0.0), SEOUL_CITY_HALL);
        let mid = interpolate(GeoPoint::new(0.0, 0.0), GeoPoint::new(2.0, 4.0), 0.5);
        assert_eq!(mid, GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_bounding_box_with_margin() {
        let bbox = bounding_box(&[SEOUL_CITY_HALL, GANGNAM_STATION], 0.01);
        assert!((bbox[0] - 126.9679).abs() < 1e-9);
        assert!((bbox[1] - 37.4879).abs() < 1e-9);
        assert!((bbox[2] - 127.0376).abs() < 1e-9);
        assert!((bbox[3] - 37.5763).abs() < 1e-9);
        assert_eq!(bounding_box(&[], 1.0), [0.0; 4]);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.456), 8.46);
        assert_eq!(round2(8.454), 8.45);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_point() -> impl Strategy<Value = GeoPoint> {
            (-90.0..=90.0, -180.0..=180.0).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
        }

        proptest! {
            #[test]
            fn prop_haversine_symmetric(a in valid_point(), b in valid_point()) {
                let ab = haversine_distance_km(a, b);
                let ba = haversine_distance_km(b, a);
                prop_assert!((ab - ba).abs() < 1e-9);
            }

            #[test]
            fn prop_haversine_identity(a in valid_point()) {
                prop_assert_eq!(haversine_distance_km(a, a), 0.0);
            }

            #[test]
            fn prop_haversine_bounded(a in valid_point(), b in valid_point()) {
                let d = haversine_distance_km(a, b);
                prop_assert!(d >= 0.0);
                prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
            }

            #[test]
            fn prop_triangle_inequality(a in valid_point(), b in valid_point(), c in valid_point()) {
                let ac = haversine_distance_km(a, c);
                let via_b = haversine_distance_km(a, b) + haversine_distance_km(b, c);
                prop_assert!(ac <= via_b + 1e-6);
            }
        }
    }
}
