use crate::{
    congestion::{available_spaces, classify, score_for},
    error::CoreError,
    geo::{haversine_distance_km, round2},
    models::{GeoPoint, LotStatusSnapshot, RecommendationResult, ScoredRecommendation},
};

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_MAX_RESULTS: usize = 5;

const CONGESTION_WEIGHT: f64 = 0.6;
const DISTANCE_WEIGHT: f64 = 0.4;
const MAX_DISTANCE_SCORE: f64 = 10.0;

/// Rank parking lots around `destination`.
///
/// # Algorithm
///
/// 1. Distance from the destination to every lot with a known location,
///    rounded to 2 decimals; lots farther than `radius_km` are dropped.
/// 2. Congestion tier and score from capacity/occupancy.
/// 3. Distance score scaled against the farthest surviving candidate:
///    ```text
///    distance_score = (max_distance - distance) / max_distance * 10
///    total_score    = congestion_score * 0.6 + distance_score * 0.4
///    ```
///    When every candidate sits at distance 0, all distance scores are 10.
/// 4. Stable descending sort on `total_score`, truncated to `max_results`.
///
/// An empty neighbourhood is not an error: the result carries no
/// recommendations and a message saying so.
///
/// # Errors
/// `CoreError::InvalidArgument` for an invalid destination, a zero
/// `max_results`, or a negative / non-finite radius.
pub fn recommend(
    destination: GeoPoint,
    lots: &[LotStatusSnapshot],
    max_results: usize,
    radius_km: f64,
) -> Result<RecommendationResult, CoreError> {
    if !destination.is_valid() {
        return Err(CoreError::invalid(format!(
            "destination ({}, {}) is not a valid coordinate",
            destination.latitude, destination.longitude
        )));
    }
    if max_results == 0 {
        return Err(CoreError::invalid("max_results must be at least 1"));
    }
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(CoreError::invalid(format!(
            "radius_km must be a non-negative number, got {radius_km}"
        )));
    }

    let mut candidates: Vec<ScoredRecommendation> = lots
        .iter()
        .filter_map(|lot| score_candidate(destination, lot))
        .filter(|rec| rec.distance_km <= radius_km)
        .collect();

    if candidates.is_empty() {
        tracing::debug!(
            "no candidates among {} lots within {radius_km} km of ({}, {})",
            lots.len(),
            destination.latitude,
            destination.longitude
        );
        return Ok(RecommendationResult {
            recommendations: Vec::new(),
            total_found: 0,
            message: format!("no parking lots within {radius_km} km"),
        });
    }

    let max_distance = candidates
        .iter()
        .map(|rec| rec.distance_km)
        .fold(0.0, f64::max);

    for rec in &mut candidates {
        rec.distance_score = if max_distance > 0.0 {
            (max_distance - rec.distance_km) / max_distance * MAX_DISTANCE_SCORE
        } else {
            MAX_DISTANCE_SCORE
        };
        rec.total_score = f64::from(rec.congestion_score) * CONGESTION_WEIGHT
            + rec.distance_score * DISTANCE_WEIGHT;
    }

    // sort_by is stable: equal scores keep their input order
    candidates.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

    let total_found = candidates.len();
    candidates.truncate(max_results);

    tracing::debug!(
        "recommending {} of {total_found} lots within {radius_km} km",
        candidates.len()
    );

    Ok(RecommendationResult {
        message: format!("recommending {} parking lots", candidates.len()),
        recommendations: candidates,
        total_found,
    })
}

fn score_candidate(destination: GeoPoint, lot: &LotStatusSnapshot) -> Option<ScoredRecommendation> {
    let location = lot.location.filter(GeoPoint::is_valid)?;
    let distance = haversine_distance_km(destination, location);
    if !distance.is_finite() {
        return None;
    }

    let tier = classify(lot.capacity, lot.current_occupancy);
    Some(ScoredRecommendation {
        lot: lot.clone(),
        distance_km: round2(distance),
        available_spaces: available_spaces(lot.capacity, lot.current_occupancy),
        congestion_tier: tier,
        congestion_score: score_for(tier),
        distance_score: 0.0,
        total_score: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_KM;
    use crate::models::CongestionTier;

    const DESTINATION: GeoPoint = GeoPoint::new(37.5, 127.0);

    /// A point `km` due north of the destination.
    fn north_of_destination(km: f64) -> GeoPoint {
        let dlat = (km / EARTH_RADIUS_KM).to_degrees();
        GeoPoint::new(DESTINATION.latitude + dlat, DESTINATION.longitude)
    }

    fn lot(code: &str, km: f64, capacity: u32, occupancy: u32) -> LotStatusSnapshot {
        LotStatusSnapshot {
            code: code.into(),
            name: format!("lot {code}"),
            location: Some(north_of_destination(km)),
            capacity,
            current_occupancy: occupancy,
            ..Default::default()
        }
    }

    fn codes(result: &RecommendationResult) -> Vec<&str> {
        result
            .recommendations
            .iter()
            .map(|r| r.lot.code.as_str())
            .collect()
    }

    #[test]
    fn quiet_lot_beats_congested_lot_at_equal_distance() {
        let lots = vec![lot("busy", 2.0, 100, 95), lot("calm", 2.0, 100, 10)];
        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();
        assert_eq!(codes(&result), vec!["calm", "busy"]);
        assert_eq!(result.recommendations[0].congestion_tier, CongestionTier::Quiet);
        assert_eq!(result.recommendations[1].congestion_tier, CongestionTier::Congested);
    }

    #[test]
    fn radius_boundary_uses_reported_distance() {
        let lots = vec![lot("outside", 10.01, 10, 0), lot("inside", 9.99, 10, 0)];
        let result = recommend(DESTINATION, &lots, 5, 10.0).unwrap();
        assert_eq!(codes(&result), vec!["inside"]);
        assert_eq!(result.total_found, 1);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let lots = vec![
            lot("first", 3.0, 100, 50),
            lot("second", 3.0, 100, 50),
            lot("third", 3.0, 100, 50),
        ];
        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();
        assert_eq!(codes(&result), vec!["first", "second", "third"]);
    }

    #[test]
    fn single_candidate_gets_full_distance_score() {
        let lots = vec![lot("only", 4.0, 100, 50)];
        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();
        // max distance is the lot's own distance, so the score is 0
        assert_eq!(result.recommendations[0].distance_score, 0.0);

        let at_destination = vec![LotStatusSnapshot {
            location: Some(DESTINATION),
            ..lot("here", 0.0, 100, 50)
        }];
        let result = recommend(DESTINATION, &at_destination, 5, DEFAULT_RADIUS_KM).unwrap();
        assert_eq!(result.recommendations[0].distance_score, 10.0);
        assert!((result.recommendations[0].total_score - (5.0 * 0.6 + 10.0 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn scores_follow_weighted_formula() {
        let lots = vec![lot("near", 1.0, 100, 80), lot("far", 4.0, 100, 10)];
        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();

        let near = result.recommendations.iter().find(|r| r.lot.code == "near").unwrap();
        let far = result.recommendations.iter().find(|r| r.lot.code == "far").unwrap();
        assert_eq!(near.distance_km, 1.0);
        assert_eq!(far.distance_km, 4.0);
        assert!((near.distance_score - 7.5).abs() < 1e-9);
        assert_eq!(far.distance_score, 0.0);
        assert!((near.total_score - (3.0 * 0.6 + 7.5 * 0.4)).abs() < 1e-9);
        assert!((far.total_score - 5.0 * 0.6).abs() < 1e-9);
        assert_eq!(codes(&result), vec!["near", "far"]);
    }

    #[test]
    fn truncates_to_max_results_and_reports_total() {
        let lots: Vec<_> = (0..8).map(|i| lot(&i.to_string(), i as f64, 10, 0)).collect();
        let result = recommend(DESTINATION, &lots, 3, DEFAULT_RADIUS_KM).unwrap();
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.total_found, 8);
        assert_eq!(codes(&result), vec!["0", "1", "2"]);
    }

    #[test]
    fn lots_without_location_are_skipped() {
        let mut unknown = lot("nowhere", 1.0, 10, 0);
        unknown.location = None;
        let mut broken = lot("broken", 1.0, 10, 0);
        broken.location = Some(GeoPoint::new(f64::NAN, 127.0));
        let lots = vec![unknown, broken, lot("ok", 1.0, 10, 0)];

        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();
        assert_eq!(codes(&result), vec!["ok"]);
    }

    #[test]
    fn empty_neighbourhood_is_a_normal_result() {
        let lots = vec![lot("far", 25.0, 10, 0)];
        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();
        assert!(result.recommendations.is_empty());
        assert_eq!(result.total_found, 0);
        assert!(result.message.contains("no parking lots within"));
    }

    #[test]
    fn available_spaces_never_negative() {
        let lots = vec![lot("over", 1.0, 10, 14)];
        let result = recommend(DESTINATION, &lots, 5, DEFAULT_RADIUS_KM).unwrap();
        assert_eq!(result.recommendations[0].available_spaces, 0);
    }

    #[test]
    fn rejects_invalid_arguments() {
        let lots = vec![lot("a", 1.0, 10, 0)];
        assert!(matches!(
            recommend(GeoPoint::new(f64::NAN, 0.0), &lots, 5, 10.0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            recommend(DESTINATION, &lots, 0, 10.0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            recommend(DESTINATION, &lots, 5, f64::INFINITY),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            recommend(DESTINATION, &lots, 5, -1.0),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_lot() -> impl Strategy<Value = LotStatusSnapshot> {
            (0.0..15.0f64, 0u32..200, 0u32..250).prop_map(|(km, capacity, occupancy)| {
                lot("p", km, capacity, occupancy)
            })
        }

        proptest! {
            #[test]
            fn prop_output_sorted_and_bounded(
                lots in prop::collection::vec(arb_lot(), 0..30),
                max in 1usize..10
            ) {
                let result = recommend(DESTINATION, &lots, max, DEFAULT_RADIUS_KM).unwrap();
                prop_assert!(result.recommendations.len() <= max);
                prop_assert!(result.recommendations.len() <= result.total_found);
                for pair in result.recommendations.windows(2) {
                    prop_assert!(pair[0].total_score >= pair[1].total_score);
                }
                for rec in &result.recommendations {
                    prop_assert!(rec.distance_km <= DEFAULT_RADIUS_KM);
                    prop_assert!((0.0..=10.0).contains(&rec.distance_score));
                }
            }
        }
    }
}
