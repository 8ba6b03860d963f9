use crate::models::{CongestionTier, LotDetail, LotStatusSnapshot};

/// Availability at or below this percentage is `Congested`.
const CONGESTED_MAX_RATE: f64 = 10.0;
/// Availability at or below this percentage (and above congested) is `Normal`.
const NORMAL_MAX_RATE: f64 = 30.0;

/// Tier from the share of free spaces. Occupancy above capacity is not
/// rejected; it simply yields a negative availability rate.
pub fn classify(capacity: u32, occupancy: u32) -> CongestionTier {
    if capacity == 0 {
        return CongestionTier::Unknown;
    }
    let capacity = f64::from(capacity);
    let available_rate = (capacity - f64::from(occupancy)) / capacity * 100.0;

    if available_rate <= CONGESTED_MAX_RATE {
        CongestionTier::Congested
    } else if available_rate <= NORMAL_MAX_RATE {
        CongestionTier::Normal
    } else {
        CongestionTier::Quiet
    }
}

pub fn score_for(tier: CongestionTier) -> u8 {
    match tier {
        CongestionTier::Quiet => 5,
        CongestionTier::Normal => 3,
        CongestionTier::Congested | CongestionTier::Unknown => 1,
    }
}

pub fn available_spaces(capacity: u32, occupancy: u32) -> u32 {
    capacity.saturating_sub(occupancy)
}

/// Detail view of a single lot: the snapshot plus its congestion reading.
pub fn lot_detail(lot: LotStatusSnapshot) -> LotDetail {
    LotDetail {
        available_spaces: available_spaces(lot.capacity, lot.current_occupancy),
        congestion_tier: classify(lot.capacity, lot.current_occupancy),
        lot,
    }
}
