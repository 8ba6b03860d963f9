use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{GeoPoint, LotStatusSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to read lot snapshot: {0}")]
    Io(#[from] io::Error),
    #[error("invalid lot snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of current parking lot state.
///
/// The persistence layer owns storage; the scoring core only ever sees the
/// typed snapshots handed out here.
#[async_trait]
pub trait LotStatusRepository: Send + Sync {
    /// Latest known state of every lot.
    async fn latest_snapshots(&self) -> Result<Vec<LotStatusSnapshot>, RepositoryError>;

    /// Latest known state of one lot, `None` if the code is unknown.
    async fn find(&self, code: &str) -> Result<Option<LotStatusSnapshot>, RepositoryError> {
        Ok(self
            .latest_snapshots()
            .await?
            .into_iter()
            .find(|lot| lot.code == code))
    }
}

/// Document-store values arrive as either JSON numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    fn as_count(&self) -> u32 {
        self.as_f64()
            .map(|n| n.max(0.0).min(f64::from(u32::MAX)) as u32)
            .unwrap_or(0)
    }

    fn into_text(self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// Raw lot status record as stored by the document store.
#[derive(Debug, Clone, Deserialize)]
pub struct LotRecord {
    pub parking_code: LooseNumber,
    #[serde(default)]
    pub parking_name: Option<String>,
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub lat_wgs84: Option<LooseNumber>,
    #[serde(default)]
    pub lng_wgs84: Option<LooseNumber>,
    #[serde(default)]
    pub capacity: Option<LooseNumber>,
    #[serde(default)]
    pub cur_parking: Option<LooseNumber>,
    #[serde(default)]
    pub cur_parking_time: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub pay_yn_name: Option<String>,
    #[serde(default)]
    pub weekday_begin: Option<String>,
    #[serde(default)]
    pub weekday_end: Option<String>,
}

impl LotRecord {
    /// Typed snapshot; unparseable or out-of-range coordinates leave the
    /// location empty and missing counts read as zero.
    pub fn into_snapshot(self) -> LotStatusSnapshot {
        let lat = self.lat_wgs84.as_ref().and_then(LooseNumber::as_f64);
        let lng = self.lng_wgs84.as_ref().and_then(LooseNumber::as_f64);
        let location = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)).filter(GeoPoint::is_valid),
            _ => None,
        };

        LotStatusSnapshot {
            code: self.parking_code.into_text(),
            name: self.parking_name.unwrap_or_default(),
            address: self.addr.unwrap_or_default(),
            location,
            capacity: self.capacity.as_ref().map_or(0, LooseNumber::as_count),
            current_occupancy: self.cur_parking.as_ref().map_or(0, LooseNumber::as_count),
            phone: self.tel,
            pay_type: self.pay_yn_name,
            weekday_begin: self.weekday_begin,
            weekday_end: self.weekday_end,
            observed_at: self.cur_parking_time,
        }
    }
}

/// Snapshot exported from the document store as a JSON array of records,
/// loaded once at startup.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    lots: Vec<LotStatusSnapshot>,
}

impl JsonFileRepository {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, RepositoryError> {
        let records: Vec<LotRecord> = serde_json::from_reader(reader)?;
        let lots: Vec<LotStatusSnapshot> = records.into_iter().map(LotRecord::into_snapshot).collect();
        let unlocated = lots.iter().filter(|lot| lot.location.is_none()).count();
        if unlocated > 0 {
            tracing::warn!("{unlocated} of {} lots have no usable coordinates", lots.len());
        }
        Ok(Self { lots })
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}

#[async_trait]
impl LotStatusRepository for JsonFileRepository {
    async fn latest_snapshots(&self) -> Result<Vec<LotStatusSnapshot>, RepositoryError> {
        Ok(self.lots.clone())
    }
}

/// Fixed, already-typed snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    lots: Vec<LotStatusSnapshot>,
}

impl InMemoryRepository {
    pub fn new(lots: Vec<LotStatusSnapshot>) -> Self {
        Self { lots }
    }
}

#[async_trait]
impl LotStatusRepository for InMemoryRepository {
    async fn latest_snapshots(&self) -> Result<Vec<LotStatusSnapshot>, RepositoryError> {
        Ok(self.lots.clone())
    }
}
