use crate::geometry::is_valid_position;
use crate::traits::Search;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Operator name used when the source data has none.
pub const UNKNOWN_OPERATOR: &str = "Unknown";

/// One speed test tile or sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub operator: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub download_speed: Option<f64>,
    pub upload_speed: Option<f64>,
    pub latency: Option<f64>,
}

impl MeasurementRecord {
    /// An empty `operator` is stored as [`UNKNOWN_OPERATOR`].
    pub fn new(operator: &str, longitude: Option<f64>, latitude: Option<f64>) -> Self {
        let operator = if operator.is_empty() {
            UNKNOWN_OPERATOR
        } else {
            operator
        };
        MeasurementRecord {
            operator: operator.to_string(),
            longitude,
            latitude,
            download_speed: None,
            upload_speed: None,
            latency: None,
        }
    }

    pub fn at(operator: &str, longitude: f64, latitude: f64) -> Self {
        Self::new(operator, Some(longitude), Some(latitude))
    }

    pub fn with_download(mut self, download_speed: f64) -> Self {
        self.download_speed = measure(download_speed);
        self
    }

    pub fn with_upload(mut self, upload_speed: f64) -> Self {
        self.upload_speed = measure(upload_speed);
        self
    }

    pub fn with_latency(mut self, latency: f64) -> Self {
        self.latency = measure(latency);
        self
    }

    /// `(lon, lat)` if both are present and on the globe.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) if is_valid_position(lon, lat) => Some((lon, lat)),
            _ => None,
        }
    }
}

/// Measures are non-negative; anything else is treated as missing.
pub fn measure(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// A lon/lat rectangle, `[min_lon, min_lat, max_lon, max_lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// Approximate extent of Johor.
pub const JOHOR_BBOX: BoundingBox = BoundingBox {
    min_lon: 103.2,
    min_lat: 0.5,
    max_lon: 104.9,
    max_lat: 2.7,
};

impl BoundingBox {
    fn to_aabb(self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(b: [f64; 4]) -> Self {
        BoundingBox {
            min_lon: b[0],
            min_lat: b[1],
            max_lon: b[2],
            max_lat: b[3],
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_lon, b.min_lat, b.max_lon, b.max_lat]
    }
}

// what the tree stores: a position and the record it came from
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedPosition {
    position: [f64; 2],
    index: usize,
}

impl RTreeObject for IndexedPosition {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// All records of a session, plus an R* tree over the ones with a position.
///
/// Read only once built, so it can be shared between any number of
/// concurrent queries.
pub struct Dataset {
    records: Vec<MeasurementRecord>,
    tree: RTree<IndexedPosition>,
}

impl Dataset {
    pub fn new(records: Vec<MeasurementRecord>) -> Self {
        let positions: Vec<_> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.position().map(|(lon, lat)| IndexedPosition {
                    position: [lon, lat],
                    index,
                })
            })
            .collect();
        let tree = RTree::bulk_load(positions);
        Dataset { records, tree }
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that can be matched by a region at all
    pub fn positioned_len(&self) -> usize {
        self.tree.size()
    }

    /// Distinct operator names, sorted.
    pub fn operators(&self) -> Vec<&str> {
        let names: BTreeSet<&str> =
            self.records.iter().map(|r| r.operator.as_str()).collect();
        names.into_iter().collect()
    }

    /// A new dataset holding the records inside `bbox`, edges included.
    pub fn clip_to_bbox(&self, bbox: BoundingBox) -> Dataset {
        let mut indices: Vec<_> = self
            .tree
            .locate_in_envelope(&bbox.to_aabb())
            .map(|p| p.index)
            .collect();
        // keep the input order
        indices.sort_unstable();
        let records = indices
            .into_iter()
            .map(|index| self.records[index].clone())
            .collect();
        Dataset::new(records)
    }

    fn candidates<'a>(
        &'a self,
        envelope: &AABB<[f64; 2]>,
    ) -> impl Iterator<Item = (&'a MeasurementRecord, [f64; 2])> + 'a {
        self.tree
            .locate_in_envelope(envelope)
            .map(move |p| (&self.records[p.index], p.position))
    }
}

/// The records whose position lies in `region`.
///
/// Records without a valid position never match. No match is an empty
/// vector, not an error.
pub fn filter<'a, S: Search + Sync>(
    dataset: &'a Dataset,
    region: &S,
) -> Vec<&'a MeasurementRecord> {
    let candidates: Vec<_> = dataset.candidates(&region.envelope()).collect();
    candidates
        .into_par_iter()
        .filter(|(_, [lon, lat])| region.contains(*lon, *lat))
        .map(|(record, _)| record)
        .collect()
}
