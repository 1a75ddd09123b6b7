//! Reading datasets from disk and writing records and summaries as CSV.

use crate::aggregate::OperatorSummary;
use crate::dataset::{measure, Dataset, MeasurementRecord, UNKNOWN_OPERATOR};
use crate::error::LoadError;
use geo::Centroid;
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

/// Loads a `.geojson`/`.json` feature collection or a `.csv` file.
pub fn load_path(path: &Path, bar: &ProgressBar) -> Result<Dataset, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("geojson") | Some("json") => load_geojson(path, bar),
        Some("csv") => load_csv(path, bar),
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Loads one record per feature.
///
/// Point geometries give the position directly, polygons (the tiles of the
/// Ookla open data) are reduced to their centroid. Speeds are read from
/// `download_mean`, `upload_mean` and `latency_mean`.
pub fn load_geojson(path: &Path, bar: &ProgressBar) -> Result<Dataset, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        _ => return Err(LoadError::NotAFeatureCollection),
    };

    bar.set_length(features.len() as u64);
    let records: Vec<_> = features
        .par_iter()
        .map(|feature| {
            bar.inc(1);
            feature_to_record(feature)
        })
        .collect();
    bar.finish();

    let dataset = Dataset::new(records);
    info!(
        path = %path.display(),
        records = dataset.len(),
        positioned = dataset.positioned_len(),
        "loaded GeoJSON dataset"
    );
    Ok(dataset)
}

fn feature_to_record(feature: &Feature) -> MeasurementRecord {
    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);

    let (longitude, latitude) = match feature_position(feature) {
        Some((lon, lat)) => (Some(lon), Some(lat)),
        None => (None, None),
    };

    let mut record =
        MeasurementRecord::new(&operator_of(properties), longitude, latitude);
    record.download_speed = property_measure(properties, "download_mean");
    record.upload_speed = property_measure(properties, "upload_mean");
    record.latency = property_measure(properties, "latency_mean");
    record
}

fn feature_position(feature: &Feature) -> Option<(f64, f64)> {
    let geometry = feature.geometry.as_ref()?;
    match &geometry.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => Some((coords[0], coords[1])),
        geojson::Value::Polygon(rings) => tile_centroid(rings.first()?),
        other => {
            warn!(geometry = value_type(other), "feature has no usable position");
            None
        }
    }
}

fn tile_centroid(exterior: &[Vec<f64>]) -> Option<(f64, f64)> {
    let ring: Vec<(f64, f64)> = exterior
        .iter()
        .filter(|position| position.len() >= 2)
        .map(|position| (position[0], position[1]))
        .collect();
    let polygon = geo::Polygon::new(geo::LineString::from(ring), vec![]);
    polygon.centroid().map(|c| (c.x(), c.y()))
}

fn value_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
        _ => "degenerate geometry",
    }
}

// `operator`, then `cellular_provider`, then any provider/operator column
fn operator_of(properties: &JsonObject) -> String {
    let key = ["operator", "cellular_provider"]
        .into_iter()
        .find(|key| properties.contains_key(*key))
        .or_else(|| {
            properties
                .keys()
                .map(String::as_str)
                .filter(|key| key.contains("provider") || key.contains("operator"))
                .min()
        });

    match key.and_then(|key| properties.get(key)) {
        Some(JsonValue::String(name)) if !name.is_empty() => name.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => UNKNOWN_OPERATOR.to_string(),
    }
}

fn property_measure(properties: &JsonObject, key: &str) -> Option<f64> {
    match properties.get(key)? {
        JsonValue::Number(n) => n.as_f64().and_then(measure),
        JsonValue::String(s) => parse_measure(Some(s.as_str())),
        _ => None,
    }
}

fn parse_number(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse().ok()
}

fn parse_measure(cell: Option<&str>) -> Option<f64> {
    parse_number(cell).and_then(measure)
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, alias = "provider", alias = "cellular_provider")]
    operator: Option<String>,
    #[serde(default, alias = "lon")]
    longitude: Option<String>,
    #[serde(default, alias = "lat")]
    latitude: Option<String>,
    #[serde(default, alias = "download_speed")]
    download_mean: Option<String>,
    #[serde(default, alias = "upload_speed")]
    upload_mean: Option<String>,
    #[serde(default, alias = "latency")]
    latency_mean: Option<String>,
}

impl From<RawRow> for MeasurementRecord {
    fn from(row: RawRow) -> Self {
        let operator = row.operator.as_deref().map(str::trim).unwrap_or("");
        let mut record = MeasurementRecord::new(
            operator,
            parse_number(row.longitude.as_deref()),
            parse_number(row.latitude.as_deref()),
        );
        record.download_speed = parse_measure(row.download_mean.as_deref());
        record.upload_speed = parse_measure(row.upload_mean.as_deref());
        record.latency = parse_measure(row.latency_mean.as_deref());
        record
    }
}

/// Loads a CSV with a header row. Cells that don't parse become missing
/// values rather than failing the whole file.
pub fn load_csv(path: &Path, bar: &ProgressBar) -> Result<Dataset, LoadError> {
    let io_error = |source: io::Error| LoadError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    bar.set_length(file.metadata().map_err(io_error)?.len());

    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = vec![];
    while reader.read_record(&mut raw)? {
        let row: RawRow = raw.deserialize(Some(&headers))?;
        records.push(MeasurementRecord::from(row));
        bar.set_position(reader.position().byte());
    }
    bar.finish();

    let dataset = Dataset::new(records);
    info!(
        path = %path.display(),
        records = dataset.len(),
        positioned = dataset.positioned_len(),
        "loaded CSV dataset"
    );
    Ok(dataset)
}

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    operator: &'a str,
    longitude: Option<f64>,
    latitude: Option<f64>,
    download_mean: Option<f64>,
    upload_mean: Option<f64>,
    latency_mean: Option<f64>,
}

/// Writes records in the column layout `load_csv` reads back.
pub fn write_records_csv<'a, W: Write>(
    records: impl IntoIterator<Item = &'a MeasurementRecord>,
    writer: W,
) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(RecordRow {
            operator: &record.operator,
            longitude: record.longitude,
            latitude: record.latitude,
            download_mean: record.download_speed,
            upload_mean: record.upload_speed,
            latency_mean: record.latency,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Missing averages are written as empty cells.
pub fn write_summaries_csv<W: Write>(
    summaries: &[OperatorSummary],
    writer: W,
) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
