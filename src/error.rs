use std::io;
use thiserror::Error;

/// A region descriptor that cannot be turned into a usable region.
///
/// Returned before any record is looked at. An empty summary is never
/// reported through this type: "no data in region" is `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum InvalidRegion {
    #[error("radius must be a positive, finite number of kilometres, got {0}")]
    InvalidRadius(f64),

    #[error("circle center ({lon}, {lat}) is not a valid lon/lat coordinate")]
    InvalidCenter { lon: f64, lat: f64 },

    #[error("polygon vertex ({lon}, {lat}) is not a valid lon/lat coordinate")]
    InvalidVertex { lon: f64, lat: f64 },

    #[error("polygon needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    #[error("polygon encloses no area")]
    ZeroArea,

    #[error("polygons with holes are not supported")]
    Holes,

    #[error("unsupported region geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("malformed GeoJSON region: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Failures while reading or writing a dataset file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to access '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("expected a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    #[error("don't know how to load '{0}', expected .geojson, .json or .csv")]
    UnsupportedFormat(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
