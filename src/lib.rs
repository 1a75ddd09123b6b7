pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod logging;
pub mod region;
pub mod summary;
pub mod traits;

pub use aggregate::{aggregate, OperatorSummary};
pub use dataset::{filter, BoundingBox, Dataset, MeasurementRecord, JOHOR_BBOX};
pub use error::{ConfigError, InvalidRegion, LoadError};
pub use region::{Region, RegionDescriptor};
pub use summary::{sort_by_download_desc, summarize};
pub use traits::Search;

/// Parses `"lon,lat;lon,lat;..."` as typed on the command line.
pub fn parse_vertices(s: &str) -> Result<Vec<(f64, f64)>, String> {
    s.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<(f64, f64), String> {
            let (lon, lat) = pair
                .split_once(',')
                .ok_or_else(|| format!("expected \"lon,lat\", got \"{}\"", pair))?;
            let lon: f64 = lon
                .trim()
                .parse()
                .map_err(|_| format!("bad longitude in \"{}\"", pair))?;
            let lat: f64 = lat
                .trim()
                .parse()
                .map_err(|_| format!("bad latitude in \"{}\"", pair))?;
            Ok((lon, lat))
        })
        .collect()
}

/// Parses `"min_lon,min_lat,max_lon,max_lat"`.
pub fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let values = s
        .split(',')
        .map(|x| x.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad bounding box \"{}\": {}", s, e))?;
    match values[..] {
        [min_lon, min_lat, max_lon, max_lat]
            if min_lon <= max_lon && min_lat <= max_lat =>
        {
            Ok(BoundingBox::from([min_lon, min_lat, max_lon, max_lat]))
        }
        _ => Err(format!(
            "expected \"min_lon,min_lat,max_lon,max_lat\", got \"{}\"",
            s
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_vertices() {
        let vertices = parse_vertices("103.6,1.4; 103.8,1.4;103.8, 1.6;").unwrap();
        assert_eq!(vertices, vec![(103.6, 1.4), (103.8, 1.4), (103.8, 1.6)]);
    }

    #[test]
    fn test_parse_vertices_errors() {
        assert!(parse_vertices("103.6 1.4").is_err());
        assert!(parse_vertices("east,1.4").is_err());
        assert!(parse_vertices("103.6,north").is_err());
    }

    #[test]
    fn test_parse_bbox() {
        assert_eq!(parse_bbox("103.2,0.5,104.9,2.7").unwrap(), JOHOR_BBOX);
        assert!(parse_bbox("103.2,0.5,104.9").is_err());
        assert!(parse_bbox("104.9,0.5,103.2,2.7").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
    }
}
