//! Region descriptors as supplied by callers, and their validated form.

use crate::error::InvalidRegion;
use crate::geometry::{
    haversine_km, is_valid_position, point_in_polygon, BOUNDARY_EPSILON_DEG,
    EARTH_RADIUS_KM,
};
use crate::traits::Search;
use geo::{Area, BoundingRect, LineString, Point, Polygon};
use geojson::GeoJson;
use rstar::AABB;
use serde::{Deserialize, Serialize};

// added on each side of a circle's envelope, ~0.1 m
const ENVELOPE_PADDING_DEG: f64 = 1e-6;

/// The area a query is restricted to. Positions are `(lon, lat)` in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionDescriptor {
    Circle { center: (f64, f64), radius_km: f64 },
    /// The ring does not need to repeat its first vertex at the end
    Polygon { vertices: Vec<(f64, f64)> },
}

impl RegionDescriptor {
    pub fn circle(lon: f64, lat: f64, radius_km: f64) -> Self {
        RegionDescriptor::Circle {
            center: (lon, lat),
            radius_km,
        }
    }

    pub fn polygon(vertices: Vec<(f64, f64)>) -> Self {
        RegionDescriptor::Polygon { vertices }
    }

    /// Checks the descriptor and builds the region `filter` works with.
    pub fn validate(&self) -> Result<Region, InvalidRegion> {
        match self {
            RegionDescriptor::Circle { center, radius_km } => {
                CircleRegion::new(*center, *radius_km).map(Region::Circle)
            }
            RegionDescriptor::Polygon { vertices } => {
                PolygonRegion::new(vertices).map(Region::Polygon)
            }
        }
    }

    /// Reads a drawn shape. Accepts a bare geometry, a feature or a feature
    /// collection, in which case the last feature with a geometry is used.
    /// A point becomes a circle of `radius_km`, a polygon is used as is.
    pub fn from_geojson(text: &str, radius_km: f64) -> Result<Self, InvalidRegion> {
        let geojson: GeoJson = text.parse()?;
        let geometry = match geojson {
            GeoJson::Geometry(geometry) => Some(geometry),
            GeoJson::Feature(feature) => feature.geometry,
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .rev()
                .find_map(|feature| feature.geometry),
        }
        .ok_or_else(|| {
            InvalidRegion::UnsupportedGeometry("feature without geometry".to_string())
        })?;

        let geometry: geo::Geometry<f64> = GeoJson::Geometry(geometry).try_into()?;
        match geometry {
            geo::Geometry::Point(point) => {
                Ok(RegionDescriptor::circle(point.x(), point.y(), radius_km))
            }
            geo::Geometry::Polygon(polygon) => {
                if !polygon.interiors().is_empty() {
                    return Err(InvalidRegion::Holes);
                }
                let vertices =
                    polygon.exterior().coords().map(|c| (c.x, c.y)).collect();
                Ok(RegionDescriptor::Polygon { vertices })
            }
            other => Err(InvalidRegion::UnsupportedGeometry(
                geometry_name(&other).to_string(),
            )),
        }
    }
}

fn geometry_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

/// A validated region, see [`RegionDescriptor::validate`].
#[derive(Debug, Clone)]
pub enum Region {
    Circle(CircleRegion),
    Polygon(PolygonRegion),
}

impl Search for Region {
    fn envelope(&self) -> AABB<[f64; 2]> {
        match self {
            Region::Circle(circle) => circle.envelope(),
            Region::Polygon(polygon) => polygon.envelope(),
        }
    }

    fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            Region::Circle(circle) => circle.contains(lon, lat),
            Region::Polygon(polygon) => polygon.contains(lon, lat),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleRegion {
    center: (f64, f64),
    radius_km: f64,
}

impl CircleRegion {
    pub fn new(center: (f64, f64), radius_km: f64) -> Result<Self, InvalidRegion> {
        // also rejects NaN
        if !(radius_km > 0.0 && radius_km.is_finite()) {
            return Err(InvalidRegion::InvalidRadius(radius_km));
        }
        let (lon, lat) = center;
        if !is_valid_position(lon, lat) {
            return Err(InvalidRegion::InvalidCenter { lon, lat });
        }
        Ok(CircleRegion { center, radius_km })
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }
}

impl Search for CircleRegion {
    fn envelope(&self) -> AABB<[f64; 2]> {
        let (lon, lat) = self.center;

        // angular radius; no point within the circle is further than this
        // from the center in latitude
        let delta = self.radius_km / EARTH_RADIUS_KM;
        let delta_lat = delta.to_degrees() + ENVELOPE_PADDING_DEG;
        let min_lat = lat - delta_lat;
        let max_lat = lat + delta_lat;

        if min_lat <= -90.0 || max_lat >= 90.0 {
            // a pole is inside, so every longitude is
            return AABB::from_corners(
                [-180.0, min_lat.max(-90.0)],
                [180.0, max_lat.min(90.0)],
            );
        }

        // widest longitude reached by the circle, at its tangent meridians
        let ratio = delta.sin() / lat.to_radians().cos();
        let delta_lon = if ratio < 1.0 {
            ratio.asin().to_degrees() + ENVELOPE_PADDING_DEG
        } else {
            180.0
        };
        let min_lon = lon - delta_lon;
        let max_lon = lon + delta_lon;

        if min_lon < -180.0 || max_lon > 180.0 {
            // crosses the antimeridian
            return AABB::from_corners([-180.0, min_lat], [180.0, max_lat]);
        }
        AABB::from_corners([min_lon, min_lat], [max_lon, max_lat])
    }

    fn contains(&self, lon: f64, lat: f64) -> bool {
        haversine_km((lon, lat), self.center) <= self.radius_km
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRegion {
    polygon: Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl PolygonRegion {
    pub fn new(vertices: &[(f64, f64)]) -> Result<Self, InvalidRegion> {
        if let Some(&(lon, lat)) = vertices
            .iter()
            .find(|(lon, lat)| !is_valid_position(*lon, *lat))
        {
            return Err(InvalidRegion::InvalidVertex { lon, lat });
        }

        let mut distinct = vertices.to_vec();
        distinct.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        distinct.dedup();
        if distinct.len() < 3 {
            return Err(InvalidRegion::TooFewVertices(distinct.len()));
        }

        // Polygon::new closes the ring itself
        let polygon = Polygon::new(LineString::from(vertices.to_vec()), vec![]);
        if polygon.unsigned_area() == 0.0 {
            return Err(InvalidRegion::ZeroArea);
        }

        let rect = polygon.bounding_rect().ok_or(InvalidRegion::ZeroArea)?;
        let pad = 2.0 * BOUNDARY_EPSILON_DEG;
        let envelope = AABB::from_corners(
            [rect.min().x - pad, rect.min().y - pad],
            [rect.max().x + pad, rect.max().y + pad],
        );

        Ok(PolygonRegion { polygon, envelope })
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }
}

impl Search for PolygonRegion {
    fn envelope(&self) -> AABB<[f64; 2]> {
        self.envelope
    }

    fn contains(&self, lon: f64, lat: f64) -> bool {
        point_in_polygon(Point::new(lon, lat), &self.polygon)
    }
}
