//! Distance and containment primitives on lon/lat degrees.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{EuclideanDistance, Point, Polygon};

/// Mean earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Points this close (in degrees) to a polygon ring count as on the boundary,
/// about 0.1 mm on the ground.
pub const BOUNDARY_EPSILON_DEG: f64 = 1e-9;

/// Great-circle distance in km between two `(lon, lat)` pairs given in degrees.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // rounding can push h just past 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Whether `point` lies inside `polygon` or on its boundary.
///
/// The classification uses geo's robust orientation predicates, so it works
/// for non-convex rings. A point the predicates put outside is still accepted
/// if it sits within [`BOUNDARY_EPSILON_DEG`] of the exterior ring.
pub fn point_in_polygon(point: Point<f64>, polygon: &Polygon<f64>) -> bool {
    match polygon.coordinate_position(&point.0) {
        CoordPos::Inside | CoordPos::OnBoundary => true,
        CoordPos::Outside => {
            point.euclidean_distance(polygon.exterior()) <= BOUNDARY_EPSILON_DEG
        }
    }
}

/// Whether a lon/lat pair is finite and on the globe.
pub fn is_valid_position(lon: f64, lat: f64) -> bool {
    lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat)
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{point, polygon};

    const JOHOR_BAHRU: (f64, f64) = (103.7414, 1.4927);

    #[test]
    fn test_haversine_identity() {
        assert_eq!(haversine_km(JOHOR_BAHRU, JOHOR_BAHRU), 0.0);
        assert_eq!(haversine_km((-180.0, 90.0), (-180.0, 90.0)), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = (103.7414, 1.4927);
        let b = (110.0, 5.0);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        let d = haversine_km((0.0, 0.0), (0.0, 1.0));
        assert!((d - expected).abs() < 1e-9, "{}", d);
    }

    #[test]
    fn test_haversine_quarter_of_equator() {
        let expected = EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2;
        let d = haversine_km((0.0, 0.0), (90.0, 0.0));
        assert!((d - expected).abs() < 1e-6, "{}", d);
    }

    #[test]
    fn test_haversine_antipodes_is_not_nan() {
        let d = haversine_km((0.0, 0.0), (180.0, 0.0));
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_nearby_points() {
        // a couple of blocks apart in Johor Bahru
        let d = haversine_km(JOHOR_BAHRU, (103.75, 1.50));
        assert!(d > 1.2 && d < 1.3, "{}", d);
    }

    fn u_shape() -> Polygon<f64> {
        // a "U" opening upwards, the notch is x in (1, 2), y in (1, 3)
        polygon![
            (x: 0.0, y: 0.0),
            (x: 3.0, y: 0.0),
            (x: 3.0, y: 3.0),
            (x: 2.0, y: 3.0),
            (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 3.0),
            (x: 0.0, y: 3.0),
        ]
    }

    #[test]
    fn test_non_convex_polygon() {
        let poly = u_shape();
        assert!(point_in_polygon(point!(x: 0.5, y: 2.5), &poly));
        assert!(point_in_polygon(point!(x: 2.5, y: 2.5), &poly));
        assert!(point_in_polygon(point!(x: 1.5, y: 0.5), &poly));
        // inside the convex hull but in the notch
        assert!(!point_in_polygon(point!(x: 1.5, y: 2.0), &poly));
        assert!(!point_in_polygon(point!(x: 4.0, y: 1.0), &poly));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let poly = u_shape();
        // vertex
        assert!(point_in_polygon(point!(x: 0.0, y: 0.0), &poly));
        // edges
        assert!(point_in_polygon(point!(x: 1.5, y: 0.0), &poly));
        assert!(point_in_polygon(point!(x: 1.5, y: 1.0), &poly));
        assert!(point_in_polygon(point!(x: 3.0, y: 2.0), &poly));
    }

    #[test]
    fn test_boundary_jitter_is_tolerated() {
        let poly = u_shape();
        assert!(point_in_polygon(point!(x: 1.5, y: -1e-12), &poly));
        assert!(point_in_polygon(point!(x: 3.0 + 1e-12, y: 2.0), &poly));
        assert!(!point_in_polygon(point!(x: 1.5, y: -1e-6), &poly));
    }

    #[test]
    fn test_valid_position() {
        assert!(is_valid_position(103.7, 1.5));
        assert!(is_valid_position(-180.0, -90.0));
        assert!(!is_valid_position(180.5, 0.0));
        assert!(!is_valid_position(0.0, 90.5));
        assert!(!is_valid_position(f64::NAN, 0.0));
        assert!(!is_valid_position(0.0, f64::INFINITY));
    }
}
