use rstar::AABB;

/// Describes a region that the record index can be searched with.
///
/// Searching is done in two steps: the R* tree returns every record inside
/// `envelope`, then `contains` makes the exact decision for each of them.
/// So the envelope may be larger than the region but never smaller, otherwise
/// records would be dropped before `contains` ever sees them.
pub trait Search {
    /// A lon/lat box ([min_lon, min_lat] to [max_lon, max_lat]) holding
    /// every position that `contains` accepts
    fn envelope(&self) -> AABB<[f64; 2]>;

    /// The exact membership test for a valid lon/lat position
    fn contains(&self, lon: f64, lat: f64) -> bool;
}
