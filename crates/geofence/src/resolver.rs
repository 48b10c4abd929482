use itertools::Itertools;
use log::{debug, warn};
use model::{
    point::GeoPoint,
    zone::{MatchResult, ServiceZone, ZoneGeometry},
};

use crate::{distance::is_within_radius, polygon::is_point_in_polygon};

/// Whether `zone` contains `point`.
///
/// Zones without geometry never match. Zones whose geometry holds non-finite
/// numbers are skipped with a warning instead of letting NaN arithmetic
/// decide, since a single NaN vertex only disables two polygon edges and the
/// remaining ones could still report a hit.
pub fn zone_contains(zone: &ServiceZone, point: &GeoPoint) -> bool {
    let Some(geometry) = &zone.geometry else {
        return false;
    };
    if !geometry.is_finite() {
        warn!(
            "zone {} ({}) has non-finite geometry and is skipped",
            zone.id, zone.name
        );
        return false;
    }
    match geometry {
        ZoneGeometry::Polygon { ring } => is_point_in_polygon(point, ring),
        ZoneGeometry::Radius { center, radius_km } => {
            is_within_radius(point, center, *radius_km)
        }
    }
}

/// All zones containing `point`, in the order they were given.
///
/// The caller is responsible for passing only active zones.
pub fn matching_zones<'a>(
    point: &'a GeoPoint,
    zones: &'a [ServiceZone],
) -> impl Iterator<Item = &'a ServiceZone> + 'a {
    let point_usable = point.is_finite();
    if !point_usable {
        warn!("query point {:?} is not finite, nothing can match", point);
    }
    zones
        .iter()
        .filter(move |zone| point_usable && zone_contains(zone, point))
}

/// Projects every zone containing `point` to a [`MatchResult`], preserving
/// input order. Overlapping zones are all reported; picking one of them is
/// up to the caller.
pub fn find_matching_zones(point: &GeoPoint, zones: &[ServiceZone]) -> Vec<MatchResult> {
    let matches = matching_zones(point, zones)
        .map(ServiceZone::match_result)
        .collect::<Vec<_>>();
    debug!(
        "{} of {} zones contain ({}, {}): [{}]",
        matches.len(),
        zones.len(),
        point.latitude,
        point.longitude,
        matches.iter().map(|m| &m.id).join(", ")
    );
    matches
}
