use model::point::GeoPoint;
use utility::geo;

/// Slack granted on radius comparisons, one micrometer. Points constructed to
/// lie exactly on the circle must not fall out because of rounding.
pub const RADIUS_TOLERANCE_KM: f64 = 1e-9;

/// Haversine distance between two points, in kilometers.
pub fn great_circle_distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    geo::haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Whether `point` lies within `radius_km` of `center`. Any non-finite input
/// compares false and therefore never matches.
pub fn is_within_radius(point: &GeoPoint, center: &GeoPoint, radius_km: f64) -> bool {
    great_circle_distance_km(point, center) <= radius_km + RADIUS_TOLERANCE_KM
}
