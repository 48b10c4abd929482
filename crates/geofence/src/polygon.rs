use model::{point::GeoPoint, zone::PolygonRing};

/// Even-odd (crossing number) point-in-polygon test.
///
/// A ray is cast from `point` and every ring edge it crosses toggles the
/// result. Latitude plays the role of the "x" axis and longitude the role of
/// the "y" axis: an edge is crossed if it straddles the point's longitude and
/// its interpolated latitude at that longitude lies above the point's
/// latitude.
///
/// Rings with fewer than three points never contain anything. The result for
/// points lying exactly on an edge or a vertex is not defined by the even-odd
/// rule and must not be relied on; changing it would silently move addresses
/// on a zone border in or out of service.
pub fn is_point_in_polygon(point: &GeoPoint, ring: &PolygonRing) -> bool {
    if ring.is_degenerate() {
        return false;
    }

    let GeoPoint {
        latitude: x,
        longitude: y,
    } = *point;
    let points = ring.points();
    let mut inside = false;

    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let GeoPoint {
            latitude: xi,
            longitude: yi,
        } = points[i];
        let GeoPoint {
            latitude: xj,
            longitude: yj,
        } = points[j];

        if (yi > y) != (yj > y) {
            let x_intersect = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}
