use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{point::GeoPoint, ExampleData};

/// Minimum number of vertices a ring needs to enclose any area.
pub const MIN_RING_POINTS: usize = 3;

/// An ordered ring of vertices. The closing edge from the last point back to
/// the first is implicit and never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PolygonRing(Vec<GeoPoint>);

impl PolygonRing {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    /// Rings with fewer than three points never contain anything.
    pub fn is_degenerate(&self) -> bool {
        self.0.len() < MIN_RING_POINTS
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(GeoPoint::is_finite)
    }

    /// Arithmetic mean of the vertices. This is not the area centroid, but it
    /// is what zone centers have always been derived from.
    pub fn centroid(&self) -> Option<GeoPoint> {
        if self.0.is_empty() {
            return None;
        }
        let count = self.0.len() as f64;
        let (latitude, longitude) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(lat, lon), point| {
                (lat + point.latitude, lon + point.longitude)
            });
        Some(GeoPoint::new(latitude / count, longitude / count))
    }
}

impl From<Vec<GeoPoint>> for PolygonRing {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<GeoPoint> for PolygonRing {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The shape a zone is matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZoneGeometry {
    Polygon {
        ring: PolygonRing,
    },
    #[serde(rename_all = "camelCase")]
    Radius {
        center: GeoPoint,
        radius_km: f64,
    },
}

impl ZoneGeometry {
    /// Picks the geometry a zone is matched with. A polygon with at least
    /// three points wins, otherwise center and radius are used. Returns `None`
    /// if neither is usable.
    pub fn resolve(
        polygon: Option<PolygonRing>,
        center: Option<GeoPoint>,
        radius_km: Option<f64>,
    ) -> Option<Self> {
        match (polygon, center, radius_km) {
            (Some(ring), _, _) if !ring.is_degenerate() => {
                Some(ZoneGeometry::Polygon { ring })
            }
            (_, Some(center), Some(radius_km)) => {
                Some(ZoneGeometry::Radius { center, radius_km })
            }
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            ZoneGeometry::Polygon { ring } => ring.is_finite(),
            ZoneGeometry::Radius { center, radius_km } => {
                center.is_finite() && radius_km.is_finite()
            }
        }
    }
}

/// An admin-defined delivery area.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceZone {
    pub id: Id<ServiceZone>,
    pub name: String,
    pub color: Option<String>,
    pub geometry: Option<ZoneGeometry>,
    pub delivery_fee: Option<f64>,
    pub is_active: bool,
}

impl HasId for ServiceZone {
    type IdType = String;
}

impl ServiceZone {
    pub fn is_matchable(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn match_result(&self) -> MatchResult {
        MatchResult {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

impl ExampleData for ServiceZone {
    fn example_data() -> Self {
        ServiceZone {
            id: Id::from("1"),
            name: "Koramangala".to_owned(),
            color: None,
            geometry: Some(ZoneGeometry::Radius {
                center: GeoPoint::new(12.9352, 77.6245),
                radius_km: 5.0,
            }),
            delivery_fee: Some(29.0),
            is_active: true,
        }
    }
}

/// What a caller gets to know about a zone containing its point.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: Id<ServiceZone>,
    pub name: String,
    pub color: Option<String>,
}
