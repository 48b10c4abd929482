use serde::{Deserialize, Serialize};
use utility::id::Id;

use crate::{
    point::GeoPoint,
    zone::{PolygonRing, ServiceZone, ZoneGeometry},
};

pub const DEFAULT_RADIUS_KM: f64 = 5.0;
pub const DEFAULT_DELIVERY_FEE: f64 = 29.0;

/// A serviceable location as it is stored in the document database. Depending
/// on how the admin created it, it carries a polygon, a center with radius,
/// or both. Unknown fields (`createdAt`, ...) are ignored.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceableLocationRecord {
    pub id: String,
    pub name: String,
    pub coordinates: Option<GeoPoint>,
    pub radius: Option<f64>,
    pub delivery_fee: Option<f64>,
    #[serde(default)]
    pub is_active: bool,
    pub polygon: Option<Vec<GeoPoint>>,
    pub color: Option<String>,
}

impl ServiceableLocationRecord {
    /// Builds an active location from a drawn polygon. Its center is the
    /// vertex centroid of the polygon and its radius the default one, so
    /// the record still works for clients that only understand radii. A
    /// missing, zero or NaN fee falls back to the default fee.
    pub fn from_polygon<I, N>(
        id: I,
        name: N,
        polygon: Vec<GeoPoint>,
        delivery_fee: Option<f64>,
    ) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        let coordinates = PolygonRing::new(polygon.clone()).centroid();
        Self {
            id: id.into(),
            name: name.into(),
            coordinates,
            radius: Some(DEFAULT_RADIUS_KM),
            delivery_fee: Some(
                delivery_fee
                    .filter(|fee| *fee != 0.0 && !fee.is_nan())
                    .unwrap_or(DEFAULT_DELIVERY_FEE),
            ),
            is_active: true,
            polygon: Some(polygon),
            color: None,
        }
    }
}

/// A polygon drawn on the admin map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonRecord {
    pub id: String,
    pub name: String,
    pub color: String,
    pub points: Vec<GeoPoint>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneRecord {
    // needs `points` and `color`, so location records never match it
    Polygon(PolygonRecord),
    Location(ServiceableLocationRecord),
}

impl ZoneRecord {
    pub fn id(&self) -> &str {
        match self {
            ZoneRecord::Polygon(polygon) => &polygon.id,
            ZoneRecord::Location(location) => &location.id,
        }
    }
}

impl From<ServiceableLocationRecord> for ServiceZone {
    fn from(record: ServiceableLocationRecord) -> Self {
        let geometry = ZoneGeometry::resolve(
            record.polygon.map(PolygonRing::new),
            record.coordinates,
            record.radius,
        );
        ServiceZone {
            id: Id::new(record.id),
            name: record.name,
            color: record.color,
            geometry,
            delivery_fee: record.delivery_fee,
            is_active: record.is_active,
        }
    }
}

impl From<PolygonRecord> for ServiceZone {
    fn from(record: PolygonRecord) -> Self {
        // drawn polygons have no activity flag, they are live once stored
        ServiceZone {
            id: Id::new(record.id),
            name: record.name,
            color: Some(record.color),
            geometry: ZoneGeometry::resolve(
                Some(PolygonRing::new(record.points)),
                None,
                None,
            ),
            delivery_fee: None,
            is_active: true,
        }
    }
}

impl From<ZoneRecord> for ServiceZone {
    fn from(record: ZoneRecord) -> Self {
        match record {
            ZoneRecord::Polygon(polygon) => polygon.into(),
            ZoneRecord::Location(location) => location.into(),
        }
    }
}
