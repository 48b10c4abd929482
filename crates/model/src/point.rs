use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ExampleData;

/// A geographic coordinate in degrees.
///
/// Always passed around with named fields. The point-in-polygon test treats
/// `latitude` as its "x" axis and `longitude` as its "y" axis, and a tuple
/// would make it too easy to swap the two silently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Whether both coordinates lie within their valid degree ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl ExampleData for GeoPoint {
    fn example_data() -> Self {
        GeoPoint::new(12.9352, 77.6245)
    }
}
