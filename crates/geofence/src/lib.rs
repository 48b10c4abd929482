//! Decides whether a coordinate lies inside one of the admin-defined delivery
//! zones. Everything in here is pure computation on the zone list handed in by
//! the caller.

pub mod distance;
pub mod polygon;
pub mod resolver;
pub mod serviceability;

pub use distance::great_circle_distance_km;
pub use polygon::is_point_in_polygon;
pub use resolver::find_matching_zones;
pub use serviceability::LocationState;
