use log::{debug, info};
use model::{
    point::GeoPoint,
    zone::{MatchResult, ServiceZone},
};

use crate::resolver::matching_zones;

/// What is known about the user's location: where they are, which zones
/// contain that point and which zone they are served from.
///
/// The zone list is always handed in by the caller; this type never fetches
/// or caches zones itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationState {
    pub user_location: Option<GeoPoint>,
    pub selected_zone: Option<ServiceZone>,
    pub matches: Vec<MatchResult>,
}

impl LocationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_serviceable(&self) -> bool {
        self.selected_zone.is_some()
    }

    /// Records `point` as the user's location and resolves it against
    /// `active_zones`. The first matching zone becomes the selected one; if
    /// none matches the selection is cleared.
    pub fn check(&mut self, point: GeoPoint, active_zones: &[ServiceZone]) -> bool {
        let matching = matching_zones(&point, active_zones).collect::<Vec<_>>();

        self.user_location = Some(point);
        self.matches = matching.iter().map(|zone| zone.match_result()).collect();
        self.selected_zone = matching.first().map(|zone| (*zone).clone());

        match &self.selected_zone {
            Some(zone) => {
                debug!(
                    "({}, {}) is serviceable from {} ({} candidates)",
                    point.latitude,
                    point.longitude,
                    zone.name,
                    self.matches.len()
                );
                true
            }
            None => {
                info!(
                    "({}, {}) is outside of all {} service zones",
                    point.latitude,
                    point.longitude,
                    active_zones.len()
                );
                false
            }
        }
    }

    /// Manually chosen zone, e.g. picked from a list. Marks the state as
    /// serviceable regardless of the user's location.
    pub fn select_zone(&mut self, zone: ServiceZone) {
        self.selected_zone = Some(zone);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
