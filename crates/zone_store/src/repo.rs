use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use log::{error, info, warn};
use model::zone::ServiceZone;
use serde::Serialize;
use utility::id::Id;

use crate::{source::ZoneSource, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotOrigin {
    Source,
    Cache,
}

/// The zone list as of one successful load.
#[derive(Debug, Clone)]
pub struct ZoneSnapshot {
    // Index map to keep the order in which the store returned the zones, since
    // overlapping zones are reported in that order.
    zones: IndexMap<Id<ServiceZone>, ServiceZone>,
    fetched_at: DateTime<Local>,
    origin: SnapshotOrigin,
}

impl ZoneSnapshot {
    fn new<I>(zones: I, origin: SnapshotOrigin) -> Self
    where
        I: IntoIterator<Item = ServiceZone>,
    {
        let mut by_id = IndexMap::new();
        for zone in zones {
            by_id.insert(zone.id.clone(), zone);
        }
        Self {
            zones: by_id,
            fetched_at: Local::now(),
            origin,
        }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Loads zones from the source, or from the cache file if the repo it was
/// taken from has nothing to fall back to. It does not borrow the repo, so
/// the slow part of a refresh can run while others keep reading.
pub struct ZoneLoader<S: ZoneSource> {
    source: Arc<S>,
    cache_file: Option<PathBuf>,
    has_snapshot: bool,
}

impl<S: ZoneSource> ZoneLoader<S> {
    /// `Ok(None)` means the repo should keep what it holds.
    pub async fn load(&self) -> StoreResult<Option<ZoneSnapshot>> {
        let fetched = self.source.fetch_records().await;
        match fetched {
            Ok(records) if !records.is_empty() => {
                let snapshot = ZoneSnapshot::new(
                    records.into_iter().map(ServiceZone::from),
                    SnapshotOrigin::Source,
                );
                info!(
                    "loaded {} service zones from {}",
                    snapshot.len(),
                    self.source.describe()
                );
                if let Some(path) = &self.cache_file {
                    if let Err(why) = write_cache(path, &snapshot).await {
                        warn!("could not write zone cache {}: {}", path.display(), why);
                    }
                }
                return Ok(Some(snapshot));
            }
            Ok(_) => warn!("{} returned no service zones", self.source.describe()),
            Err(why) => warn!(
                "could not fetch service zones from {}: {}",
                self.source.describe(),
                why
            ),
        }

        if self.has_snapshot {
            return Ok(None);
        }
        self.load_cache().await.map(Some)
    }

    async fn load_cache(&self) -> StoreResult<ZoneSnapshot> {
        if let Some(path) = &self.cache_file {
            match read_cache(path).await {
                Ok(zones) if !zones.is_empty() => {
                    let snapshot = ZoneSnapshot::new(zones, SnapshotOrigin::Cache);
                    info!(
                        "loaded {} service zones from cache {}",
                        snapshot.len(),
                        path.display()
                    );
                    return Ok(snapshot);
                }
                Ok(_) => warn!("zone cache {} is empty", path.display()),
                Err(why) => {
                    warn!("could not read zone cache {}: {}", path.display(), why)
                }
            }
        }

        error!("no service zones available");
        Err(StoreError::Unavailable)
    }
}

/// Holds the current zone list and refreshes it on request.
///
/// Refreshing prefers the source. When the source fails or returns nothing,
/// the last known list is kept; right after start-up that is whatever the
/// cache file holds.
pub struct ZoneRepo<S: ZoneSource> {
    source: Arc<S>,
    cache_file: Option<PathBuf>,
    snapshot: Option<ZoneSnapshot>,
}

impl<S: ZoneSource> ZoneRepo<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            cache_file: None,
            snapshot: None,
        }
    }

    pub fn with_cache_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Reloads the zones and returns how many are held afterwards.
    pub async fn refresh(&mut self) -> StoreResult<usize> {
        let loaded = self.loader().load().await;
        self.apply(loaded)
    }

    pub fn loader(&self) -> ZoneLoader<S> {
        ZoneLoader {
            source: self.source.clone(),
            cache_file: self.cache_file.clone(),
            has_snapshot: self.snapshot.is_some(),
        }
    }

    /// Takes over the outcome of [`ZoneLoader::load`] and returns how many
    /// zones are held afterwards.
    pub fn apply(&mut self, loaded: StoreResult<Option<ZoneSnapshot>>) -> StoreResult<usize> {
        let Some(snapshot) = loaded? else {
            return match &self.snapshot {
                Some(current) => {
                    info!(
                        "keeping {} service zones from {}",
                        current.len(),
                        current.fetched_at.format("%Y-%m-%dT%H:%M:%S")
                    );
                    Ok(current.len())
                }
                None => Err(StoreError::Unavailable),
            };
        };

        // another refresh may have finished while the cache was read
        if let Some(current) = &self.snapshot {
            if snapshot.origin == SnapshotOrigin::Cache {
                info!("ignoring zone cache, {} zones are loaded", current.len());
                return Ok(current.len());
            }
        }

        let count = snapshot.len();
        self.snapshot = Some(snapshot);
        Ok(count)
    }

    /// All zones, active or not, in store order.
    pub fn zones(&self) -> Vec<ServiceZone> {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.zones.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Zones that take part in serviceability checks.
    pub fn active_zones(&self) -> Vec<ServiceZone> {
        self.zones()
            .into_iter()
            .filter(|zone| zone.is_active)
            .collect()
    }

    pub fn zone(&self, id: &Id<ServiceZone>) -> StoreResult<ServiceZone> {
        self.snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.zones.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Like [`ZoneRepo::zone`], but inactive zones are not found.
    pub fn active_zone(&self, id: &Id<ServiceZone>) -> StoreResult<ServiceZone> {
        self.zone(id).and_then(|zone| {
            if zone.is_active {
                Ok(zone)
            } else {
                Err(StoreError::NotFound)
            }
        })
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.snapshot.as_ref().map(|snapshot| snapshot.fetched_at)
    }

    pub fn snapshot_origin(&self) -> Option<SnapshotOrigin> {
        self.snapshot.as_ref().map(|snapshot| snapshot.origin)
    }
}

async fn write_cache(path: &Path, snapshot: &ZoneSnapshot) -> StoreResult<()> {
    let zones = snapshot.zones.values().collect::<Vec<_>>();
    let content = serde_json::to_string(&zones)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

async fn read_cache(path: &Path) -> StoreResult<Vec<ServiceZone>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use model::record::ZoneRecord;
    use serde_json::{json, Value};

    use super::*;
    use crate::source::decode_records;

    struct ToggleSource {
        values: Vec<Value>,
        online: Arc<AtomicBool>,
    }

    impl ToggleSource {
        fn new(values: Vec<Value>) -> (Self, Arc<AtomicBool>) {
            let online = Arc::new(AtomicBool::new(true));
            (
                Self {
                    values,
                    online: online.clone(),
                },
                online,
            )
        }
    }

    #[async_trait]
    impl ZoneSource for ToggleSource {
        async fn fetch_records(&self) -> StoreResult<Vec<ZoneRecord>> {
            if self.online.load(Ordering::SeqCst) {
                Ok(decode_records(self.values.clone()))
            } else {
                Err(StoreError::other(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "offline",
                )))
            }
        }

        fn describe(&self) -> String {
            "toggle".to_owned()
        }
    }

    fn records() -> Vec<Value> {
        vec![
            json!({
                "id": "1",
                "name": "Koramangala",
                "coordinates": {"latitude": 12.9352, "longitude": 77.6245},
                "radius": 5,
                "deliveryFee": 29,
                "isActive": true
            }),
            json!({
                "id": "2",
                "name": "Indiranagar",
                "coordinates": {"latitude": 12.9719, "longitude": 77.6412},
                "radius": 5,
                "isActive": false
            }),
            json!({
                "id": "3",
                "name": "HSR Layout",
                "polygon": [
                    {"latitude": 12.90, "longitude": 77.63},
                    {"latitude": 12.90, "longitude": 77.66},
                    {"latitude": 12.93, "longitude": 77.66},
                    {"latitude": 12.93, "longitude": 77.63}
                ],
                "isActive": true
            }),
        ]
    }

    fn ids(zones: &[ServiceZone]) -> Vec<String> {
        zones.iter().map(|zone| zone.id.raw()).collect()
    }

    #[tokio::test]
    async fn refresh_loads_zones_and_filters_active() {
        let (source, _) = ToggleSource::new(records());
        let mut repo = ZoneRepo::new(source);

        assert_eq!(repo.refresh().await.unwrap(), 3);
        assert_eq!(ids(&repo.zones()), vec!["1", "2", "3"]);
        assert_eq!(ids(&repo.active_zones()), vec!["1", "3"]);
        assert_eq!(repo.snapshot_origin(), Some(SnapshotOrigin::Source));
        assert!(repo.fetched_at().is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_zones() {
        let (source, online) = ToggleSource::new(records());
        let mut repo = ZoneRepo::new(source);
        repo.refresh().await.unwrap();

        online.store(false, Ordering::SeqCst);
        assert_eq!(repo.refresh().await.unwrap(), 3);
        assert_eq!(ids(&repo.active_zones()), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn unavailable_without_any_data() {
        let (source, online) = ToggleSource::new(records());
        online.store(false, Ordering::SeqCst);
        let mut repo = ZoneRepo::new(source);

        assert!(matches!(repo.refresh().await, Err(StoreError::Unavailable)));
        assert!(repo.zones().is_empty());
    }

    #[tokio::test]
    async fn empty_source_is_treated_like_a_failure() {
        let (source, _) = ToggleSource::new(vec![]);
        let mut repo = ZoneRepo::new(source);
        assert!(matches!(repo.refresh().await, Err(StoreError::Unavailable)));
    }

    #[tokio::test]
    async fn cache_file_is_used_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("zones-cache.json");

        let (source, _) = ToggleSource::new(records());
        let mut repo = ZoneRepo::new(source).with_cache_file(&cache);
        repo.refresh().await.unwrap();
        assert!(cache.exists());

        let (source, online) = ToggleSource::new(records());
        online.store(false, Ordering::SeqCst);
        let mut restarted = ZoneRepo::new(source).with_cache_file(&cache);
        assert_eq!(restarted.refresh().await.unwrap(), 3);
        assert_eq!(restarted.snapshot_origin(), Some(SnapshotOrigin::Cache));
        assert_eq!(restarted.zones(), repo.zones());
    }

    #[tokio::test]
    async fn zone_lookup_by_id() {
        let (source, _) = ToggleSource::new(records());
        let mut repo = ZoneRepo::new(source);
        repo.refresh().await.unwrap();

        let zone = repo.zone(&Id::from("1")).unwrap();
        assert_eq!(zone.name, "Koramangala");
        assert!(matches!(
            repo.zone(&Id::from("missing")),
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn inactive_zone_is_not_found_as_active() {
        let (source, _) = ToggleSource::new(records());
        let mut repo = ZoneRepo::new(source);
        repo.refresh().await.unwrap();

        assert!(repo.zone(&Id::from("2")).is_ok());
        assert!(matches!(
            repo.active_zone(&Id::from("2")),
            Err(StoreError::NotFound)
        ));
        assert_eq!(repo.active_zone(&Id::from("3")).unwrap().name, "HSR Layout");
    }

    #[tokio::test]
    async fn loader_runs_without_borrowing_the_repo() {
        let (source, _) = ToggleSource::new(records());
        let mut repo = ZoneRepo::new(source);

        let loader = repo.loader();
        assert!(repo.zones().is_empty());
        let loaded = loader.load().await;
        assert!(repo.zones().is_empty());

        assert_eq!(repo.apply(loaded).unwrap(), 3);
        assert_eq!(ids(&repo.zones()), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn late_cache_load_does_not_replace_fresh_zones() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("zones-cache.json");
        let (source, _) = ToggleSource::new(records());
        let mut seeding = ZoneRepo::new(source).with_cache_file(&cache);
        seeding.refresh().await.unwrap();

        let (offline, online) = ToggleSource::new(vec![]);
        online.store(false, Ordering::SeqCst);
        let late = ZoneRepo::new(offline)
            .with_cache_file(&cache)
            .loader()
            .load()
            .await;
        assert!(matches!(&late, Ok(Some(snapshot)) if snapshot.len() == 3));

        let (source, _) = ToggleSource::new(records()[..1].to_vec());
        let mut repo = ZoneRepo::new(source);
        repo.refresh().await.unwrap();

        assert_eq!(repo.apply(late).unwrap(), 1);
        assert_eq!(repo.snapshot_origin(), Some(SnapshotOrigin::Source));
    }

    #[tokio::test]
    async fn duplicate_ids_keep_the_latest_record() {
        let mut values = records();
        values.push(json!({
            "id": "1",
            "name": "Koramangala (new)",
            "coordinates": {"latitude": 12.9352, "longitude": 77.6245},
            "radius": 6,
            "isActive": true
        }));
        let (source, _) = ToggleSource::new(values);
        let mut repo = ZoneRepo::new(source);

        assert_eq!(repo.refresh().await.unwrap(), 3);
        assert_eq!(ids(&repo.zones()), vec!["1", "2", "3"]);
        assert_eq!(repo.zones()[0].name, "Koramangala (new)");
    }
}
