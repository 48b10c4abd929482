use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use log::{debug, warn};
use model::record::ZoneRecord;
use serde_json::Value;

use crate::StoreResult;

/// Somewhere zone records can be fetched from.
#[async_trait]
pub trait ZoneSource: Send + Sync {
    async fn fetch_records(&self) -> StoreResult<Vec<ZoneRecord>>;

    /// Human readable description used in log messages.
    fn describe(&self) -> String;
}

#[async_trait]
impl<S> ZoneSource for Box<S>
where
    S: ZoneSource + ?Sized,
{
    async fn fetch_records(&self) -> StoreResult<Vec<ZoneRecord>> {
        (**self).fetch_records().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Decodes every record on its own, so a single corrupt document only drops
/// itself instead of the whole collection.
pub fn decode_records(values: Vec<Value>) -> Vec<ZoneRecord> {
    let total = values.len();
    let records = values
        .into_iter()
        .filter_map(|value| {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_owned();
            serde_json::from_value::<ZoneRecord>(value)
                .map_err(|why| warn!("skipping malformed zone record {}: {}", id, why))
                .ok()
        })
        .collect::<Vec<_>>();
    debug!("decoded {} of {} zone records", records.len(), total);
    records
}

pub struct HttpZoneSource {
    url: String,
    client: reqwest::Client,
}

impl HttpZoneSource {
    /// Requests that take longer than `timeout` fail, so a hanging store
    /// can't stall a refresh forever.
    pub fn new<S: Into<String>>(url: S, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl ZoneSource for HttpZoneSource {
    async fn fetch_records(&self) -> StoreResult<Vec<ZoneRecord>> {
        let values: Vec<Value> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(decode_records(values))
    }

    fn describe(&self) -> String {
        format!("url {}", self.url)
    }
}

pub struct FileZoneSource {
    path: PathBuf,
}

impl FileZoneSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ZoneSource for FileZoneSource {
    async fn fetch_records(&self) -> StoreResult<Vec<ZoneRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let values: Vec<Value> = serde_json::from_str(&content)?;
        Ok(decode_records(values))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
