//! Time-series store for observed records and the latest predictions
//!
//! Records are keyed by their timestamp so that key order is time order;
//! the newest record gives the forecast anchor.

use crate::models::{ForecastRow, ForecastTable, WeatherRecord};
use crate::{MeteocastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Database, Keyspace};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::Path;
use tokio::sync::RwLock;
use tokio::task;

#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Store a record unless one already exists for its timestamp.
    /// Returns `true` when the record was written.
    async fn insert_record(&self, record: WeatherRecord) -> Result<bool>;

    /// Records at or after `lower_bound`, oldest first
    async fn query_range(&self, lower_bound: DateTime<Utc>) -> Result<Vec<WeatherRecord>>;

    /// Timestamp of the newest record
    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>>;

    /// Drop every stored prediction, then store the rows of `table`
    async fn replace_predictions(&self, table: &ForecastTable) -> Result<usize>;

    /// Stored predictions, oldest first
    async fn predictions(&self) -> Result<Vec<ForecastRow>>;
}

fn store_err(err: impl Display) -> MeteocastError {
    MeteocastError::store(err.to_string())
}

/// Order-preserving key: big-endian seconds with the sign bit flipped
fn timestamp_key(timestamp: DateTime<Utc>) -> [u8; 8] {
    ((timestamp.timestamp() as u64) ^ (1 << 63)).to_be_bytes()
}

/// Persistent store on an embedded `fjall` database
pub struct FjallStore {
    db: Database,
    records: Keyspace,
    predictions: Keyspace,
}

impl FjallStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path.as_ref()).open().map_err(store_err)?;
        let records = db
            .keyspace("records", fjall::KeyspaceCreateOptions::default)
            .map_err(store_err)?;
        let predictions = db
            .keyspace("predictions", fjall::KeyspaceCreateOptions::default)
            .map_err(store_err)?;
        Ok(FjallStore {
            db,
            records,
            predictions,
        })
    }
}

fn insert_if_absent(store: Keyspace, key: [u8; 8], bytes: Vec<u8>) -> Result<bool> {
    if store.get(key).map_err(store_err)?.is_some() {
        return Ok(false);
    }
    store.insert(key.to_vec(), bytes).map_err(store_err)?;
    Ok(true)
}

fn scan_records(store: Keyspace, start: [u8; 8]) -> Result<Vec<WeatherRecord>> {
    let mut records = Vec::new();
    for kv in store.range(start..) {
        let (_, value) = kv.into_inner().map_err(store_err)?;
        records.push(postcard::from_bytes(&value).map_err(store_err)?);
    }
    Ok(records)
}

fn last_record(store: Keyspace) -> Result<Option<WeatherRecord>> {
    match store.iter().next_back() {
        Some(kv) => {
            let (_, value) = kv.into_inner().map_err(store_err)?;
            Ok(Some(postcard::from_bytes(&value).map_err(store_err)?))
        }
        None => Ok(None),
    }
}

/// Swap the whole prediction set in one write batch. Keys that are rewritten
/// are not also removed, so no key appears twice in the batch.
fn rewrite_predictions(
    db: Database,
    store: Keyspace,
    rows: Vec<([u8; 8], Vec<u8>)>,
) -> Result<usize> {
    let fresh: BTreeSet<[u8; 8]> = rows.iter().map(|(key, _)| *key).collect();
    let mut batch = db.batch();
    for kv in store.iter() {
        let (key, _) = kv.into_inner().map_err(store_err)?;
        if !fresh.contains(&*key) {
            batch.remove(&store, key);
        }
    }
    let written = rows.len();
    for (key, bytes) in rows {
        batch.insert(&store, key.to_vec(), bytes);
    }
    batch.commit().map_err(store_err)?;
    Ok(written)
}

fn scan_predictions(store: Keyspace) -> Result<Vec<ForecastRow>> {
    let mut rows = Vec::new();
    for kv in store.iter() {
        let (_, value) = kv.into_inner().map_err(store_err)?;
        rows.push(serde_json::from_slice(&value).map_err(store_err)?);
    }
    Ok(rows)
}

#[async_trait]
impl TimeSeriesStore for FjallStore {
    #[tracing::instrument(name = "insert_record", level = "debug", skip_all, fields(timestamp = %record.timestamp))]
    async fn insert_record(&self, record: WeatherRecord) -> Result<bool> {
        let store = self.records.clone();
        let key = timestamp_key(record.timestamp);
        let bytes = postcard::to_stdvec(&record).map_err(store_err)?;
        task::spawn_blocking(move || insert_if_absent(store, key, bytes))
            .await
            .map_err(store_err)?
    }

    #[tracing::instrument(name = "query_range", level = "debug", skip(self))]
    async fn query_range(&self, lower_bound: DateTime<Utc>) -> Result<Vec<WeatherRecord>> {
        let store = self.records.clone();
        let start = timestamp_key(lower_bound);
        let records = task::spawn_blocking(move || scan_records(store, start))
            .await
            .map_err(store_err)??;
        tracing::debug!(count = records.len(), "Records found");
        Ok(records)
    }

    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let store = self.records.clone();
        let last = task::spawn_blocking(move || last_record(store))
            .await
            .map_err(store_err)??;
        Ok(last.map(|record| record.timestamp))
    }

    async fn replace_predictions(&self, table: &ForecastTable) -> Result<usize> {
        // prediction rows hold untagged estimates, which need a self-describing format
        let rows = table
            .rows
            .iter()
            .map(|row| {
                let key = timestamp_key(row.timestamp.with_timezone(&Utc));
                serde_json::to_vec(row).map(|bytes| (key, bytes))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)?;
        let db = self.db.clone();
        let store = self.predictions.clone();
        task::spawn_blocking(move || rewrite_predictions(db, store, rows))
            .await
            .map_err(store_err)?
    }

    async fn predictions(&self) -> Result<Vec<ForecastRow>> {
        let store = self.predictions.clone();
        task::spawn_blocking(move || scan_predictions(store))
            .await
            .map_err(store_err)?
    }
}

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<DateTime<Utc>, WeatherRecord>>,
    predictions: RwLock<Vec<ForecastRow>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn insert_record(&self, record: WeatherRecord) -> Result<bool> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.timestamp) {
            return Ok(false);
        }
        records.insert(record.timestamp, record);
        Ok(true)
    }

    async fn query_range(&self, lower_bound: DateTime<Utc>) -> Result<Vec<WeatherRecord>> {
        let records = self.records.read().await;
        Ok(records.range(lower_bound..).map(|(_, r)| r.clone()).collect())
    }

    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let records = self.records.read().await;
        Ok(records.keys().next_back().copied())
    }

    async fn replace_predictions(&self, table: &ForecastTable) -> Result<usize> {
        let mut predictions = self.predictions.write().await;
        *predictions = table.rows.clone();
        predictions.sort_by_key(|row| row.timestamp);
        Ok(predictions.len())
    }

    async fn predictions(&self) -> Result<Vec<ForecastRow>> {
        Ok(self.predictions.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Estimate, Variable};
    use chrono::{TimeDelta, TimeZone, Timelike};
    use tempfile::TempDir;

    fn record(hour: u32, temperature: f64) -> WeatherRecord {
        let mut record = WeatherRecord::new(Utc.with_ymd_and_hms(2025, 4, 20, hour, 0, 0).unwrap());
        record.temperature = Some(temperature);
        record.pressure = Some(1008.5);
        record
    }

    fn table(first_hour: u32, rows: u32) -> ForecastTable {
        let mut table = ForecastTable::new(vec![Variable::Temperature]);
        for i in 0..rows {
            let ts = Utc.with_ymd_and_hms(2025, 4, 21, first_hour + i, 0, 0).unwrap();
            let mut values = BTreeMap::new();
            values.insert(Variable::Temperature, Estimate::Value(30.0 + f64::from(i)));
            table.push_row(ts.fixed_offset(), values);
        }
        table
    }

    async fn exercise(store: &dyn TimeSeriesStore) {
        assert_eq!(store.latest_timestamp().await.unwrap(), None);

        assert!(store.insert_record(record(9, 31.0)).await.unwrap());
        assert!(store.insert_record(record(7, 29.0)).await.unwrap());
        assert!(store.insert_record(record(8, 30.0)).await.unwrap());
        // duplicate timestamp is skipped
        assert!(!store.insert_record(record(8, 99.0)).await.unwrap());

        let lower = Utc.with_ymd_and_hms(2025, 4, 20, 8, 0, 0).unwrap();
        let found = store.query_range(lower).await.unwrap();
        let temps: Vec<_> = found.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![Some(30.0), Some(31.0)]);

        let latest = store.latest_timestamp().await.unwrap().unwrap();
        assert_eq!(latest, lower + TimeDelta::hours(1));

        assert_eq!(store.replace_predictions(&table(0, 3)).await.unwrap(), 3);
        assert_eq!(store.replace_predictions(&table(10, 2)).await.unwrap(), 2);
        let predictions = store.predictions().await.unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].get(Variable::Temperature), Estimate::Value(30.0));
    }

    /// Rows after a second replace, overlapping the first set at hours 2 and 3
    async fn exercise_overlapping_replace(store: &dyn TimeSeriesStore) {
        store.replace_predictions(&table(0, 4)).await.unwrap();
        let second = table(2, 3);
        store.replace_predictions(&second).await.unwrap();

        let predictions = store.predictions().await.unwrap();
        assert_eq!(predictions, second.rows);
        let hours: Vec<u32> = predictions.iter().map(|row| row.timestamp.hour()).collect();
        assert_eq!(hours, vec![2, 3, 4]);
        // hour 2 held 32.0 before the rewrite
        assert_eq!(predictions[0].get(Variable::Temperature), Estimate::Value(30.0));
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryStore::new()).await;
        exercise_overlapping_replace(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_fjall_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallStore::open(temp_dir.path()).unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_fjall_replace_leaves_only_new_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallStore::open(temp_dir.path()).unwrap();
        exercise_overlapping_replace(&store).await;
    }

    #[test]
    fn test_timestamp_key_orders_like_time() {
        let before_epoch = Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap();
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 4, 20, 0, 0, 0).unwrap();
        assert!(timestamp_key(before_epoch) < timestamp_key(epoch));
        assert!(timestamp_key(epoch) < timestamp_key(later));
    }
}
