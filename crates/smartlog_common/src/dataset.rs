//! Dataset cache
//!
//! Two independent tables, each with a remote JSON source, a local delimited
//! fallback and a 30 second TTL:
//!
//! - parts / stock: `{"data": [{"KanbanNo": "...", ...}, ...]}`
//! - delivery / route status: `{"data": [["43", "...", "RC16-02", ...], ...]}`
//!
//! Fallback order on a failed refresh: previous remote data (restamped),
//! local file, built-in sample rows (parts only, when enabled), empty table.
//! Nothing in here returns an error to the caller; `DatasetOrigin::Unavailable`
//! is the signal that no data could be read.
//!
//! Entries are replaced wholesale under a lock, so concurrent callers may both
//! refresh on first fill but never observe a half-written table.

use crate::config::{
    effective_timeout, effective_ttl, DeliverySourceConfig, PartsSourceConfig, SmartlogConfig,
};
use crate::error::{DatasetError, TransportError};
use crate::parsers::parse_delimited;
use crate::record::{DeliveryLayout, PartField, Record, Schema};
use crate::transport::DatasetTransport;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where the rows of a dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetOrigin {
    Remote,
    /// Previous remote rows kept after a failed refresh
    StaleCache,
    LocalFile,
    Sample,
    Unavailable,
}

impl DatasetOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetOrigin::Remote => "remote",
            DatasetOrigin::StaleCache => "stale-cache",
            DatasetOrigin::LocalFile => "local-file",
            DatasetOrigin::Sample => "sample",
            DatasetOrigin::Unavailable => "unavailable",
        }
    }
}

/// A snapshot of one table
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<Record>,
    pub origin: DatasetOrigin,
    pub fetched_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(rows: Vec<Record>, origin: DatasetOrigin) -> Self {
        Self {
            rows,
            origin,
            fetched_at: Utc::now(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(Vec::new(), DatasetOrigin::Unavailable)
    }

    pub fn is_unavailable(&self) -> bool {
        self.origin == DatasetOrigin::Unavailable
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Which table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Parts,
    Delivery,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Parts => "parts",
            DatasetKind::Delivery => "delivery",
        }
    }
}

struct CacheEntry {
    dataset: Arc<Dataset>,
    stored_at: Instant,
}

/// Time-bounded cache over both tables
pub struct DatasetCache {
    parts_config: PartsSourceConfig,
    delivery_config: DeliverySourceConfig,
    layout: DeliveryLayout,
    transport: Arc<dyn DatasetTransport>,
    parts_ttl: Duration,
    delivery_ttl: Duration,
    parts: RwLock<Option<CacheEntry>>,
    delivery: RwLock<Option<CacheEntry>>,
}

impl DatasetCache {
    pub fn new(config: &SmartlogConfig, transport: Arc<dyn DatasetTransport>) -> Self {
        Self {
            parts_config: config.parts.clone(),
            delivery_config: config.delivery.clone(),
            layout: DeliveryLayout::from_columns(&config.delivery.columns),
            transport,
            parts_ttl: effective_ttl(config.parts.ttl_secs),
            delivery_ttl: effective_ttl(config.delivery.ttl_secs),
            parts: RwLock::new(None),
            delivery: RwLock::new(None),
        }
    }

    /// Override both TTLs without clamping (tests use zero to force staleness)
    pub fn with_ttls(mut self, parts: Duration, delivery: Duration) -> Self {
        self.parts_ttl = parts;
        self.delivery_ttl = delivery;
        self
    }

    /// Parts / stock table, refreshed when stale or forced
    pub fn get_parts_dataset(&self, force_refresh: bool) -> Arc<Dataset> {
        if !force_refresh {
            if let Some(fresh) = fresh_entry(&self.parts, self.parts_ttl) {
                return fresh;
            }
        }

        let dataset = self.refresh(DatasetKind::Parts);
        store(&self.parts, dataset)
    }

    /// Delivery / route-status table, refreshed when stale
    pub fn get_delivery_dataset(&self) -> Arc<Dataset> {
        if let Some(fresh) = fresh_entry(&self.delivery, self.delivery_ttl) {
            return fresh;
        }

        let dataset = self.refresh(DatasetKind::Delivery);
        store(&self.delivery, dataset)
    }

    /// Force the next access of `kind` to refetch
    pub fn invalidate(&self, kind: DatasetKind) {
        let slot = match kind {
            DatasetKind::Parts => &self.parts,
            DatasetKind::Delivery => &self.delivery,
        };
        *slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn refresh(&self, kind: DatasetKind) -> Dataset {
        match self.fetch_remote(kind) {
            Ok(rows) => {
                info!("Fetched {} {} rows from remote source", rows.len(), kind.as_str());
                return Dataset::new(rows, DatasetOrigin::Remote);
            }
            Err(e) => warn!("Remote {} source failed: {}", kind.as_str(), e),
        }

        if let Some(previous) = self.previous_remote(kind) {
            warn!(
                "Serving previous {} rows ({} rows) after failed refresh",
                kind.as_str(),
                previous.len()
            );
            return Dataset::new(previous.rows.clone(), DatasetOrigin::StaleCache);
        }

        match self.load_fallback_file(kind) {
            Ok(rows) => {
                info!("Loaded {} {} rows from fallback file", rows.len(), kind.as_str());
                return Dataset::new(rows, DatasetOrigin::LocalFile);
            }
            Err(e) => warn!("Fallback file for {} unusable: {}", kind.as_str(), e),
        }

        if kind == DatasetKind::Parts && self.parts_config.sample_fallback {
            warn!("Using built-in sample parts dataset");
            return Dataset::new(sample_parts(), DatasetOrigin::Sample);
        }

        warn!("No {} data available", kind.as_str());
        Dataset::unavailable()
    }

    fn previous_remote(&self, kind: DatasetKind) -> Option<Arc<Dataset>> {
        let slot = match kind {
            DatasetKind::Parts => &self.parts,
            DatasetKind::Delivery => &self.delivery,
        };
        let guard = slot.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .map(|entry| entry.dataset.clone())
            .filter(|d| matches!(d.origin, DatasetOrigin::Remote | DatasetOrigin::StaleCache))
    }

    fn fetch_remote(&self, kind: DatasetKind) -> Result<Vec<Record>, TransportError> {
        let (url, timeout) = match kind {
            DatasetKind::Parts => (&self.parts_config.url, self.parts_config.timeout_secs),
            DatasetKind::Delivery => (&self.delivery_config.url, self.delivery_config.timeout_secs),
        };

        debug!("Fetching {} dataset from {}", kind.as_str(), url);
        let payload = self.transport.fetch_json(url, effective_timeout(timeout))?;
        let data = payload
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or(TransportError::MissingData)?;

        let records: Vec<Record> = data
            .iter()
            .filter_map(|row| self.row_to_record(kind, row))
            .collect();

        if !data.is_empty() && records.is_empty() {
            return Err(TransportError::InvalidJson(format!(
                "none of the {} {} rows has a usable shape",
                data.len(),
                kind.as_str()
            )));
        }
        Ok(records)
    }

    fn row_to_record(&self, kind: DatasetKind, row: &serde_json::Value) -> Option<Record> {
        match (kind, row) {
            (DatasetKind::Parts, serde_json::Value::Object(obj)) => {
                Some(Record::from_json_object(obj, Schema::Parts))
            }
            (DatasetKind::Delivery, serde_json::Value::Array(values)) => {
                Some(Record::from_positional(values, &self.layout))
            }
            (DatasetKind::Delivery, serde_json::Value::Object(obj)) => {
                Some(Record::from_json_object(obj, Schema::Delivery))
            }
            _ => {
                debug!("Skipping {} row with unexpected shape", kind.as_str());
                None
            }
        }
    }

    fn load_fallback_file(&self, kind: DatasetKind) -> Result<Vec<Record>, DatasetError> {
        let (path, delimiter, schema) = match kind {
            DatasetKind::Parts => (
                self.parts_config.fallback_file.as_deref(),
                self.parts_config.delimiter,
                Schema::Parts,
            ),
            DatasetKind::Delivery => (
                self.delivery_config.fallback_file.as_deref(),
                self.delivery_config.delimiter,
                Schema::Delivery,
            ),
        };
        let path = path.ok_or(DatasetError::NoFallback)?;
        load_delimited_records(path, delimiter, schema)
    }
}

/// Read and normalise a delimited fallback file
pub fn load_delimited_records(
    path: &Path,
    delimiter: char,
    schema: Schema,
) -> Result<Vec<Record>, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse_delimited(&text, delimiter)?
        .into_iter()
        .map(|row| Record::from_pairs(row, schema))
        .collect())
}

fn fresh_entry(slot: &RwLock<Option<CacheEntry>>, ttl: Duration) -> Option<Arc<Dataset>> {
    let guard = slot.read().unwrap_or_else(|e| e.into_inner());
    guard
        .as_ref()
        .filter(|entry| entry.stored_at.elapsed() < ttl)
        .map(|entry| entry.dataset.clone())
}

fn store(slot: &RwLock<Option<CacheEntry>>, dataset: Dataset) -> Arc<Dataset> {
    let dataset = Arc::new(dataset);
    let mut guard = slot.write().unwrap_or_else(|e| e.into_inner());
    *guard = Some(CacheEntry {
        dataset: dataset.clone(),
        stored_at: Instant::now(),
    });
    dataset
}

/// Last-resort rows so the assistant stays demonstrable offline
pub fn sample_parts() -> Vec<Record> {
    let rows: [[(PartField, &str); 8]; 3] = [
        [
            (PartField::KanbanNo, "105D"),
            (PartField::PartName, "AIR CLEANER ASSY"),
            (PartField::PartNo, "17700-0Y110"),
            (PartField::SupplierName, "SUGITY CREATIVES"),
            (PartField::StockOverall, "248"),
            (PartField::StockSpsMinutes, "315"),
            (PartField::PcsPerKanban, "8"),
            (PartField::DockCode, "43"),
        ],
        [
            (PartField::KanbanNo, "106E"),
            (PartField::PartName, "BRACKET FR BUMPER"),
            (PartField::PartNo, "52115-0K010"),
            (PartField::SupplierName, "INOAC POLYTECHNO"),
            (PartField::StockOverall, "96"),
            (PartField::StockSpsMinutes, "120"),
            (PartField::PcsPerKanban, "12"),
            (PartField::DockCode, "43"),
        ],
        [
            (PartField::KanbanNo, "2231"),
            (PartField::PartName, "HOSE RADIATOR INLET"),
            (PartField::PartNo, "16571-0Y020"),
            (PartField::SupplierName, "SUGITY CREATIVES"),
            (PartField::StockOverall, "40"),
            (PartField::StockSpsMinutes, "75"),
            (PartField::PcsPerKanban, "20"),
            (PartField::DockCode, "43"),
        ],
    ];

    rows.iter()
        .map(|fields| {
            let mut record = Record::new();
            for (field, value) in fields {
                record.insert(field.canonical_name(), *value);
            }
            record
        })
        .collect()
}
