//! Records and schema mapping
//!
//! Both datasets end up as `Record`s: an ordered map of canonical field name
//! to string value. Parts rows arrive as named JSON objects or as header-driven
//! delimited lines; delivery rows arrive as positional arrays. The mapping
//! tables below translate each raw shape into canonical names so business
//! logic never touches a raw header or a magic index.

use crate::config::DeliveryColumns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of a dataset, keyed by canonical field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(raw_name, value)` pairs, normalising each name
    pub fn from_pairs<I, K, V>(pairs: I, schema: Schema) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.insert(&schema.normalize(name.as_ref()), value);
        }
        record
    }

    /// Build from a named JSON row (`{"Kanban No": "105D", ...}`)
    pub fn from_json_object(
        object: &serde_json::Map<String, serde_json::Value>,
        schema: Schema,
    ) -> Self {
        Self::from_pairs(
            object.iter().map(|(k, v)| (k.as_str(), json_to_string(v))),
            schema,
        )
    }

    /// Build from a positional JSON row using the delivery layout
    pub fn from_positional(values: &[serde_json::Value], layout: &DeliveryLayout) -> Self {
        let mut record = Self::new();
        for (index, value) in values.iter().enumerate() {
            let name = layout
                .name_at(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("col{}", index));
            record.insert(&name, json_to_string(value));
        }
        record
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Raw value, possibly empty
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Trimmed value, `None` when missing or blank
    pub fn get_nonempty(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn part(&self, field: PartField) -> Option<&str> {
        self.get_nonempty(field.canonical_name())
    }

    pub fn delivery(&self, field: DeliveryField) -> Option<&str> {
        self.get_nonempty(field.canonical_name())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonical parts / stock fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartField {
    KanbanNo,
    PartName,
    PartNo,
    SupplierName,
    SupplierCode,
    PlantCode,
    DockCode,
    KanbanAddress,
    StockOverall,
    StockSps,
    StockReceiving,
    StockSpsMinutes,
    PcsPerKanban,
    LastReceivedDate,
    StockOverflow,
}

impl PartField {
    pub const ALL: [PartField; 15] = [
        PartField::KanbanNo,
        PartField::PartName,
        PartField::PartNo,
        PartField::SupplierName,
        PartField::SupplierCode,
        PartField::PlantCode,
        PartField::DockCode,
        PartField::KanbanAddress,
        PartField::StockOverall,
        PartField::StockSps,
        PartField::StockReceiving,
        PartField::StockSpsMinutes,
        PartField::PcsPerKanban,
        PartField::LastReceivedDate,
        PartField::StockOverflow,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            PartField::KanbanNo => "kanbanno",
            PartField::PartName => "partname",
            PartField::PartNo => "partno",
            PartField::SupplierName => "suppliername",
            PartField::SupplierCode => "suppliercode",
            PartField::PlantCode => "plantcode",
            PartField::DockCode => "dockcode",
            PartField::KanbanAddress => "kanbanaddress",
            PartField::StockOverall => "stockoverall",
            PartField::StockSps => "stocksps",
            PartField::StockReceiving => "stockreceiving",
            PartField::StockSpsMinutes => "stockspsminutes",
            PartField::PcsPerKanban => "pcsperkanban",
            PartField::LastReceivedDate => "lastreceiveddate",
            PartField::StockOverflow => "stockoverflow",
        }
    }
}

/// Canonical delivery fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryField {
    Dock,
    Supplier,
    Route,
    Cycle,
    ScheduledArrival,
    ActualArrival,
    Status,
}

impl DeliveryField {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            DeliveryField::Dock => "dock",
            DeliveryField::Supplier => "supplier",
            DeliveryField::Route => "route",
            DeliveryField::Cycle => "cycle",
            DeliveryField::ScheduledArrival => "scheduled_arrival",
            DeliveryField::ActualArrival => "actual_arrival",
            DeliveryField::Status => "status",
        }
    }
}

/// Which dataset a raw header belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Parts,
    Delivery,
}

impl Schema {
    /// Trim, lowercase, drop punctuation and whitespace, then apply the alias table
    pub fn normalize(&self, raw: &str) -> String {
        let compact = compact_name(raw);
        let aliases = match self {
            Schema::Parts => PART_ALIASES,
            Schema::Delivery => DELIVERY_ALIASES,
        };
        aliases
            .iter()
            .find(|(alias, _)| *alias == compact)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(compact)
    }
}

/// Header spellings seen in the remote feed and the exported spreadsheets,
/// after compaction (lowercase, alphanumerics only).
const PART_ALIASES: &[(&str, &str)] = &[
    ("kanban", "kanbanno"),
    ("kanbannumber", "kanbanno"),
    ("kanbancode", "kanbanno"),
    ("partnumber", "partno"),
    ("nopart", "partno"),
    ("namapart", "partname"),
    ("description", "partname"),
    ("supplier", "suppliername"),
    ("supplierexportername", "suppliername"),
    ("exportername", "suppliername"),
    ("suppcode", "suppliercode"),
    ("suppliercd", "suppliercode"),
    ("plant", "plantcode"),
    ("dock", "dockcode"),
    ("address", "kanbanaddress"),
    ("lineaddress", "kanbanaddress"),
    ("alamat", "kanbanaddress"),
    ("stock", "stockoverall"),
    ("stok", "stockoverall"),
    ("totalstock", "stockoverall"),
    ("stockminutes", "stockspsminutes"),
    ("stockspsmenit", "stockspsminutes"),
    ("orderlotsize", "pcsperkanban"),
    ("lotsize", "pcsperkanban"),
    ("qtybox", "pcsperkanban"),
    ("qtyperbox", "pcsperkanban"),
    ("qtyperkanban", "pcsperkanban"),
    ("lastreceived", "lastreceiveddate"),
    ("overflow", "stockoverflow"),
];

const DELIVERY_ALIASES: &[(&str, &str)] = &[
    ("dockcode", "dock"),
    ("dockno", "dock"),
    ("suppliername", "supplier"),
    ("routename", "route"),
    ("rute", "route"),
    ("kanbanname", "route"),
    ("scheduledarrival", "scheduled_arrival"),
    ("planarrival", "scheduled_arrival"),
    ("actualarrival", "actual_arrival"),
    ("rawstatus", "status"),
];

fn compact_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Canonical parts field name for a raw header
pub fn normalize_field_name(raw: &str) -> String {
    Schema::Parts.normalize(raw)
}

/// Positional index → canonical name for delivery rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLayout {
    slots: Vec<(usize, DeliveryField)>,
}

impl DeliveryLayout {
    pub fn from_columns(columns: &DeliveryColumns) -> Self {
        Self {
            slots: vec![
                (columns.dock, DeliveryField::Dock),
                (columns.supplier, DeliveryField::Supplier),
                (columns.route, DeliveryField::Route),
                (columns.cycle, DeliveryField::Cycle),
                (columns.scheduled_arrival, DeliveryField::ScheduledArrival),
                (columns.actual_arrival, DeliveryField::ActualArrival),
                (columns.status, DeliveryField::Status),
            ],
        }
    }

    pub fn name_at(&self, index: usize) -> Option<&'static str> {
        self.slots
            .iter()
            .find(|(slot, _)| *slot == index)
            .map(|(_, field)| field.canonical_name())
    }
}

impl Default for DeliveryLayout {
    fn default() -> Self {
        Self::from_columns(&DeliveryColumns::default())
    }
}

/// OTIF-style delivery status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Arrived,
    Advanced,
    Late,
    Delay,
    Waiting,
    /// Unrecognised value, kept lowercased and trimmed
    Other(String),
}

impl DeliveryStatus {
    pub fn normalize(raw: &str) -> Self {
        let status = raw.trim().to_lowercase();
        match status.as_str() {
            "arrived" => DeliveryStatus::Arrived,
            "advanced" => DeliveryStatus::Advanced,
            "late" => DeliveryStatus::Late,
            "delay" => DeliveryStatus::Delay,
            "waiting" => DeliveryStatus::Waiting,
            _ => DeliveryStatus::Other(status),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeliveryStatus::Arrived => "arrived",
            DeliveryStatus::Advanced => "advanced",
            DeliveryStatus::Late => "late",
            DeliveryStatus::Delay => "delay",
            DeliveryStatus::Waiting => "waiting",
            DeliveryStatus::Other(s) => s,
        }
    }

    /// Status of a delivery record; blank when the field is missing
    pub fn of(record: &Record) -> Self {
        Self::normalize(record.get(DeliveryField::Status.canonical_name()).unwrap_or(""))
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
