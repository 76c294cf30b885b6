//! Reply formatting
//!
//! Every reply is one Indonesian sentence (or a short block for route
//! details and summaries). Empty fields read "tidak tersedia".

use crate::delivery::{DeliverySummary, StatusFilter};
use crate::intent::{IntentTag, StockVariant};
use crate::record::{DeliveryField, DeliveryStatus, PartField, Record};
use std::collections::BTreeSet;

pub const NOT_AVAILABLE: &str = "tidak tersedia";
pub const EMPTY_INPUT: &str = "Silakan masukkan pertanyaan.";
pub const DATA_UNAVAILABLE: &str = "Maaf, data saat ini tidak tersedia.";
pub const SYSTEM_ERROR: &str = "Maaf, terjadi masalah pada sistem.";
pub const ASK_FOR_CODE: &str = "Silakan sebutkan kode Kanban atau nomor part.";
pub const UNRECOGNIZED: &str =
    "Permintaan tidak dikenali. Anda bisa menanyakan delivery atau stock parts.";
pub const ASK_FOR_STATUS: &str =
    "Status apa yang ingin ditampilkan? (advanced, late, arrived, delay, waiting)";

fn value_or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn with_unit(value: Option<&str>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", v, unit),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Minutes of stock as hours, two decimals
pub fn minutes_to_hours(minutes: &str) -> Option<f64> {
    let minutes: f64 = minutes.trim().replace(',', ".").parse().ok()?;
    Some((minutes / 60.0 * 100.0).round() / 100.0)
}

fn hours_of(record: &Record) -> Option<String> {
    record
        .part(PartField::StockSpsMinutes)
        .and_then(minutes_to_hours)
        .map(|h| h.to_string())
}

/// Reply for a resolved part, shaped by how many part fields were asked
pub fn format_part_reply(
    code: &str,
    record: &Record,
    tags: &BTreeSet<IntentTag>,
    variant: StockVariant,
) -> String {
    let fields: Vec<IntentTag> = tags.iter().copied().filter(|t| t.is_part_field()).collect();

    match fields.as_slice() {
        [] => format_part_overview(code, record),
        [single] => single_field_sentence(code, record, *single, variant),
        many => {
            let clauses: Vec<String> = many
                .iter()
                .map(|tag| field_clause(record, *tag, variant))
                .collect();
            format!("Untuk Kanban {}: {}.", code, clauses.join(", "))
        }
    }
}

fn single_field_sentence(
    code: &str,
    record: &Record,
    tag: IntentTag,
    variant: StockVariant,
) -> String {
    let get = |field: PartField| record.part(field);

    match tag {
        IntentTag::Stock => match variant {
            StockVariant::Pieces => {
                let details: Vec<String> = [
                    get(PartField::PartName).map(str::to_string),
                    get(PartField::SupplierName).map(|s| format!("supplier {}", s)),
                ]
                .into_iter()
                .flatten()
                .collect();
                let details = if details.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", details.join(", "))
                };
                format!(
                    "Stok Kanban {}{} = {}.",
                    code,
                    details,
                    with_unit(get(PartField::StockOverall), "pcs")
                )
            }
            StockVariant::Minutes => format!(
                "Total Stok Kanban {} = {}.",
                code,
                with_unit(get(PartField::StockSpsMinutes), "menit")
            ),
            StockVariant::Hours => format!(
                "Total Stok Kanban {} = {}.",
                code,
                with_unit(hours_of(record).as_deref(), "jam")
            ),
            StockVariant::Sps => format!(
                "Stock SPS (line side) Kanban {} = {}.",
                code,
                with_unit(get(PartField::StockSps), "pcs")
            ),
            StockVariant::Receiving => format!(
                "Stock Receiving Kanban {} = {}.",
                code,
                with_unit(get(PartField::StockReceiving), "pcs")
            ),
            StockVariant::Overflow => format!(
                "Stock overflow Kanban {} = {}.",
                code,
                value_or_na(get(PartField::StockOverflow))
            ),
        },
        IntentTag::SupplierCode => format!(
            "Supplier code Kanban {} = {}.",
            code,
            value_or_na(get(PartField::SupplierCode))
        ),
        IntentTag::Supplier => format!(
            "Supplier Kanban {} = {}.",
            code,
            value_or_na(get(PartField::SupplierName))
        ),
        IntentTag::Plant => format!(
            "Plant {}, Dock {}.",
            value_or_na(get(PartField::PlantCode)),
            value_or_na(get(PartField::DockCode))
        ),
        IntentTag::Dock => format!(
            "Dock Kanban {} = {}.",
            code,
            value_or_na(get(PartField::DockCode))
        ),
        IntentTag::Address => format!(
            "Alamat Kanban {} = {}.",
            code,
            value_or_na(get(PartField::KanbanAddress))
        ),
        IntentTag::PartNo => format!(
            "Part number Kanban {} = {}.",
            code,
            value_or_na(get(PartField::PartNo))
        ),
        IntentTag::PartName => format!(
            "Nama part Kanban {} = {}.",
            code,
            value_or_na(get(PartField::PartName))
        ),
        IntentTag::LotSize => format!(
            "Isi per Kanban {} = {}.",
            code,
            with_unit(get(PartField::PcsPerKanban), "pcs")
        ),
        IntentTag::LastReceived => format!(
            "Terakhir diterima Kanban {}: {}.",
            code,
            value_or_na(get(PartField::LastReceivedDate))
        ),
        _ => format_part_overview(code, record),
    }
}

fn field_clause(record: &Record, tag: IntentTag, variant: StockVariant) -> String {
    let get = |field: PartField| record.part(field);

    match tag {
        IntentTag::Stock => match variant {
            StockVariant::Pieces => {
                format!("stok {}", with_unit(get(PartField::StockOverall), "pcs"))
            }
            StockVariant::Minutes => {
                format!("stok {}", with_unit(get(PartField::StockSpsMinutes), "menit"))
            }
            StockVariant::Hours => {
                format!("stok {}", with_unit(hours_of(record).as_deref(), "jam"))
            }
            StockVariant::Sps => format!("stok SPS {}", with_unit(get(PartField::StockSps), "pcs")),
            StockVariant::Receiving => format!(
                "stok receiving {}",
                with_unit(get(PartField::StockReceiving), "pcs")
            ),
            StockVariant::Overflow => {
                format!("stok overflow {}", value_or_na(get(PartField::StockOverflow)))
            }
        },
        IntentTag::SupplierCode => {
            format!("supplier code {}", value_or_na(get(PartField::SupplierCode)))
        }
        IntentTag::Supplier => format!("supplier {}", value_or_na(get(PartField::SupplierName))),
        IntentTag::PartNo => format!("part number {}", value_or_na(get(PartField::PartNo))),
        IntentTag::PartName => format!("nama part {}", value_or_na(get(PartField::PartName))),
        IntentTag::LotSize => format!(
            "isi per kanban {}",
            with_unit(get(PartField::PcsPerKanban), "pcs")
        ),
        IntentTag::Plant => format!(
            "plant {}, dock {}",
            value_or_na(get(PartField::PlantCode)),
            value_or_na(get(PartField::DockCode))
        ),
        IntentTag::Dock => format!("dock {}", value_or_na(get(PartField::DockCode))),
        IntentTag::Address => format!("alamat {}", value_or_na(get(PartField::KanbanAddress))),
        IntentTag::LastReceived => format!(
            "terakhir diterima {}",
            value_or_na(get(PartField::LastReceivedDate))
        ),
        other => other.as_str().to_string(),
    }
}

/// Generic sentence when a part was found but no field was asked for
pub fn format_part_overview(code: &str, record: &Record) -> String {
    format!(
        "Kanban {} ditemukan: {}, supplier {}, stok {}, isi per kanban {}, part number {}.",
        code,
        value_or_na(record.part(PartField::PartName)),
        value_or_na(record.part(PartField::SupplierName)),
        with_unit(record.part(PartField::StockOverall), "pcs"),
        with_unit(record.part(PartField::PcsPerKanban), "pcs"),
        value_or_na(record.part(PartField::PartNo))
    )
}

pub fn format_not_found(code: &str) -> String {
    format!("Saya tidak menemukan Kanban {}.", code)
}

/// Sample of a supplier search; `records` is already capped
pub fn format_candidates(supplier: &str, total: usize, records: &[Record]) -> String {
    let examples: Vec<String> = records
        .iter()
        .map(|r| {
            let kanban = value_or_na(r.part(PartField::KanbanNo));
            match r.part(PartField::PartName) {
                Some(name) => format!("{} ({})", name, kanban),
                None => kanban.to_string(),
            }
        })
        .collect();

    format!(
        "Ditemukan {} part untuk supplier {}. Contoh: {}.",
        total,
        supplier,
        examples.join(", ")
    )
}

fn status_label(filter: &StatusFilter) -> String {
    match filter {
        StatusFilter::Status(DeliveryStatus::Arrived) => "delivery yang sudah tiba".to_string(),
        StatusFilter::Status(DeliveryStatus::Advanced) => {
            "delivery yang lebih cepat (advanced)".to_string()
        }
        StatusFilter::Status(DeliveryStatus::Late) => {
            "delivery yang Late (sudah datang lewat jadwal)".to_string()
        }
        StatusFilter::Status(DeliveryStatus::Delay) => {
            "delivery yang Delay (belum datang tapi lewat jadwal)".to_string()
        }
        StatusFilter::Status(DeliveryStatus::Waiting) => {
            "delivery yang Waiting (belum saatnya datang)".to_string()
        }
        StatusFilter::Status(DeliveryStatus::Other(s)) => format!("delivery dengan status {}", s),
        StatusFilter::NotArrived => "delivery yang belum tiba".to_string(),
        StatusFilter::OnTime => "delivery yang On-Time".to_string(),
    }
}

/// "Ada N ..." or, for zero, "Tidak ada ... saat ini."
pub fn format_status_count(filter: &StatusFilter, count: usize) -> String {
    let label = status_label(filter);
    if count == 0 {
        format!("Tidak ada {} saat ini.", label)
    } else {
        format!("Ada {} {}.", count, label)
    }
}

pub fn format_route_detail(route: &str, record: &Record) -> String {
    format!(
        "Informasi Route {}:\n- Status: {}\n- Scheduled Arrival: {}\n- Actual Arrival: {}",
        route,
        value_or_na(record.delivery(DeliveryField::Status)),
        value_or_na(record.delivery(DeliveryField::ScheduledArrival)),
        value_or_na(record.delivery(DeliveryField::ActualArrival))
    )
}

pub fn format_route_not_found(route: &str) -> String {
    format!("Saya tidak menemukan informasi route {}.", route)
}

/// Status name as it reads inside a route-list sentence
fn route_status_label(filter: &StatusFilter) -> &str {
    match filter {
        StatusFilter::Status(DeliveryStatus::Arrived) => "Arrived",
        StatusFilter::Status(DeliveryStatus::Advanced) => "Advanced",
        StatusFilter::Status(DeliveryStatus::Late) => "Late",
        StatusFilter::Status(DeliveryStatus::Delay) => "Delay",
        StatusFilter::Status(DeliveryStatus::Waiting) => "Waiting",
        StatusFilter::Status(DeliveryStatus::Other(s)) => s,
        StatusFilter::NotArrived => "belum tiba",
        StatusFilter::OnTime => "On-Time",
    }
}

pub fn format_route_list(filter: &StatusFilter, routes: &[String]) -> String {
    let label = route_status_label(filter);
    if routes.is_empty() {
        return format!("Tidak ada route yang berstatus {}.", label);
    }
    format!("Berikut route yang {}:\n- {}", label, routes.join("\n- "))
}

pub fn format_summary(summary: &DeliverySummary) -> String {
    format!(
        "Ringkasan Delivery Performance hari ini:\n\
         - Total Delivery: {}\n\
         - Advanced: {}\n\
         - Arrived: {}\n\
         - Late: {}\n\
         - Delay: {}\n\
         - Waiting: {}\n\
         - Belum Tiba: {}\n\
         - On-Time: {}\n\
         - On-Time Ratio: {}%",
        summary.total,
        summary.advanced,
        summary.arrived,
        summary.late,
        summary.delay,
        summary.waiting,
        summary.not_arrived,
        summary.on_time,
        summary.on_time_ratio
    )
}

pub fn format_dock_count(dock: &str, count: usize) -> String {
    format!("Dock {} memiliki {} delivery hari ini.", dock, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::summarize;

    fn part_105d() -> Record {
        let mut r = Record::new();
        r.insert("kanbanno", "105D");
        r.insert("partname", "AIR CLEANER");
        r.insert("suppliername", "SUGITY");
        r.insert("stockoverall", "248");
        r.insert("stockspsminutes", "315");
        r.insert("pcsperkanban", "8");
        r.insert("partno", "17700-0Y110");
        r
    }

    fn tags(list: &[IntentTag]) -> BTreeSet<IntentTag> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_stock_reply_names_supplier() {
        let reply = format_part_reply(
            "105D",
            &part_105d(),
            &tags(&[IntentTag::Stock]),
            StockVariant::Pieces,
        );
        assert_eq!(reply, "Stok Kanban 105D (AIR CLEANER, supplier SUGITY) = 248 pcs.");
    }

    #[test]
    fn test_stock_hours() {
        let reply = format_part_reply(
            "105D",
            &part_105d(),
            &tags(&[IntentTag::Stock]),
            StockVariant::Hours,
        );
        assert_eq!(reply, "Total Stok Kanban 105D = 5.25 jam.");
        assert_eq!(minutes_to_hours("100"), Some(1.67));
        assert_eq!(minutes_to_hours("abc"), None);
    }

    #[test]
    fn test_missing_field_is_not_available() {
        let reply = format_part_reply(
            "105D",
            &part_105d(),
            &tags(&[IntentTag::Address]),
            StockVariant::Pieces,
        );
        assert_eq!(reply, "Alamat Kanban 105D = tidak tersedia.");

        let reply = format_part_reply(
            "105D",
            &part_105d(),
            &tags(&[IntentTag::Stock]),
            StockVariant::Sps,
        );
        assert_eq!(reply, "Stock SPS (line side) Kanban 105D = tidak tersedia.");
    }

    #[test]
    fn test_multiple_intents_are_joined() {
        let reply = format_part_reply(
            "105D",
            &part_105d(),
            &tags(&[IntentTag::Supplier, IntentTag::Stock]),
            StockVariant::Pieces,
        );
        assert_eq!(reply, "Untuk Kanban 105D: stok 248 pcs, supplier SUGITY.");
    }

    #[test]
    fn test_overview_when_no_field_asked() {
        let reply = format_part_reply("105D", &part_105d(), &BTreeSet::new(), StockVariant::Pieces);
        assert!(reply.starts_with("Kanban 105D ditemukan"));
        assert!(reply.contains("AIR CLEANER"));
        assert!(reply.contains("SUGITY"));
        assert!(reply.contains("248 pcs"));
        assert!(reply.contains("17700-0Y110"));
    }

    #[test]
    fn test_status_count_zero_branch() {
        let late = StatusFilter::Status(DeliveryStatus::Late);
        assert_eq!(
            format_status_count(&late, 0),
            "Tidak ada delivery yang Late (sudah datang lewat jadwal) saat ini."
        );
        assert_eq!(
            format_status_count(&StatusFilter::NotArrived, 3),
            "Ada 3 delivery yang belum tiba."
        );
    }

    #[test]
    fn test_route_list() {
        let late = StatusFilter::Status(DeliveryStatus::Late);
        assert_eq!(
            format_route_list(&late, &["RC16-02".to_string(), "RC17-01".to_string()]),
            "Berikut route yang Late:\n- RC16-02\n- RC17-01"
        );
        assert_eq!(format_route_list(&late, &[]), "Tidak ada route yang berstatus Late.");
        assert_eq!(
            format_route_list(&StatusFilter::NotArrived, &["RC18-01".to_string()]),
            "Berikut route yang belum tiba:\n- RC18-01"
        );
        assert_eq!(
            format_route_list(&StatusFilter::OnTime, &[]),
            "Tidak ada route yang berstatus On-Time."
        );
    }

    #[test]
    fn test_route_detail() {
        let mut r = Record::new();
        r.insert("route", "RC16-02");
        r.insert("status", "Arrived");
        r.insert("scheduled_arrival", "08:00");
        r.insert("actual_arrival", "07:55");
        assert_eq!(
            format_route_detail("RC16-02", &r),
            "Informasi Route RC16-02:\n- Status: Arrived\n\
             - Scheduled Arrival: 08:00\n- Actual Arrival: 07:55"
        );
    }

    #[test]
    fn test_candidates() {
        let reply = format_candidates("SUGITY", 12, &[part_105d()]);
        assert_eq!(reply, "Ditemukan 12 part untuk supplier SUGITY. Contoh: AIR CLEANER (105D).");
    }

    #[test]
    fn test_summary_block() {
        let mut rows = Vec::new();
        for status in ["arrived", "late"] {
            let mut r = Record::new();
            r.insert("status", status);
            rows.push(r);
        }
        let reply = format_summary(&summarize(&rows));
        assert!(reply.contains("- Total Delivery: 2"));
        assert!(reply.contains("- On-Time Ratio: 50%"));
    }
}
