//! Delivery statistics over the route-status table

use crate::record::{DeliveryField, DeliveryStatus, Record};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A status question: one OTIF status or one of the derived groups
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFilter {
    Status(DeliveryStatus),
    /// delay + waiting
    NotArrived,
    /// arrived
    OnTime,
}

impl StatusFilter {
    pub fn matches(&self, status: &DeliveryStatus) -> bool {
        match self {
            StatusFilter::Status(s) => s == status,
            StatusFilter::NotArrived => {
                matches!(status, DeliveryStatus::Delay | DeliveryStatus::Waiting)
            }
            StatusFilter::OnTime => *status == DeliveryStatus::Arrived,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusFilter::Status(s) => s.as_str(),
            StatusFilter::NotArrived => "not_arrived",
            StatusFilter::OnTime => "on_time",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OTIF counters for one snapshot of the table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliverySummary {
    pub total: usize,
    pub advanced: usize,
    pub arrived: usize,
    pub late: usize,
    pub delay: usize,
    pub waiting: usize,
    pub not_arrived: usize,
    pub on_time: usize,
    /// Percentage of arrived rows, two decimals
    pub on_time_ratio: f64,
}

pub fn count_status(rows: &[Record], status: &DeliveryStatus) -> usize {
    rows.iter().filter(|r| DeliveryStatus::of(r) == *status).count()
}

pub fn count_filter(rows: &[Record], filter: &StatusFilter) -> usize {
    rows.iter()
        .filter(|r| filter.matches(&DeliveryStatus::of(r)))
        .count()
}

pub fn count_not_arrived(rows: &[Record]) -> usize {
    count_status(rows, &DeliveryStatus::Delay) + count_status(rows, &DeliveryStatus::Waiting)
}

pub fn count_on_time(rows: &[Record]) -> usize {
    count_status(rows, &DeliveryStatus::Arrived)
}

/// Rows whose dock equals `dock` after trimming
pub fn count_by_dock(rows: &[Record], dock: &str) -> usize {
    let dock = dock.trim();
    rows.iter()
        .filter(|r| r.get(DeliveryField::Dock.canonical_name()).map(str::trim) == Some(dock))
        .count()
}

/// Route names in table order for every row matching `filter`
pub fn routes_by_status(rows: &[Record], filter: &StatusFilter) -> Vec<String> {
    rows.iter()
        .filter(|r| filter.matches(&DeliveryStatus::of(r)))
        .filter_map(|r| r.delivery(DeliveryField::Route))
        .map(str::to_string)
        .collect()
}

/// First row whose route equals `name` (trimmed, case-insensitive)
pub fn find_route<'a>(rows: &'a [Record], name: &str) -> Option<&'a Record> {
    let wanted = name.trim().to_lowercase();
    rows.iter().find(|r| {
        r.get(DeliveryField::Route.canonical_name())
            .map(|route| route.trim().to_lowercase() == wanted)
            .unwrap_or(false)
    })
}

pub fn summarize(rows: &[Record]) -> DeliverySummary {
    let total = rows.len();
    let advanced = count_status(rows, &DeliveryStatus::Advanced);
    let arrived = count_status(rows, &DeliveryStatus::Arrived);
    let late = count_status(rows, &DeliveryStatus::Late);
    let delay = count_status(rows, &DeliveryStatus::Delay);
    let waiting = count_status(rows, &DeliveryStatus::Waiting);

    let on_time_ratio = if total > 0 {
        (arrived as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    };

    DeliverySummary {
        total,
        advanced,
        arrived,
        late,
        delay,
        waiting,
        not_arrived: delay + waiting,
        on_time: arrived,
        on_time_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dock: &str, route: &str, status: &str) -> Record {
        let mut record = Record::new();
        record.insert("dock", dock);
        record.insert("route", route);
        record.insert("status", status);
        record
    }

    fn table() -> Vec<Record> {
        vec![
            row("43", "RC16-01", "Arrived"),
            row("43", "RC16-02", "arrived"),
            row("44", "RC17-01", "LATE"),
            row("43 ", "RC17-02", "delay"),
            row("44", "RC18-01", "Waiting"),
        ]
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&table());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.arrived, 2);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.delay, 1);
        assert_eq!(summary.waiting, 1);
        assert_eq!(summary.advanced, 0);
        assert_eq!(summary.not_arrived, 2);
        assert_eq!(summary.on_time, 2);
        assert_eq!(summary.on_time_ratio, 40.0);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.on_time_ratio, 0.0);
    }

    #[test]
    fn test_ratio_rounding() {
        let rows = vec![
            row("1", "A-1", "arrived"),
            row("1", "A-2", "late"),
            row("1", "A-3", "late"),
        ];
        assert_eq!(summarize(&rows).on_time_ratio, 33.33);
    }

    #[test]
    fn test_counts() {
        let rows = table();
        assert_eq!(count_not_arrived(&rows), 2);
        assert_eq!(count_on_time(&rows), 2);
        assert_eq!(count_by_dock(&rows, "43"), 3);
        assert_eq!(count_by_dock(&rows, "99"), 0);
        assert_eq!(count_filter(&rows, &StatusFilter::NotArrived), 2);
    }

    #[test]
    fn test_routes_by_status() {
        let rows = table();
        assert_eq!(
            routes_by_status(&rows, &StatusFilter::Status(DeliveryStatus::Arrived)),
            vec!["RC16-01", "RC16-02"]
        );
        assert_eq!(
            routes_by_status(&rows, &StatusFilter::NotArrived),
            vec!["RC17-02", "RC18-01"]
        );
        let advanced = StatusFilter::Status(DeliveryStatus::Advanced);
        assert!(routes_by_status(&rows, &advanced).is_empty());
    }

    #[test]
    fn test_find_route() {
        let rows = table();
        let found = find_route(&rows, " rc17-01 ").unwrap();
        assert_eq!(found.get("status"), Some("LATE"));
        assert!(find_route(&rows, "RC99-01").is_none());
    }
}
