//! Record resolution against the parts table
//!
//! Order, first hit wins, all comparisons uppercased:
//! 1. kanban column contains the code
//! 2. part name equals the code
//! 3. part name or supplier name contains the code
//! 4. no code in the query: repeat 1-3 with the remembered kanban
//! 5. still nothing: supplier-name search on the query words, returning a
//!    list instead of a single row; a word right after "supplier" is tried
//!    first even when it doubles as a status keyword
//!
//! Ties go to the first row in table order.

use crate::context::{ConversationContext, DatasetKind};
use crate::dataset::Dataset;
use crate::entity::supplier_tokens;
use crate::intent::{is_keyword_token, named_supplier};
use crate::record::{PartField, Record};
use tracing::debug;

/// Most rows a supplier search hands back
pub const MAX_CANDIDATES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// One row for `code`
    Found { code: String, record: Record },
    /// Several rows sharing a supplier; `total` counts all matches.
    /// `attempted` is the code that found nothing, if there was one.
    Candidates {
        supplier: String,
        total: usize,
        records: Vec<Record>,
        attempted: Option<String>,
    },
    /// A code was given or remembered but nothing matches it
    NotFound { code: String },
    /// No code and nothing to search for
    Missing,
}

pub fn resolve(
    dataset: &Dataset,
    entity: Option<&str>,
    raw_text: &str,
    context: &ConversationContext,
) -> Resolution {
    let code = entity
        .map(str::to_string)
        .or_else(|| context.get_last_entity(DatasetKind::Parts).map(str::to_string))
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());

    if let Some(code) = &code {
        if let Some(record) = find_by_code(&dataset.rows, code) {
            debug!("Resolved {} to a parts row", code);
            return Resolution::Found {
                code: code.clone(),
                record: record.clone(),
            };
        }
    }

    if let Some(candidates) = search_supplier(&dataset.rows, raw_text, code.clone()) {
        return candidates;
    }

    match code {
        Some(code) => Resolution::NotFound { code },
        None => Resolution::Missing,
    }
}

/// Steps 1-3 for one code
pub fn find_by_code<'a>(rows: &'a [Record], code: &str) -> Option<&'a Record> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }

    let upper = |r: &Record, field: PartField| r.part(field).map(str::to_uppercase);

    rows.iter()
        .find(|r| upper(r, PartField::KanbanNo).map_or(false, |k| k.contains(&code)))
        .or_else(|| {
            rows.iter()
                .find(|r| upper(r, PartField::PartName).as_deref() == Some(code.as_str()))
        })
        .or_else(|| {
            rows.iter().find(|r| {
                [PartField::PartName, PartField::SupplierName]
                    .iter()
                    .any(|f| upper(r, *f).map_or(false, |v| v.contains(&code)))
            })
        })
}

/// Step 5: the first query word that matches any supplier name
fn search_supplier(
    rows: &[Record],
    raw_text: &str,
    attempted: Option<String>,
) -> Option<Resolution> {
    let named = named_supplier(raw_text);
    let others = supplier_tokens(raw_text)
        .into_iter()
        .filter(|t| !is_keyword_token(t));

    named.into_iter().chain(others).find_map(|token| {
        let needle = token.to_uppercase();
        let matches: Vec<&Record> = rows
            .iter()
            .filter(|r| {
                r.part(PartField::SupplierName)
                    .map_or(false, |s| s.to_uppercase().contains(&needle))
            })
            .collect();

        let first = matches.first()?;
        let supplier = first
            .part(PartField::SupplierName)
            .unwrap_or(needle.as_str())
            .to_string();
        debug!("Supplier search {:?} matched {} rows", token, matches.len());

        Some(Resolution::Candidates {
            supplier,
            total: matches.len(),
            records: matches.into_iter().take(MAX_CANDIDATES).cloned().collect(),
            attempted: attempted.clone(),
        })
    })
}
