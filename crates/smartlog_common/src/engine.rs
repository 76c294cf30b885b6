//! Query engine
//!
//! `process_query` is the one entry point: text in, reply out. Each query is
//! parsed once into a `Query`, then handed to the first rule whose predicate
//! accepts it. Rule order is the precedence order; the last rule accepts
//! everything and ends in a clarification when nothing resolves.
//!
//! Failures never leave this module. A handler error is logged and the
//! operator gets the generic apology.

use crate::config::SmartlogConfig;
use crate::context::{ConversationContext, DatasetKind};
use crate::dataset::{Dataset, DatasetCache};
use crate::delivery::{count_by_dock, count_filter, find_route, routes_by_status, summarize};
use crate::entity::{extract_dock, extract_kanban, extract_route, supplier_tokens};
use crate::formatter::{
    self, ASK_FOR_CODE, ASK_FOR_STATUS, DATA_UNAVAILABLE, EMPTY_INPUT, UNRECOGNIZED,
};
use crate::intent::{
    is_keyword_token, named_supplier, IntentClassifier, IntentTag, NormalizedText, StockVariant,
};
use crate::resolver::{resolve, Resolution};
use crate::transport::{DatasetTransport, HttpTransport};
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info};

/// Words asking about the arrival of a route ("status nya?", "kapan datang")
const ROUTE_DETAIL_WORDS: &[&str] = &[
    "status",
    "kedatangan",
    "arrival",
    "kapan",
    "jadwal",
    "scheduled",
];

/// One query after entity extraction and classification
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub tags: BTreeSet<IntentTag>,
    pub kanban: Option<String>,
    pub route: Option<String>,
    pub dock: Option<String>,
    pub stock_variant: StockVariant,
    /// Mentions status or arrival time without naming a status
    pub asks_route_detail: bool,
}

impl Query {
    pub fn parse(text: &str, classifier: &IntentClassifier) -> Self {
        let text = text.trim().to_string();
        Self {
            tags: classifier.classify(&text),
            kanban: extract_kanban(&text),
            route: extract_route(&text),
            dock: extract_dock(&text),
            stock_variant: classifier.stock_variant(&text),
            asks_route_detail: NormalizedText::new(&text).contains_any(ROUTE_DETAIL_WORDS),
            text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn has(&self, tag: IntentTag) -> bool {
        self.tags.contains(&tag)
    }

    /// First delivery-status intent in tag order
    fn status_tag(&self) -> Option<IntentTag> {
        self.tags.iter().copied().find(|t| t.status_filter().is_some())
    }

    /// Route question with the route left out, e.g. "status nya?"
    fn is_route_followup(&self) -> bool {
        self.asks_route_detail
            && self.kanban.is_none()
            && self.route.is_none()
            && !self.tags.iter().any(|t| t.is_part_field())
    }
}

type Predicate = fn(&Query) -> bool;
type Handler = fn(&QueryEngine, &Query, &mut ConversationContext) -> Result<String>;

struct Rule {
    name: &'static str,
    applies: Predicate,
    handle: Handler,
}

const RULES: &[Rule] = &[
    Rule {
        name: "empty",
        applies: |q| q.is_empty(),
        handle: |_, _, _| Ok(EMPTY_INPUT.to_string()),
    },
    Rule {
        name: "route_detail",
        applies: |q| q.route.is_some(),
        handle: QueryEngine::answer_route_detail,
    },
    Rule {
        name: "route_list",
        applies: |q| q.has(IntentTag::RouteListFollowup),
        handle: QueryEngine::answer_route_list,
    },
    Rule {
        name: "status_count",
        applies: |q| q.status_tag().is_some(),
        handle: QueryEngine::answer_status_count,
    },
    Rule {
        name: "summary",
        applies: |q| q.has(IntentTag::PerformanceSummary),
        handle: QueryEngine::answer_summary,
    },
    Rule {
        name: "dock_count",
        applies: |q| q.dock.is_some(),
        handle: QueryEngine::answer_dock_count,
    },
    Rule {
        name: "route_followup",
        applies: |q| q.is_route_followup(),
        handle: QueryEngine::answer_route_followup,
    },
    Rule {
        name: "parts",
        applies: |_| true,
        handle: QueryEngine::answer_parts,
    },
];

/// Long-lived service owning the cache, classifier and conversation context
pub struct QueryEngine {
    config: SmartlogConfig,
    cache: DatasetCache,
    classifier: IntentClassifier,
    context: Mutex<ConversationContext>,
}

impl QueryEngine {
    pub fn new(config: SmartlogConfig, transport: Arc<dyn DatasetTransport>) -> Self {
        let cache = DatasetCache::new(&config, transport);
        Self::with_cache(config, cache)
    }

    /// Engine talking to the configured endpoints over HTTP
    pub fn with_http(config: SmartlogConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::new(config, transport))
    }

    pub fn with_cache(config: SmartlogConfig, cache: DatasetCache) -> Self {
        let classifier = IntentClassifier::from_config(&config.intent);
        Self {
            config,
            cache,
            classifier,
            context: Mutex::new(ConversationContext::new()),
        }
    }

    pub fn config(&self) -> &SmartlogConfig {
        &self.config
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Answer one operator query. Never fails.
    pub fn process_query(&self, text: &str) -> String {
        let started = Instant::now();
        let query = Query::parse(text, &self.classifier);
        let mut context = self.context.lock().unwrap_or_else(|e| e.into_inner());
        context.record_turn();

        let rule = RULES
            .iter()
            .find(|r| (r.applies)(&query))
            .unwrap_or(&RULES[RULES.len() - 1]);

        let reply = match (rule.handle)(self, &query, &mut *context) {
            Ok(reply) => reply,
            Err(e) => {
                error!("Rule {} failed for {:?}: {:#}", rule.name, query.text, e);
                formatter::SYSTEM_ERROR.to_string()
            }
        };

        debug!(
            "Rule {} answered {:?} in {}ms",
            rule.name,
            query.text,
            started.elapsed().as_millis()
        );
        reply
    }

    /// Forget remembered kanban, route and status
    pub fn reset_context(&self) {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).reset();
        info!("Conversation context cleared");
    }

    pub fn context_snapshot(&self) -> ConversationContext {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Refetch both tables now
    pub fn refresh(&self) -> (Arc<Dataset>, Arc<Dataset>) {
        let parts = self.cache.get_parts_dataset(true);
        self.cache.invalidate(DatasetKind::Delivery);
        let delivery = self.cache.get_delivery_dataset();
        (parts, delivery)
    }

    fn delivery_rows(&self) -> Option<Arc<Dataset>> {
        let dataset = self.cache.get_delivery_dataset();
        if dataset.is_unavailable() {
            None
        } else {
            Some(dataset)
        }
    }

    fn answer_route_detail(&self, query: &Query, ctx: &mut ConversationContext) -> Result<String> {
        let route = query
            .route
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("route rule without a route"))?;
        ctx.set_last_entity(DatasetKind::Delivery, route);
        Ok(self.route_reply(route))
    }

    /// Detail for the remembered route; parts handling when none is remembered
    fn answer_route_followup(
        &self,
        query: &Query,
        ctx: &mut ConversationContext,
    ) -> Result<String> {
        let Some(route) = ctx.get_last_entity(DatasetKind::Delivery).map(str::to_string) else {
            return self.answer_parts(query, ctx);
        };
        debug!("Follow-up on remembered route {}", route);
        Ok(self.route_reply(&route))
    }

    fn route_reply(&self, route: &str) -> String {
        let Some(dataset) = self.delivery_rows() else {
            return DATA_UNAVAILABLE.to_string();
        };

        match find_route(&dataset.rows, route) {
            Some(row) => formatter::format_route_detail(route, row),
            None => formatter::format_route_not_found(route),
        }
    }

    fn answer_route_list(&self, query: &Query, ctx: &mut ConversationContext) -> Result<String> {
        let filter = match query.status_tag().and_then(|t| t.status_filter()) {
            Some(filter) => {
                ctx.set_last_status(filter.clone());
                filter
            }
            None => match ctx.get_last_status() {
                Some(filter) => filter.clone(),
                None => return Ok(ASK_FOR_STATUS.to_string()),
            },
        };

        let Some(dataset) = self.delivery_rows() else {
            return Ok(DATA_UNAVAILABLE.to_string());
        };

        let routes = routes_by_status(&dataset.rows, &filter);
        Ok(formatter::format_route_list(&filter, &routes))
    }

    fn answer_status_count(&self, query: &Query, ctx: &mut ConversationContext) -> Result<String> {
        let filter = query
            .status_tag()
            .and_then(|t| t.status_filter())
            .ok_or_else(|| anyhow::anyhow!("status rule without a status"))?;
        ctx.set_last_status(filter.clone());

        let Some(dataset) = self.delivery_rows() else {
            return Ok(DATA_UNAVAILABLE.to_string());
        };

        let count = count_filter(&dataset.rows, &filter);
        Ok(formatter::format_status_count(&filter, count))
    }

    fn answer_summary(&self, _query: &Query, _ctx: &mut ConversationContext) -> Result<String> {
        let Some(dataset) = self.delivery_rows() else {
            return Ok(DATA_UNAVAILABLE.to_string());
        };
        Ok(formatter::format_summary(&summarize(&dataset.rows)))
    }

    fn answer_dock_count(&self, query: &Query, _ctx: &mut ConversationContext) -> Result<String> {
        let dock = query
            .dock
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("dock rule without a dock"))?;

        let Some(dataset) = self.delivery_rows() else {
            return Ok(DATA_UNAVAILABLE.to_string());
        };
        Ok(formatter::format_dock_count(dock, count_by_dock(&dataset.rows, dock)))
    }

    fn answer_parts(&self, query: &Query, ctx: &mut ConversationContext) -> Result<String> {
        let has_code =
            query.kanban.is_some() || ctx.get_last_entity(DatasetKind::Parts).is_some();
        let has_search_words = named_supplier(&query.text).is_some()
            || supplier_tokens(&query.text)
                .iter()
                .any(|t| !is_keyword_token(t));

        if !has_code && !has_search_words {
            return Ok(self.clarification(query));
        }

        let dataset = self.cache.get_parts_dataset(false);
        if dataset.is_unavailable() {
            return Ok(DATA_UNAVAILABLE.to_string());
        }

        let resolution = resolve(&dataset, query.kanban.as_deref(), &query.text, ctx);
        Ok(match resolution {
            Resolution::Found { code, record } => {
                ctx.set_last_entity(DatasetKind::Parts, code.as_str());
                formatter::format_part_reply(&code, &record, &query.tags, query.stock_variant)
            }
            Resolution::Candidates {
                supplier,
                total,
                records,
                attempted,
            } => {
                if let Some(code) = attempted {
                    ctx.set_last_entity(DatasetKind::Parts, code);
                }
                formatter::format_candidates(&supplier, total, &records)
            }
            Resolution::NotFound { code } => {
                ctx.set_last_entity(DatasetKind::Parts, code.as_str());
                formatter::format_not_found(&code)
            }
            Resolution::Missing => self.clarification(query),
        })
    }

    fn clarification(&self, query: &Query) -> String {
        if self.classifier.mentions_parts(&query.text, &query.tags) {
            ASK_FOR_CODE.to_string()
        } else {
            UNRECOGNIZED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{FakeTransport, RoutedFakeTransport};
    use serde_json::json;

    fn engine() -> QueryEngine {
        let config = SmartlogConfig::default();
        let transport = RoutedFakeTransport::new()
            .route(
                config.parts.url.clone(),
                FakeTransport::always(json!({"data": [
                    {"KanbanNo": "105D", "PartName": "AIR CLEANER", "SupplierName": "SUGITY",
                     "StockOverall": "248"},
                    {"KanbanNo": "2231", "PartName": "HOSE", "SupplierName": "SUGITY",
                     "StockOverall": "40"},
                    {"KanbanNo": "4100", "PartName": "CLIP", "SupplierName": "ADVANCE PLASTIK",
                     "StockOverall": "12"}
                ]})),
            )
            .route(
                config.delivery.url.clone(),
                FakeTransport::always(json!({"data": [
                    ["43", "SUGITY", "RC16-02", "1", "", "08:00", "07:55", "", "Arrived"],
                    ["43", "INOAC", "RC17-01", "1", "", "09:00", "09:20", "", "Late"]
                ]})),
            );
        QueryEngine::new(config, Arc::new(transport))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(engine().process_query("   "), EMPTY_INPUT);
    }

    #[test]
    fn test_rule_order_ends_in_catch_all() {
        assert_eq!(RULES[RULES.len() - 1].name, "parts");
        assert!(RULES.iter().all(|r| !r.name.is_empty()));
    }

    #[test]
    fn test_followup_without_status_asks() {
        assert_eq!(engine().process_query("rute apa saja"), ASK_FOR_STATUS);
    }

    #[test]
    fn test_status_then_followup() {
        let engine = engine();
        assert_eq!(
            engine.process_query("berapa yang late?"),
            "Ada 1 delivery yang Late (sudah datang lewat jadwal)."
        );
        assert_eq!(engine.process_query("rute apa saja"), "Berikut route yang Late:\n- RC17-01");
    }

    #[test]
    fn test_context_carries_kanban() {
        let engine = engine();
        engine.process_query("stok kanban 105D");
        assert_eq!(engine.process_query("supplier nya?"), "Supplier Kanban 105D = SUGITY.");
    }

    #[test]
    fn test_not_found_still_remembers_code() {
        let engine = engine();
        assert_eq!(engine.process_query("stok 9999"), "Saya tidak menemukan Kanban 9999.");
        assert_eq!(
            engine.context_snapshot().get_last_entity(DatasetKind::Parts),
            Some("9999")
        );
    }

    #[test]
    fn test_route_followup_uses_remembered_route() {
        let engine = engine();
        let detail = "Informasi Route RC16-02:\n- Status: Arrived\n\
                      - Scheduled Arrival: 08:00\n- Actual Arrival: 07:55";

        assert_eq!(engine.process_query("kapan kedatangan route RC16-02"), detail);
        assert_eq!(engine.process_query("status nya?"), detail);
        assert_eq!(engine.process_query("kapan actual arrival nya"), detail);
    }

    #[test]
    fn test_route_followup_without_route_falls_through() {
        assert_eq!(engine().process_query("status nya?"), UNRECOGNIZED);

        let engine = engine();
        engine.process_query("stok kanban 105D");
        assert_eq!(engine.process_query("supplier nya?"), "Supplier Kanban 105D = SUGITY.");
    }

    #[test]
    fn test_supplier_named_like_a_status() {
        let engine = engine();
        let reply = engine.process_query("part dari supplier advance");
        assert_eq!(reply, "Ditemukan 1 part untuk supplier ADVANCE PLASTIK. Contoh: CLIP (4100).");
        assert_eq!(engine.process_query("sampai jumpa"), UNRECOGNIZED);
    }

    #[test]
    fn test_candidates_remember_attempted_code() {
        let engine = engine();
        let reply = engine.process_query("stok 9Z9Z supplier sugity");
        assert!(reply.starts_with("Ditemukan 2 part untuk supplier SUGITY"), "{}", reply);
        assert_eq!(
            engine.context_snapshot().get_last_entity(DatasetKind::Parts),
            Some("9Z9Z")
        );
    }

    #[test]
    fn test_reset_context() {
        let engine = engine();
        engine.process_query("stok kanban 105D");
        engine.reset_context();
        assert_eq!(engine.process_query("supplier"), ASK_FOR_CODE);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(engine().process_query("halo"), UNRECOGNIZED);
    }

    #[test]
    fn test_dock_count() {
        assert_eq!(
            engine().process_query("berapa delivery di dock 43"),
            "Dock 43 memiliki 2 delivery hari ini."
        );
    }

    #[test]
    fn test_unavailable_delivery() {
        let engine = QueryEngine::new(
            SmartlogConfig::default(),
            Arc::new(FakeTransport::always_error(crate::error::TransportError::Timeout(5))),
        );
        assert_eq!(engine.process_query("ringkasan performance"), DATA_UNAVAILABLE);
    }
}
