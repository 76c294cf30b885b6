//! Intent classification
//!
//! Keyword heuristics over Indonesian/English operator phrasing. A query may
//! carry several intents at once ("supplier dan stok 105D"); the classifier
//! returns all of them and the formatter joins the clauses.
//!
//! Matching rules:
//! - single-word keywords match a whole token, or the token plus the "-nya"
//!   suffix ("stok" matches "stoknya" but not "stokis")
//! - multi-word keywords match as a phrase of whole words, the last one
//!   optionally suffixed with "-nya"
//! - a rule is vetoed when one of its `excludes` phrases is present
//!   ("not arrived" is never "arrived")
//! - the word right after "supplier" is a name unless it is parts vocabulary,
//!   so "supplier advance" asks for a supplier and not for advanced deliveries

use crate::config::IntentConfig;
use crate::delivery::StatusFilter;
use crate::entity::{extract_route, supplier_tokens, tokenize};
use crate::fuzzy::{best_field_match, PartialRatioScorer, Scorer};
use crate::record::DeliveryStatus;
use std::collections::BTreeSet;
use tracing::debug;

/// What the operator asked about. Declaration order is the clause order
/// used when several part fields are requested together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntentTag {
    // Parts fields
    Stock,
    SupplierCode,
    Supplier,
    PartNo,
    PartName,
    LotSize,
    Plant,
    Dock,
    Address,
    LastReceived,
    // Delivery statuses
    Arrived,
    Advanced,
    Late,
    Delay,
    Waiting,
    NotArrived,
    OnTime,
    // Delivery views
    PerformanceSummary,
    RouteDetail,
    RouteListFollowup,
}

impl IntentTag {
    pub fn is_part_field(&self) -> bool {
        matches!(
            self,
            IntentTag::Stock
                | IntentTag::SupplierCode
                | IntentTag::Supplier
                | IntentTag::PartNo
                | IntentTag::PartName
                | IntentTag::LotSize
                | IntentTag::Plant
                | IntentTag::Dock
                | IntentTag::Address
                | IntentTag::LastReceived
        )
    }

    /// Status filter for the delivery-count intents
    pub fn status_filter(&self) -> Option<StatusFilter> {
        match self {
            IntentTag::Arrived => Some(StatusFilter::Status(DeliveryStatus::Arrived)),
            IntentTag::Advanced => Some(StatusFilter::Status(DeliveryStatus::Advanced)),
            IntentTag::Late => Some(StatusFilter::Status(DeliveryStatus::Late)),
            IntentTag::Delay => Some(StatusFilter::Status(DeliveryStatus::Delay)),
            IntentTag::Waiting => Some(StatusFilter::Status(DeliveryStatus::Waiting)),
            IntentTag::NotArrived => Some(StatusFilter::NotArrived),
            IntentTag::OnTime => Some(StatusFilter::OnTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentTag::Stock => "stock",
            IntentTag::SupplierCode => "supplier_code",
            IntentTag::Supplier => "supplier",
            IntentTag::PartNo => "part_no",
            IntentTag::PartName => "part_name",
            IntentTag::LotSize => "lot_size",
            IntentTag::Plant => "plant",
            IntentTag::Dock => "dock",
            IntentTag::Address => "address",
            IntentTag::LastReceived => "last_received",
            IntentTag::Arrived => "arrived",
            IntentTag::Advanced => "advanced",
            IntentTag::Late => "late",
            IntentTag::Delay => "delay",
            IntentTag::Waiting => "waiting",
            IntentTag::NotArrived => "not_arrived",
            IntentTag::OnTime => "on_time",
            IntentTag::PerformanceSummary => "performance_summary",
            IntentTag::RouteDetail => "route_detail",
            IntentTag::RouteListFollowup => "route_list_followup",
        }
    }
}

/// Which stock figure a stock question wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockVariant {
    Pieces,
    Minutes,
    Hours,
    /// Line-side stock
    Sps,
    Receiving,
    Overflow,
}

/// One row of the keyword table
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub tag: IntentTag,
    pub keywords: &'static [&'static str],
    pub excludes: &'static [&'static str],
}

const fn rule(
    tag: IntentTag,
    keywords: &'static [&'static str],
    excludes: &'static [&'static str],
) -> KeywordRule {
    KeywordRule {
        tag,
        keywords,
        excludes,
    }
}

const SUPPLIER_CODE_PHRASES: &[&str] =
    &["supplier code", "supp code", "kode supplier", "suppliercode"];
const NOT_ARRIVED_PHRASES: &[&str] =
    &["belum datang", "belum tiba", "belum sampai", "not arrived"];
const ARRIVED_EXCLUDES: &[&str] = &[
    "belum datang",
    "belum tiba",
    "belum sampai",
    "not arrived",
    "sampai jumpa",
];

/// Suffix accepted after any keyword ("stoknya", "statusnya")
const KEYWORD_SUFFIX: &str = "nya";

pub const KEYWORD_RULES: &[KeywordRule] = &[
    rule(IntentTag::Stock, &["stock", "stok", "jumlah"], &[]),
    rule(IntentTag::SupplierCode, SUPPLIER_CODE_PHRASES, &[]),
    rule(IntentTag::Supplier, &["supplier", "pemasok", "vendor"], SUPPLIER_CODE_PHRASES),
    rule(
        IntentTag::PartNo,
        &["part no", "part number", "partno", "no part", "nomor part"],
        &[],
    ),
    rule(IntentTag::PartName, &["part name", "partname", "nama part", "nama barang"], &[]),
    rule(
        IntentTag::LotSize,
        &[
            "pcs per kanban",
            "pcs perkanban",
            "isi kanban",
            "qty per kanban",
            "qty perkanban",
            "qty per box",
            "lot size",
        ],
        &[],
    ),
    rule(IntentTag::Plant, &["plant"], &[]),
    rule(IntentTag::Dock, &["dock"], &[]),
    rule(IntentTag::Address, &["alamat", "address"], &[]),
    rule(IntentTag::LastReceived, &["last received", "terakhir"], &[]),
    rule(
        IntentTag::Arrived,
        &["arrived", "sudah tiba", "sudah datang", "sudah sampai", "sampai"],
        ARRIVED_EXCLUDES,
    ),
    rule(IntentTag::Advanced, &["advance", "advanced", "lebih cepat", "lebih awal"], &[]),
    rule(IntentTag::Late, &["late", "terlambat"], &[]),
    rule(IntentTag::Delay, &["delay", "delayed", "tertunda"], &[]),
    rule(IntentTag::Waiting, &["waiting", "menunggu"], &[]),
    rule(IntentTag::NotArrived, NOT_ARRIVED_PHRASES, &[]),
    rule(IntentTag::OnTime, &["on time", "ontime", "tepat waktu"], &[]),
    rule(
        IntentTag::PerformanceSummary,
        &["performance", "performa", "summary", "ringkas", "ringkasan", "kondisi"],
        &[],
    ),
    rule(IntentTag::RouteListFollowup, &["rute", "route"], &[]),
];

/// Keyword → field map for the fuzzy layer; short words are left out
/// because any 3-letter window scores high against them.
const FUZZY_FIELD_KEYWORDS: &[(&str, IntentTag)] = &[
    ("supplier", IntentTag::Supplier),
    ("stock", IntentTag::Stock),
    ("alamat", IntentTag::Address),
    ("address", IntentTag::Address),
    ("plant", IntentTag::Plant),
    ("terakhir", IntentTag::LastReceived),
    ("received", IntentTag::LastReceived),
];

/// Words that mean "this is about parts" without naming a field
const PARTS_WORDS: &[&str] = &["kanban", "part", "parts", "stok", "stock", "supplier"];

/// Words after which the next word names a supplier
const SUPPLIER_NAME_MARKERS: &[&str] = &["supplier", "pemasok", "vendor"];

/// Common words that sit too close to a field keyword ("selamat" / "alamat")
const FUZZY_SKIP_WORDS: &[&str] = &["selamat", "berapa", "tolong", "kanban", "part"];

/// Lowercased, punctuation-free view of a query
#[derive(Debug, Clone)]
pub struct NormalizedText {
    tokens: Vec<String>,
    /// Tokens minus a supplier name; keywords only match here
    vocabulary: Vec<String>,
    padded: String,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let tokens: Vec<String> = tokenize(&lower).into_iter().map(str::to_string).collect();
        let name = named_supplier(&lower);
        let vocabulary: Vec<String> = tokens
            .iter()
            .filter(|t| name.as_deref() != Some(t.as_str()))
            .cloned()
            .collect();
        let padded = format!(" {} ", vocabulary.join(" "));
        Self {
            tokens,
            vocabulary,
            padded,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Single word: whole token. Phrase: whole words. Either may end in "-nya".
    pub fn has_keyword(&self, keyword: &str) -> bool {
        if keyword.contains(' ') {
            self.padded.contains(&format!(" {} ", keyword))
                || self
                    .padded
                    .contains(&format!(" {}{} ", keyword, KEYWORD_SUFFIX))
        } else {
            self.vocabulary.iter().any(|t| token_is(t, keyword))
        }
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.has_keyword(k))
    }
}

impl KeywordRule {
    pub fn matches(&self, text: &NormalizedText) -> bool {
        text.contains_any(self.keywords) && !text.contains_any(self.excludes)
    }
}

/// Keyword classifier with an optional fuzzy fallback
pub struct IntentClassifier {
    scorer: Option<Box<dyn Scorer>>,
    threshold: u32,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Keyword table only
    pub fn new() -> Self {
        Self {
            scorer: None,
            threshold: crate::fuzzy::MATCH_THRESHOLD,
        }
    }

    pub fn from_config(config: &IntentConfig) -> Self {
        if config.fuzzy_enabled {
            Self::with_scorer(Box::new(PartialRatioScorer), config.effective_threshold())
        } else {
            Self::new()
        }
    }

    pub fn with_scorer(scorer: Box<dyn Scorer>, threshold: u32) -> Self {
        Self {
            scorer: Some(scorer),
            threshold,
        }
    }

    pub fn fuzzy_enabled(&self) -> bool {
        self.scorer.is_some()
    }

    pub fn classify(&self, text: &str) -> BTreeSet<IntentTag> {
        let normalized = NormalizedText::new(text);
        let mut tags: BTreeSet<IntentTag> = KEYWORD_RULES
            .iter()
            .filter(|r| r.matches(&normalized))
            .map(|r| r.tag)
            .collect();

        if extract_route(text).is_some() {
            tags.remove(&IntentTag::RouteListFollowup);
            tags.insert(IntentTag::RouteDetail);
        }

        if tags.is_empty() {
            if let Some(tag) = self.fuzzy_field(&normalized) {
                tags.insert(tag);
            }
        }

        debug!(
            "Classified {:?} as [{}]",
            text,
            tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
        );
        tags
    }

    /// Best fuzzy field over the query words that are not codes or generic nouns
    fn fuzzy_field(&self, text: &NormalizedText) -> Option<IntentTag> {
        let scorer = self.scorer.as_deref()?;

        text.tokens()
            .iter()
            .filter(|t| t.chars().count() >= 4)
            .filter(|t| !t.chars().any(|c| c.is_ascii_digit()))
            .filter(|t| !FUZZY_SKIP_WORDS.contains(&t.as_str()))
            .filter_map(|t| best_field_match(scorer, t, FUZZY_FIELD_KEYWORDS, self.threshold))
            .max_by_key(|m| m.score)
            .map(|m| {
                debug!("Fuzzy match {} (score {})", m.keyword, m.score);
                m.value
            })
    }

    /// Sub-intent of a stock question
    pub fn stock_variant(&self, text: &str) -> StockVariant {
        let normalized = NormalizedText::new(text);
        if normalized.has_keyword("menit") {
            StockVariant::Minutes
        } else if normalized.has_keyword("jam") {
            StockVariant::Hours
        } else if normalized.contains_any(&["sps", "line"]) {
            StockVariant::Sps
        } else if normalized.has_keyword("receiving") {
            StockVariant::Receiving
        } else if normalized.contains_any(&["overflow", "over flow"]) {
            StockVariant::Overflow
        } else {
            StockVariant::Pieces
        }
    }

    /// True when the query is about parts but may lack a code
    pub fn mentions_parts(&self, text: &str, tags: &BTreeSet<IntentTag>) -> bool {
        tags.iter().any(|t| t.is_part_field())
            || NormalizedText::new(text).contains_any(PARTS_WORDS)
    }
}

/// `token` is `keyword` itself or `keyword` + "nya"
fn token_is(token: &str, keyword: &str) -> bool {
    token == keyword || token.strip_prefix(keyword) == Some(KEYWORD_SUFFIX)
}

/// Parts nouns and the words of part-field keywords ("stok", "code", "alamat")
fn is_parts_vocabulary(token: &str) -> bool {
    PARTS_WORDS.iter().any(|k| token_is(token, k))
        || KEYWORD_RULES
            .iter()
            .filter(|r| r.tag.is_part_field())
            .flat_map(|r| r.keywords.iter())
            .flat_map(|k| k.split(' '))
            .any(|k| token_is(token, k))
}

/// The word following "supplier" / "pemasok" / "vendor", lowercased, when it
/// can be part of a supplier name and is not parts vocabulary
pub fn named_supplier(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let candidates = supplier_tokens(&lower);
    let tokens = tokenize(&lower);

    tokens
        .windows(2)
        .filter(|pair| SUPPLIER_NAME_MARKERS.contains(&pair[0]))
        .map(|pair| pair[1])
        .find(|t| candidates.iter().any(|c| c == t) && !is_parts_vocabulary(t))
        .map(str::to_string)
}

/// True when `token` is vocabulary of the classifier rather than a name
pub fn is_keyword_token(token: &str) -> bool {
    let token = token.to_lowercase();
    PARTS_WORDS.iter().any(|k| token_is(&token, k))
        || KEYWORD_RULES
            .iter()
            .flat_map(|r| r.keywords.iter())
            .flat_map(|k| k.split(' '))
            .any(|k| token_is(&token, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Vec<IntentTag> {
        IntentClassifier::new().classify(text).into_iter().collect()
    }

    #[test]
    fn test_stock_intent() {
        assert_eq!(classify("stok kanban 105D"), vec![IntentTag::Stock]);
        assert_eq!(classify("berapa stoknya?"), vec![IntentTag::Stock]);
    }

    #[test]
    fn test_multiple_intents() {
        assert_eq!(
            classify("supplier dan stok 105D"),
            vec![IntentTag::Stock, IntentTag::Supplier]
        );
    }

    #[test]
    fn test_supplier_code_is_not_supplier_name() {
        assert_eq!(classify("supplier code 105D"), vec![IntentTag::SupplierCode]);
        assert_eq!(classify("supp. code 105D"), vec![IntentTag::SupplierCode]);
    }

    #[test]
    fn test_not_arrived_vetoes_arrived() {
        assert_eq!(classify("berapa yang not arrived"), vec![IntentTag::NotArrived]);
        assert_eq!(classify("yang belum tiba"), vec![IntentTag::NotArrived]);
        assert_eq!(classify("berapa yang sudah tiba"), vec![IntentTag::Arrived]);
    }

    #[test]
    fn test_route_detail_replaces_followup() {
        assert_eq!(classify("kapan route RC16-02 datang"), vec![IntentTag::RouteDetail]);
        assert_eq!(classify("rute apa saja"), vec![IntentTag::RouteListFollowup]);
    }

    #[test]
    fn test_delivery_and_summary() {
        assert_eq!(classify("ada berapa delivery late"), vec![IntentTag::Late]);
        assert_eq!(classify("ringkasan performance"), vec![IntentTag::PerformanceSummary]);
        assert_eq!(classify("on time hari ini"), vec![IntentTag::OnTime]);
    }

    #[test]
    fn test_unrecognized_is_empty() {
        assert!(classify("halo selamat pagi").is_empty());
        assert!(classify("").is_empty());
    }

    #[test]
    fn test_stock_variants() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.stock_variant("stok 105D berapa menit"), StockVariant::Minutes);
        assert_eq!(classifier.stock_variant("stok 105D dalam jam"), StockVariant::Hours);
        assert_eq!(classifier.stock_variant("stok sps 105D"), StockVariant::Sps);
        assert_eq!(classifier.stock_variant("stok line side 105D"), StockVariant::Sps);
        assert_eq!(classifier.stock_variant("stok receiving 105D"), StockVariant::Receiving);
        assert_eq!(classifier.stock_variant("stok over flow 105D"), StockVariant::Overflow);
        assert_eq!(classifier.stock_variant("stok 105D"), StockVariant::Pieces);
    }

    #[test]
    fn test_fuzzy_layer_only_when_enabled() {
        assert!(classify("suplier 105D").is_empty());

        let fuzzy = IntentClassifier::with_scorer(Box::new(PartialRatioScorer), 60);
        let tags: Vec<IntentTag> = fuzzy.classify("suplier 105D").into_iter().collect();
        assert_eq!(tags, vec![IntentTag::Supplier]);
    }

    #[test]
    fn test_fuzzy_ignores_unrelated_words() {
        let fuzzy = IntentClassifier::with_scorer(Box::new(PartialRatioScorer), 60);
        assert!(fuzzy.classify("halo selamat pagi").is_empty());
    }

    #[test]
    fn test_mentions_parts() {
        let classifier = IntentClassifier::new();
        let tags = classifier.classify("kanban");
        assert!(classifier.mentions_parts("kanban", &tags));
        assert!(!classifier.mentions_parts("halo", &BTreeSet::new()));
    }

    #[test]
    fn test_is_keyword_token() {
        assert!(is_keyword_token("supplier"));
        assert!(is_keyword_token("stoknya"));
        assert!(is_keyword_token("kanban"));
        assert!(!is_keyword_token("sugity"));
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert!(!is_keyword_token("latexindo"));
        assert!(!is_keyword_token("plantaku"));
        assert!(!is_keyword_token("dockers"));
        assert!(is_keyword_token("advanced"));

        assert_eq!(classify("supplier latexindo"), vec![IntentTag::Supplier]);
        assert_eq!(classify("delivery yang advanced"), vec![IntentTag::Advanced]);
        assert_eq!(classify("performanya gimana"), vec![IntentTag::PerformanceSummary]);
    }

    #[test]
    fn test_word_after_supplier_is_a_name() {
        assert_eq!(classify("part dari supplier advance"), vec![IntentTag::Supplier]);
        assert_eq!(classify("vendor late berapa"), vec![IntentTag::Supplier]);
        assert_eq!(named_supplier("part dari supplier Advance"), Some("advance".to_string()));

        assert_eq!(named_supplier("supplier code 105D"), None);
        assert_eq!(named_supplier("supplier dan stok 105D"), None);
        assert_eq!(named_supplier("supplier kanban 105D"), None);
        assert_eq!(named_supplier("ada supplier yang terlambat"), None);
    }

    #[test]
    fn test_farewell_is_not_arrived() {
        assert!(classify("sampai jumpa").is_empty());
        assert_eq!(classify("berapa yang sampai"), vec![IntentTag::Arrived]);
    }
}
