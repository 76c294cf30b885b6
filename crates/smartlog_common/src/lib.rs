//! SmartLog Common - query resolution engine for the logistics assistant
//!
//! Operators ask about kanban stock and delivery status in free text; the
//! engine extracts the code or route, classifies the intent, looks the row
//! up in a cached dataset and formats an Indonesian reply.

pub mod config;
pub mod context;
pub mod dataset;
pub mod delivery;
pub mod engine;
pub mod entity;
pub mod error;
pub mod formatter;
pub mod fuzzy;
pub mod intent;
pub mod parsers;
pub mod record;
pub mod resolver;
pub mod transport;

pub use config::SmartlogConfig;
pub use context::{ConversationContext, DatasetKind};
pub use dataset::{Dataset, DatasetCache, DatasetOrigin};
pub use delivery::{DeliverySummary, StatusFilter};
pub use engine::QueryEngine;
pub use error::{ConfigError, DatasetError, SmartlogError, TransportError};
pub use intent::{IntentClassifier, IntentTag, StockVariant};
pub use record::{DeliveryField, DeliveryStatus, PartField, Record};
pub use resolver::Resolution;
pub use transport::{DatasetTransport, FakeTransport, HttpTransport, RoutedFakeTransport};
