//! Conversation context
//!
//! Cross-turn memory for follow-up questions: the last kanban asked about,
//! the last route, and the last delivery status counted ("rute apa saja?").
//!
//! Last write wins and nothing expires. Operators sharing a terminal clear
//! it explicitly with `reset()`.

use crate::delivery::StatusFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::dataset::DatasetKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    last_kanban: Option<String>,
    last_route: Option<String>,
    last_status: Option<StatusFilter>,
    /// When any field was last written
    updated_at: Option<DateTime<Utc>>,
    turns: usize,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last entity for a dataset: a kanban code for parts, a route for delivery
    pub fn get_last_entity(&self, kind: DatasetKind) -> Option<&str> {
        match kind {
            DatasetKind::Parts => self.last_kanban.as_deref(),
            DatasetKind::Delivery => self.last_route.as_deref(),
        }
    }

    pub fn set_last_entity(&mut self, kind: DatasetKind, value: impl Into<String>) {
        let value = Some(value.into());
        match kind {
            DatasetKind::Parts => self.last_kanban = value,
            DatasetKind::Delivery => self.last_route = value,
        }
        self.touch();
    }

    pub fn get_last_status(&self) -> Option<&StatusFilter> {
        self.last_status.as_ref()
    }

    pub fn set_last_status(&mut self, status: StatusFilter) {
        self.last_status = Some(status);
        self.touch();
    }

    /// Count a processed query
    pub fn record_turn(&mut self) {
        self.turns += 1;
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.last_kanban.is_none() && self.last_route.is_none() && self.last_status.is_none()
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DeliveryStatus;

    #[test]
    fn test_entities_are_per_dataset() {
        let mut ctx = ConversationContext::new();
        assert!(ctx.is_empty());

        ctx.set_last_entity(DatasetKind::Parts, "105D");
        ctx.set_last_entity(DatasetKind::Delivery, "RC16-02");
        assert_eq!(ctx.get_last_entity(DatasetKind::Parts), Some("105D"));
        assert_eq!(ctx.get_last_entity(DatasetKind::Delivery), Some("RC16-02"));
        assert!(ctx.updated_at().is_some());
    }

    #[test]
    fn test_last_write_wins() {
        let mut ctx = ConversationContext::new();
        ctx.set_last_entity(DatasetKind::Parts, "105D");
        ctx.set_last_entity(DatasetKind::Parts, "2231");
        assert_eq!(ctx.get_last_entity(DatasetKind::Parts), Some("2231"));

        ctx.set_last_status(StatusFilter::Status(DeliveryStatus::Late));
        ctx.set_last_status(StatusFilter::NotArrived);
        assert_eq!(ctx.get_last_status(), Some(&StatusFilter::NotArrived));
    }

    #[test]
    fn test_reset() {
        let mut ctx = ConversationContext::new();
        ctx.set_last_entity(DatasetKind::Parts, "105D");
        ctx.set_last_status(StatusFilter::OnTime);
        ctx.record_turn();
        ctx.reset();
        assert!(ctx.is_empty());
        assert_eq!(ctx.turns(), 0);
        assert!(ctx.updated_at().is_none());
    }
}
