use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// A single routine step. Serialized as `{"id":1,"text":"Bag","done":false}`.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub text: Arc<str>,
    pub done: bool,
}

impl ChecklistItem {
    pub fn new(id: ItemId, text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            text: text.into(),
            done: false,
        }
    }

    pub fn toggled(self) -> Self {
        Self {
            done: !self.done,
            ..self
        }
    }

    pub fn reset(self) -> Self {
        Self {
            done: false,
            ..self
        }
    }
}

/// Everything that survives between app loads.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct AppState {
    /// Insertion order, which is also display order.
    pub items: Vec<ChecklistItem>,
    pub streak: u64,
    /// Calendar-day string of the last day the streak was extended.
    pub last_completed: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            items: default_items(),
            streak: 0,
            last_completed: None,
        }
    }
}

/// Items seeded on the very first run.
pub fn default_items() -> Vec<ChecklistItem> {
    vec![
        ChecklistItem::new(1, "Get washed"),
        ChecklistItem::new(2, "Brush teeth"),
        ChecklistItem::new(3, "Today's clothes"),
        ChecklistItem::new(4, "Bag"),
    ]
}

/// Result of [Checklist::complete_day](super::manager::Checklist::complete_day).
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct DayCompletion {
    pub streak: u64,
    /// False when the day had already been completed.
    pub incremented: bool,
}

#[cfg(test)]
mod tests {
    use super::ChecklistItem;

    #[test]
    fn test_item_wire_format() {
        let item = ChecklistItem::new(1718000000000, "Pack lunch").toggled();
        let text = serde_json::to_string(&item).unwrap();
        assert_eq!(text, r#"{"id":1718000000000,"text":"Pack lunch","done":true}"#);
    }
}
