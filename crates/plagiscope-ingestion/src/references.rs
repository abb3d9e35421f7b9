//! Ordered, user-edited list of reference texts.
//!
//! No operation validates id uniqueness or non-empty text; that happens only
//! when an analysis is requested.

use plagiscope_common::{ReferenceItem, SourceType};
use serde::Serialize;
use std::collections::BTreeSet;

/// One field of a [`ReferenceItem`] together with its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceField {
    Id(String),
    SourceType(SourceType),
    Text(String),
    Expanded(bool),
}

impl ReferenceField {
    /// Build a field update from a form-style `(field, value)` pair.
    pub fn parse(field: &str, value: &str) -> Result<Self, String> {
        match field {
            "id"                          => Ok(ReferenceField::Id(value.to_string())),
            "source_type" | "sourceType"  => value.parse().map(ReferenceField::SourceType),
            "text"                        => Ok(ReferenceField::Text(value.to_string())),
            "expanded" | "isExpanded"     => match value {
                "true" | "on" | "1"  => Ok(ReferenceField::Expanded(true)),
                "false" | "off" | "0" => Ok(ReferenceField::Expanded(false)),
                other => Err(format!("invalid boolean: {other}")),
            },
            other => Err(format!("unknown reference field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ReferenceStore {
    items: Vec<ReferenceItem>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next added record would get: `REF-NNN` from the current count.
    pub fn next_id(&self) -> String {
        format!("REF-{:03}", self.items.len() + 1)
    }

    /// Append an empty, expanded record and return its index.
    pub fn add(&mut self) -> usize {
        self.add_with_text(SourceType::default(), String::new())
    }

    /// Append a record pre-filled with text (e.g. from an uploaded file).
    pub fn add_with_text(&mut self, source_type: SourceType, text: String) -> usize {
        let item = ReferenceItem {
            id: self.next_id(),
            source_type,
            text,
            is_expanded: true,
        };
        self.items.push(item);
        self.items.len() - 1
    }

    /// Replace one field of the record at `index`. Returns false when the
    /// index is out of range.
    pub fn update(&mut self, index: usize, field: ReferenceField) -> bool {
        let Some(item) = self.items.get(index) else {
            return false;
        };
        let mut updated = item.clone();
        match field {
            ReferenceField::Id(id)            => updated.id = id,
            ReferenceField::SourceType(st)    => updated.source_type = st,
            ReferenceField::Text(text)        => updated.text = text,
            ReferenceField::Expanded(flag)    => updated.is_expanded = flag,
        }
        self.items[index] = updated;
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<ReferenceItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn toggle_expand(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.is_expanded = !item.is_expanded;
                true
            }
            None => false,
        }
    }

    pub fn items(&self) -> &[ReferenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records whose text is not blank.
    pub fn with_text(&self) -> Vec<ReferenceItem> {
        self.items.iter().filter(|r| r.has_text()).cloned().collect()
    }

    /// Ids used by more than one record, in sorted order.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut dups = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                dups.insert(item.id.clone());
            }
        }
        dups.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_generates_sequential_padded_ids() {
        let mut store = ReferenceStore::new();
        for expected in ["REF-001", "REF-002", "REF-003"] {
            let idx = store.add();
            assert_eq!(store.items()[idx].id, expected);
            assert!(store.items()[idx].is_expanded);
            assert!(store.items()[idx].text.is_empty());
        }
    }

    #[test]
    fn test_add_id_follows_current_count_after_remove() {
        let mut store = ReferenceStore::new();
        store.add();
        store.add();
        store.remove(0);
        let idx = store.add();
        // count was 1, so the new id is REF-002 again; ids are not unique
        assert_eq!(store.items()[idx].id, "REF-002");
        assert_eq!(store.duplicate_ids(), vec!["REF-002".to_string()]);
    }

    #[test]
    fn test_update_touches_only_target_record() {
        let mut store = ReferenceStore::new();
        store.add();
        store.add();
        store.add();
        let before = store.items().to_vec();

        assert!(store.update(1, ReferenceField::Text("Borrowed prose".into())));
        assert!(store.update(1, ReferenceField::SourceType(SourceType::Book)));

        assert_eq!(store.items()[0], before[0]);
        assert_eq!(store.items()[2], before[2]);
        assert_eq!(store.items()[1].text, "Borrowed prose");
        assert_eq!(store.items()[1].source_type, SourceType::Book);
        assert_eq!(store.items()[1].id, before[1].id);
    }

    #[test]
    fn test_out_of_range_operations_are_ignored() {
        let mut store = ReferenceStore::new();
        store.add();
        assert!(!store.update(5, ReferenceField::Id("X".into())));
        assert!(store.remove(5).is_none());
        assert!(!store.toggle_expand(5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_toggle_expand_flips_flag() {
        let mut store = ReferenceStore::new();
        store.add();
        assert!(store.toggle_expand(0));
        assert!(!store.items()[0].is_expanded);
        assert!(store.toggle_expand(0));
        assert!(store.items()[0].is_expanded);
    }

    #[test]
    fn test_with_text_skips_blank_references() {
        let mut store = ReferenceStore::new();
        store.add();
        store.add_with_text(SourceType::Website, "Some page text".into());
        let filled = store.with_text();
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].id, "REF-002");
    }

    #[test]
    fn test_field_parse() {
        assert_eq!(
            ReferenceField::parse("source_type", "thesis"),
            Ok(ReferenceField::SourceType(SourceType::Thesis))
        );
        assert_eq!(ReferenceField::parse("id", "SMITH-2020"), Ok(ReferenceField::Id("SMITH-2020".into())));
        assert!(ReferenceField::parse("colour", "red").is_err());
        assert!(ReferenceField::parse("source_type", "magazine").is_err());
    }
}
