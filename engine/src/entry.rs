//! Journal entry types and collection addressing.
//!
//! Entries live in an owner-scoped collection at
//! `users/{ownerId}/journal-entries/{entryId}`. The field names on the wire
//! are camelCase to match the stored document shape.

use crate::{EntryId, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Name of the per-owner entry collection.
pub const COLLECTION_NAME: &str = "journal-entries";

/// Field entries are ordered by.
pub const ORDER_FIELD: &str = "timestamp";

/// Path of an owner's entry collection.
pub fn collection_path(owner_id: &str) -> String {
    format!("users/{}/{}", owner_id, COLLECTION_NAME)
}

/// Path of a single entry document.
pub fn document_path(owner_id: &str, entry_id: &str) -> String {
    format!("{}/{}", collection_path(owner_id), entry_id)
}

/// A persisted journal entry as read back from the provider.
///
/// Energy readings are intended to be 1-10 and the date is a
/// caller-supplied string; neither is validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Provider-assigned document ID
    pub id: EntryId,
    pub date: String,
    pub morning_energy: i32,
    pub afternoon_energy: i32,
    pub evening_energy: i32,
    pub morning_focus: String,
    pub afternoon_moment: String,
    pub evening_emotion: String,
    pub evening_authentic: String,
    pub evening_acting: String,
    pub evening_admiration: String,
    /// Creation instant in milliseconds since epoch
    pub timestamp: Timestamp,
}

impl JournalEntry {
    /// Start building an entry with the identifying fields set.
    pub fn builder(
        id: impl Into<EntryId>,
        date: impl Into<String>,
        timestamp: Timestamp,
    ) -> EntryBuilder {
        EntryBuilder {
            entry: JournalEntry {
                id: id.into(),
                date: date.into(),
                morning_energy: 0,
                afternoon_energy: 0,
                evening_energy: 0,
                morning_focus: String::new(),
                afternoon_moment: String::new(),
                evening_emotion: String::new(),
                evening_authentic: String::new(),
                evening_acting: String::new(),
                evening_admiration: String::new(),
                timestamp,
            },
        }
    }

    /// Merge a partial update into this entry.
    ///
    /// `id` and `timestamp` are never touched.
    pub fn apply_patch(&mut self, patch: &EntryPatch) {
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(v) = patch.morning_energy {
            self.morning_energy = v;
        }
        if let Some(v) = patch.afternoon_energy {
            self.afternoon_energy = v;
        }
        if let Some(v) = patch.evening_energy {
            self.evening_energy = v;
        }
        if let Some(v) = &patch.morning_focus {
            self.morning_focus = v.clone();
        }
        if let Some(v) = &patch.afternoon_moment {
            self.afternoon_moment = v.clone();
        }
        if let Some(v) = &patch.evening_emotion {
            self.evening_emotion = v.clone();
        }
        if let Some(v) = &patch.evening_authentic {
            self.evening_authentic = v.clone();
        }
        if let Some(v) = &patch.evening_acting {
            self.evening_acting = v.clone();
        }
        if let Some(v) = &patch.evening_admiration {
            self.evening_admiration = v.clone();
        }
    }
}

/// Builder for [`JournalEntry`], mostly useful for fixtures.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    entry: JournalEntry,
}

impl EntryBuilder {
    /// Set the morning, afternoon and evening energy readings.
    pub fn energy(mut self, morning: i32, afternoon: i32, evening: i32) -> Self {
        self.entry.morning_energy = morning;
        self.entry.afternoon_energy = afternoon;
        self.entry.evening_energy = evening;
        self
    }

    pub fn morning_focus(mut self, text: impl Into<String>) -> Self {
        self.entry.morning_focus = text.into();
        self
    }

    pub fn afternoon_moment(mut self, text: impl Into<String>) -> Self {
        self.entry.afternoon_moment = text.into();
        self
    }

    pub fn evening_emotion(mut self, text: impl Into<String>) -> Self {
        self.entry.evening_emotion = text.into();
        self
    }

    pub fn build(self) -> JournalEntry {
        self.entry
    }
}

/// Fields a caller submits to create an entry.
///
/// The creation timestamp and the document ID are assigned at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub date: String,
    pub morning_energy: i32,
    pub afternoon_energy: i32,
    pub evening_energy: i32,
    pub morning_focus: String,
    pub afternoon_moment: String,
    pub evening_emotion: String,
    pub evening_authentic: String,
    pub evening_acting: String,
    pub evening_admiration: String,
}

impl NewEntry {
    /// Create a new entry for a date with every other field empty.
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    /// Turn the submitted fields into a persisted entry.
    pub fn into_entry(self, id: impl Into<EntryId>, timestamp: Timestamp) -> JournalEntry {
        JournalEntry {
            id: id.into(),
            date: self.date,
            morning_energy: self.morning_energy,
            afternoon_energy: self.afternoon_energy,
            evening_energy: self.evening_energy,
            morning_focus: self.morning_focus,
            afternoon_moment: self.afternoon_moment,
            evening_emotion: self.evening_emotion,
            evening_authentic: self.evening_authentic,
            evening_acting: self.evening_acting,
            evening_admiration: self.evening_admiration,
            timestamp,
        }
    }
}

/// A partial update to an entry.
///
/// Only the fields that are `Some` are written. `timestamp` and `id` are
/// deliberately absent, and unknown fields are rejected on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_energy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon_energy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_energy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon_moment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_authentic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_acting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_admiration: Option<String>,
}

impl EntryPatch {
    /// Check whether the patch writes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sort direction for entry queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Ordering clause for reads and subscriptions.
///
/// Only `timestamp` ordering is supported; it is the provider's job to
/// honor it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryQuery {
    #[serde(default)]
    pub direction: SortDirection,
}

impl EntryQuery {
    /// Newest entries first. This is what the journal views use.
    pub fn newest_first() -> Self {
        Self {
            direction: SortDirection::Desc,
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            direction: SortDirection::Asc,
        }
    }

    /// Compare two entries under this query's ordering.
    ///
    /// Ties on `timestamp` break on `id` in the same direction so the order
    /// is total.
    pub fn compare(&self, a: &JournalEntry, b: &JournalEntry) -> Ordering {
        let ord = a
            .timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Sort entries in place the way a provider must return them.
pub fn order_entries(entries: &mut [JournalEntry], query: &EntryQuery) {
    entries.sort_by(|a, b| query.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, timestamp: Timestamp) -> JournalEntry {
        JournalEntry::builder(id, "2024-01-01", timestamp).build()
    }

    #[test]
    fn paths() {
        assert_eq!(collection_path("u1"), "users/u1/journal-entries");
        assert_eq!(document_path("u1", "e9"), "users/u1/journal-entries/e9");
    }

    #[test]
    fn entry_serializes_camel_case() {
        let entry = JournalEntry::builder("e1", "2024-01-01", 1000)
            .energy(3, 5, 7)
            .morning_focus("notice when I smile")
            .build();

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["morningEnergy"], json!(3));
        assert_eq!(value["eveningEnergy"], json!(7));
        assert_eq!(value["morningFocus"], json!("notice when I smile"));
        assert_eq!(value["timestamp"], json!(1000));
    }

    #[test]
    fn apply_patch_only_touches_given_fields() {
        let mut entry = JournalEntry::builder("e1", "2024-01-01", 1000)
            .energy(3, 5, 7)
            .evening_emotion("curious")
            .build();

        let patch = EntryPatch {
            evening_energy: Some(9),
            evening_acting: Some("small talk".into()),
            ..Default::default()
        };
        entry.apply_patch(&patch);

        assert_eq!(entry.morning_energy, 3);
        assert_eq!(entry.evening_energy, 9);
        assert_eq!(entry.evening_emotion, "curious");
        assert_eq!(entry.evening_acting, "small talk");
        assert_eq!(entry.timestamp, 1000);
        assert_eq!(entry.id, "e1");
    }

    #[test]
    fn patch_rejects_timestamp() {
        let result: Result<EntryPatch, _> =
            serde_json::from_value(json!({"timestamp": 5, "morningEnergy": 2}));
        assert!(result.is_err());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = EntryPatch {
            morning_focus: Some("breathe".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"morningFocus": "breathe"})
        );
        assert!(!patch.is_empty());
        assert!(EntryPatch::default().is_empty());
    }

    #[test]
    fn new_entry_into_entry() {
        let mut new_entry = NewEntry::for_date("2024-02-02");
        new_entry.afternoon_energy = 6;

        let entry = new_entry.into_entry("abc", 42);
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.date, "2024-02-02");
        assert_eq!(entry.afternoon_energy, 6);
        assert_eq!(entry.timestamp, 42);
    }

    #[test]
    fn order_newest_first() {
        let mut entries = vec![entry("a", 10), entry("b", 30), entry("c", 20)];
        order_entries(&mut entries, &EntryQuery::newest_first());

        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn order_ties_break_on_id() {
        let mut entries = vec![entry("a", 10), entry("b", 10)];
        order_entries(&mut entries, &EntryQuery::newest_first());
        assert_eq!(entries[0].id, "b");

        order_entries(&mut entries, &EntryQuery::oldest_first());
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn query_defaults_to_desc() {
        let query: EntryQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query, EntryQuery::newest_first());

        let query: EntryQuery = serde_json::from_value(json!({"direction": "asc"})).unwrap();
        assert_eq!(query.direction, SortDirection::Asc);
    }
}
