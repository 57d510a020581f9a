//! HTTP request and response bodies shared by the server and its clients.

use crate::{NewEntry, Timestamp};
use serde::{Deserialize, Serialize};

/// Body of `POST /users/{owner}/journal-entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    #[serde(flatten)]
    pub entry: NewEntry,
    /// Creation instant; the server stamps its own clock when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// Response to a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEntry {
    pub id: String,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_is_flat() {
        let request = CreateEntryRequest {
            entry: NewEntry::for_date("2024-01-01"),
            timestamp: Some(1000),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["date"], json!("2024-01-01"));
        assert_eq!(value["timestamp"], json!(1000));
        assert!(value.get("entry").is_none());
    }

    #[test]
    fn create_request_without_timestamp() {
        let value = json!({
            "date": "2024-03-03",
            "morningEnergy": 4,
            "afternoonEnergy": 5,
            "eveningEnergy": 6,
            "morningFocus": "",
            "afternoonMoment": "",
            "eveningEmotion": "calm",
            "eveningAuthentic": "",
            "eveningActing": "",
            "eveningAdmiration": ""
        });
        let request: CreateEntryRequest = serde_json::from_value(value).unwrap();
        assert_eq!(request.timestamp, None);
        assert_eq!(request.entry.evening_emotion, "calm");
    }
}
