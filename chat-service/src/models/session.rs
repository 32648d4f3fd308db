//! Chat session model shared by the Redis store and the MongoDB archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile details a client may attach to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub weight: Option<f64>,
    pub weight_goal: Option<f64>,
    pub height: Option<f64>,
    pub job: Option<String>,
    pub fitness_level: Option<String>,
    pub fitness_goal: Option<String>,
    pub health_condition: Option<String>,
    pub allergy: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub user: Option<UserInfo>,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "optional_timestamp")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl ChatSession {
    /// A fresh active session with a random UUID v4 id and no messages.
    pub fn new(user_id: &str, user: Option<UserInfo>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            messages: Vec::new(),
            user,
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Active,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
    }
}

/// A session read back from the archive, with the document `_id` as hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedSession {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub session: ChatSession,
}

/// Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
/// so archived documents sort chronologically on `started_at`.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Accepts RFC 3339 and offset-less ISO 8601 (assumed UTC).
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(_) => chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc()),
        }
    }
}

mod optional_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_some(&dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| super::timestamp::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_info_uses_camel_case() {
        let info: UserInfo = serde_json::from_value(json!({
            "firstName": "John",
            "weightGoal": 75.5,
            "fitnessLevel": "beginner"
        }))
        .unwrap();

        assert_eq!(info.first_name.as_deref(), Some("John"));
        assert_eq!(info.weight_goal, Some(75.5));
        assert_eq!(serde_json::to_value(&info).unwrap()["fitnessLevel"], "beginner");
    }

    #[test]
    fn new_session_is_active_and_empty() {
        let session = ChatSession::new("user-1", None);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.messages.is_empty());
        assert!(session.ended_at.is_none());
        assert!(Uuid::parse_str(&session.session_id).is_ok());
    }

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let session = ChatSession::new("user-1", None);
        let value = serde_json::to_value(&session).unwrap();
        let started = value["started_at"].as_str().unwrap();

        assert!(started.ends_with('Z'));
        assert_eq!(started.len(), "2024-01-01T00:00:00.000000Z".len());
        assert!(value["ended_at"].is_null());
    }

    #[test]
    fn reads_naive_iso_timestamps() {
        let session: ChatSession = serde_json::from_value(json!({
            "session_id": "s-1",
            "user_id": "u-1",
            "messages": [],
            "user": null,
            "started_at": "2024-05-01T10:20:30.123456",
            "ended_at": null,
            "status": "active"
        }))
        .unwrap();

        assert_eq!(session.started_at.to_rfc3339(), "2024-05-01T10:20:30.123456+00:00");
    }

    #[test]
    fn archived_session_flattens_with_string_id() {
        let archived = ArchivedSession {
            id: "65f0c0ffee".to_string(),
            session: ChatSession::new("user-1", None),
        };
        let value = serde_json::to_value(&archived).unwrap();
        assert_eq!(value["_id"], "65f0c0ffee");
        assert_eq!(value["user_id"], "user-1");
    }
}
