//! Session types for Farum.
//!
//! A session is a bounded relationship between one user and the companion.
//! It carries the preferred interaction mode that every message exchanged
//! inside it is stamped with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a session, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new SessionId using UUID v7 (time-sortable, guaranteed ordering).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a SessionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Caller-supplied user identifier.
///
/// Users are not managed by Farum; the id is an opaque string handed in by
/// the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How the companion should lean when replying.
///
/// Influences prompt assembly only; the pipeline control flow is the same
/// for every mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Short emotional check.
    #[default]
    CheckIn,
    /// Exploratory conversation.
    DeepDive,
    /// Goal-oriented planning.
    ActionPlan,
}

impl InteractionMode {
    /// Parse a mode from loosely formatted user input.
    ///
    /// Accepts the canonical names plus the short aliases `checkin`, `deep`
    /// and `action`. Anything unrecognised (including an empty string) falls
    /// back to `CheckIn`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "check_in" | "checkin" => InteractionMode::CheckIn,
            "deep_dive" | "deep" => InteractionMode::DeepDive,
            "action_plan" | "action" => InteractionMode::ActionPlan,
            _ => InteractionMode::default(),
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionMode::CheckIn => write!(f, "check_in"),
            InteractionMode::DeepDive => write!(f, "deep_dive"),
            InteractionMode::ActionPlan => write!(f, "action_plan"),
        }
    }
}

impl FromStr for InteractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "check_in" => Ok(InteractionMode::CheckIn),
            "deep_dive" => Ok(InteractionMode::DeepDive),
            "action_plan" => Ok(InteractionMode::ActionPlan),
            other => Err(format!("invalid interaction mode: '{other}'")),
        }
    }
}

/// A conversation between a user and the companion (may span days).
///
/// `id` and `created_at` never change after creation; `updated_at` moves
/// forward on every exchange and is never earlier than `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub preferred_mode: InteractionMode,
    pub title: String,
}

impl Session {
    /// Move `updated_at` forward to `now`, never backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_session() -> Session {
        let now = Utc::now();
        Session {
            id: SessionId::new(),
            user_id: UserId::new("user-123"),
            created_at: now,
            updated_at: now,
            preferred_mode: InteractionMode::CheckIn,
            title: "First session".to_string(),
        }
    }

    #[test]
    fn test_interaction_mode_roundtrip() {
        for mode in [
            InteractionMode::CheckIn,
            InteractionMode::DeepDive,
            InteractionMode::ActionPlan,
        ] {
            let s = mode.to_string();
            let parsed: InteractionMode = s.parse().unwrap();
            assert_eq!(mode, parsed);
        }
    }

    #[test]
    fn test_interaction_mode_serde() {
        let json = serde_json::to_string(&InteractionMode::DeepDive).unwrap();
        assert_eq!(json, "\"deep_dive\"");
        let parsed: InteractionMode = serde_json::from_str("\"action_plan\"").unwrap();
        assert_eq!(parsed, InteractionMode::ActionPlan);
    }

    #[test]
    fn test_parse_lenient_aliases() {
        assert_eq!(InteractionMode::parse_lenient("checkin"), InteractionMode::CheckIn);
        assert_eq!(InteractionMode::parse_lenient(" Deep "), InteractionMode::DeepDive);
        assert_eq!(InteractionMode::parse_lenient("ACTION"), InteractionMode::ActionPlan);
        assert_eq!(InteractionMode::parse_lenient(""), InteractionMode::CheckIn);
        assert_eq!(InteractionMode::parse_lenient("rant"), InteractionMode::CheckIn);
        assert_eq!(InteractionMode::parse_lenient("rant"), InteractionMode::default());
    }

    #[test]
    fn test_strict_parse_rejects_alias() {
        assert!("deep".parse::<InteractionMode>().is_err());
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_ids_are_time_ordered() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert!(a < b);
    }

    #[test]
    fn test_user_id_empty() {
        assert!(UserId::new("  ").is_empty());
        assert!(!UserId::new("u").is_empty());
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut session = test_session();
        let created = session.created_at;

        session.touch(created - Duration::seconds(5));
        assert_eq!(session.updated_at, created);

        let later = created + Duration::seconds(5);
        session.touch(later);
        assert_eq!(session.updated_at, later);
        assert!(session.updated_at >= session.created_at);
    }

    #[test]
    fn test_session_serialize() {
        let json = serde_json::to_string(&test_session()).unwrap();
        assert!(json.contains("\"preferred_mode\":\"check_in\""));
        assert!(json.contains("\"user_id\":\"user-123\""));
    }
}
