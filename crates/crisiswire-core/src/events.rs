//! Event catalog and notification envelope for the real-time layer.
//!
//! The platform backend is stateless and offers no push channel, so the
//! notification hub synthesizes events locally (see `crisiswire-hub`). Every
//! delivery uses [`Notification`], a self-describing envelope carrying the
//! event id, the kind, the occurrence timestamp, and the originating disaster
//! scope for scope-specific events.
//!
//! Event kinds are a closed enumeration rather than free-form strings: the
//! wire names (`disaster_created`, ...) are preserved through serde renames,
//! but consumers dispatch on [`EventKind`] and the compiler checks coverage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Connection state
// ============================================================================

/// Connection state of the notification hub.
///
/// Owned exclusively by the hub; both transitions are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

// ============================================================================
// Scope
// ============================================================================

/// A feed scope: either the platform-wide general feed or one disaster's feed.
///
/// Each active scope owns at most one feed task at a time. The general scope
/// lives from hub activation to shutdown; disaster scopes are entered and left
/// explicitly by views.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Platform-wide feed.
    General,
    /// Feed for a single disaster, identified by its record id.
    Disaster(String),
}

impl Scope {
    /// Scope for a single disaster.
    pub fn disaster(id: impl Into<String>) -> Self {
        Scope::Disaster(id.into())
    }

    /// The disaster id for disaster scopes, `None` for the general scope.
    pub fn disaster_id(&self) -> Option<&str> {
        match self {
            Scope::General => None,
            Scope::Disaster(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::General => write!(f, "general"),
            Scope::Disaster(id) => write!(f, "{}", id),
        }
    }
}

// ============================================================================
// Event kinds
// ============================================================================

/// Kind of a real-time notification. Used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new disaster record was created.
    DisasterCreated,
    /// An existing disaster record changed.
    DisasterUpdated,
    /// The social-media feed for a disaster (or the platform) refreshed.
    SocialMediaUpdated,
    /// The deployed-resource list for a disaster changed.
    ResourcesUpdated,
}

impl EventKind {
    /// Wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DisasterCreated => "disaster_created",
            EventKind::DisasterUpdated => "disaster_updated",
            EventKind::SocialMediaUpdated => "social_media_updated",
            EventKind::ResourcesUpdated => "resources_updated",
        }
    }

    /// Parse a wire name (case-sensitive). Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "disaster_created" => Some(EventKind::DisasterCreated),
            "disaster_updated" => Some(EventKind::DisasterUpdated),
            "social_media_updated" => Some(EventKind::SocialMediaUpdated),
            "resources_updated" => Some(EventKind::ResourcesUpdated),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kinds the general feed can carry.
pub const GENERAL_EVENTS: [EventKind; 3] = [
    EventKind::DisasterCreated,
    EventKind::DisasterUpdated,
    EventKind::SocialMediaUpdated,
];

/// Event kinds a disaster-scope feed can carry.
pub const DISASTER_EVENTS: [EventKind; 3] = [
    EventKind::DisasterUpdated,
    EventKind::SocialMediaUpdated,
    EventKind::ResourcesUpdated,
];

// ============================================================================
// Notification envelope
// ============================================================================

/// A single real-time notification delivered to subscribers.
///
/// Notifications are ephemeral: never persisted, never queued. A consumer
/// that is not subscribed at delivery time misses the event permanently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// What happened.
    pub kind: EventKind,
    /// When it happened (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Originating disaster for scope-specific events; `None` on the
    /// general feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disaster_id: Option<String>,
}

impl Notification {
    /// A general-feed notification, stamped now.
    pub fn general(kind: EventKind) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            occurred_at: Utc::now(),
            disaster_id: None,
        }
    }

    /// A disaster-scope notification, stamped now.
    pub fn for_disaster(kind: EventKind, disaster_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            occurred_at: Utc::now(),
            disaster_id: Some(disaster_id.into()),
        }
    }

    /// A notification for the given scope, stamped now.
    pub fn for_scope(kind: EventKind, scope: &Scope) -> Self {
        match scope {
            Scope::General => Self::general(kind),
            Scope::Disaster(id) => Self::for_disaster(kind, id.clone()),
        }
    }

    /// True for disaster-scope notifications.
    pub fn is_scoped(&self) -> bool {
        self.disaster_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_wire_names() {
        assert_eq!(EventKind::DisasterCreated.as_str(), "disaster_created");
        assert_eq!(EventKind::DisasterUpdated.as_str(), "disaster_updated");
        assert_eq!(
            EventKind::SocialMediaUpdated.as_str(),
            "social_media_updated"
        );
        assert_eq!(EventKind::ResourcesUpdated.as_str(), "resources_updated");
    }

    #[test]
    fn event_kind_parse_roundtrip() {
        for kind in GENERAL_EVENTS.iter().chain(DISASTER_EVENTS.iter()) {
            assert_eq!(EventKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(EventKind::parse("unknown_event"), None);
        assert_eq!(EventKind::parse(""), None);
    }

    #[test]
    fn event_kind_json_serialization() {
        let json = serde_json::to_string(&EventKind::SocialMediaUpdated).unwrap();
        assert_eq!(json, "\"social_media_updated\"");

        let parsed: EventKind = serde_json::from_str("\"resources_updated\"").unwrap();
        assert_eq!(parsed, EventKind::ResourcesUpdated);
    }

    #[test]
    fn catalogs_match_the_feed_contract() {
        assert!(GENERAL_EVENTS.contains(&EventKind::DisasterCreated));
        assert!(!GENERAL_EVENTS.contains(&EventKind::ResourcesUpdated));
        assert!(DISASTER_EVENTS.contains(&EventKind::ResourcesUpdated));
        assert!(!DISASTER_EVENTS.contains(&EventKind::DisasterCreated));
    }

    #[test]
    fn scope_display_and_id() {
        assert_eq!(Scope::General.to_string(), "general");
        assert_eq!(Scope::disaster("d1").to_string(), "d1");
        assert_eq!(Scope::General.disaster_id(), None);
        assert_eq!(Scope::disaster("d1").disaster_id(), Some("d1"));
    }

    #[test]
    fn general_notification_has_no_disaster_id() {
        let n = Notification::general(EventKind::DisasterCreated);
        assert!(n.disaster_id.is_none());
        assert!(!n.is_scoped());
        assert_eq!(n.kind, EventKind::DisasterCreated);
    }

    #[test]
    fn disaster_notification_carries_scope() {
        let n = Notification::for_disaster(EventKind::ResourcesUpdated, "d42");
        assert_eq!(n.disaster_id.as_deref(), Some("d42"));
        assert!(n.is_scoped());
    }

    #[test]
    fn for_scope_dispatches_on_scope() {
        let general = Notification::for_scope(EventKind::DisasterUpdated, &Scope::General);
        assert!(general.disaster_id.is_none());

        let scoped =
            Notification::for_scope(EventKind::DisasterUpdated, &Scope::disaster("d7"));
        assert_eq!(scoped.disaster_id.as_deref(), Some("d7"));
    }

    #[test]
    fn notification_json_skips_absent_scope() {
        let n = Notification::general(EventKind::DisasterCreated);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"kind\":\"disaster_created\""));
        assert!(!json.contains("disaster_id"));

        let scoped = Notification::for_disaster(EventKind::SocialMediaUpdated, "d1");
        let json = serde_json::to_string(&scoped).unwrap();
        assert!(json.contains("\"disaster_id\":\"d1\""));
    }

    #[test]
    fn connection_state_defaults_to_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
