//! Core data models for crisiswire.
//!
//! These types mirror the platform API payloads and are shared across all
//! crisiswire crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// DISASTER RECORDS
// =============================================================================

/// A disaster record.
///
/// `tags` is a server-defined vocabulary, not an enum: hazard types (`flood`,
/// `earthquake`, `fire`, ...) mixed with status markers (`urgent`, `active`,
/// `resolved`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disaster {
    pub id: String,
    pub title: String,
    pub location_name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Disaster {
    /// True when the record carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Payload for creating a disaster record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDisaster {
    pub title: String,
    pub location_name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for a disaster record. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisasterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Query parameters for listing disaster records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisasterFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl DisasterFilter {
    /// Filter by tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Limit the number of returned records.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// SOCIAL MEDIA
// =============================================================================

/// One social-media report attached to a disaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialMediaReport {
    pub id: String,
    pub content: String,
    pub user: String,
    /// Server-assigned priority (`urgent`, `high`, `normal`).
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregated sentiment over a social-media feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: String,
}

/// Social-media feed for one disaster: reports plus optional analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialMediaFeed {
    #[serde(default)]
    pub reports: Vec<SocialMediaReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<SentimentAnalysis>,
}

// =============================================================================
// RESOURCES & OFFICIAL UPDATES
// =============================================================================

/// A resource deployed for a disaster (shelter, hospital, supply point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub location_name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// An official update published by an authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficialUpdate {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

// =============================================================================
// VERIFICATION & GEOCODING
// =============================================================================

/// Result of verifying a user-submitted image against a disaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageVerification {
    pub authentic: bool,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    pub manipulation_detected: bool,
    /// Whether the image plausibly shows the disaster in question.
    pub disaster_context: bool,
    pub notes: String,
}

/// Coordinates resolved from a free-text location name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub location_name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Platform health probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    pub status: String,
}

impl ApiHealth {
    /// True when the platform reports itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status == "ok" || self.status == "healthy"
    }
}
