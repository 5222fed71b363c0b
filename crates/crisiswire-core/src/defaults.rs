//! Centralized default constants for the crisiswire system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// NOTIFICATION FEEDS
// =============================================================================

/// Polling interval for the general feed, in seconds.
pub const GENERAL_FEED_INTERVAL_SECS: u64 = 30;

/// Polling interval for a disaster-scope feed, in seconds.
///
/// Shorter than the general feed: a view watching one disaster wants tighter
/// freshness than the platform-wide list.
pub const DISASTER_FEED_INTERVAL_SECS: u64 = 15;

/// Per-tick probability that the general feed synthesizes an event.
pub const GENERAL_FEED_PROBABILITY: f64 = 0.10;

/// Per-tick probability that a disaster-scope feed synthesizes an event.
pub const DISASTER_FEED_PROBABILITY: f64 = 0.05;

// =============================================================================
// PLATFORM API
// =============================================================================

/// Default platform API base URL.
pub const API_URL: &str = "http://127.0.0.1:3000";

/// Default timeout for platform API requests, in seconds.
pub const API_TIMEOUT_SECS: u64 = 30;

/// Default page size when refetching the disaster list on notification.
pub const REFETCH_PAGE_LIMIT: i64 = 10;
