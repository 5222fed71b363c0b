//! # crisiswire-client
//!
//! Typed HTTP client for the crisiswire platform API: disaster records,
//! social-media feeds, deployed resources, official updates, image
//! verification, geocoding, and the health probe.

pub mod client;
pub mod config;

pub use client::ApiClient;
pub use config::ApiConfig;
