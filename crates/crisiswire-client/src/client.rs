//! Typed HTTP client for the disaster-response platform API.
//!
//! The notification hub has no dependency on this client; views use both
//! independently and reconcile by refetching here when notified.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crisiswire_core::{
    ApiHealth, Disaster, DisasterFilter, DisasterPatch, Error, GeocodeResult, ImageVerification,
    NewDisaster, OfficialUpdate, Resource, Result, SocialMediaFeed,
};

use crate::config::ApiConfig;

/// Client for the platform REST API.
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a client with explicit configuration.
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        info!(base_url = %config.base_url, "Initializing platform API client");

        Self { client, config }
    }

    /// Create a client configured from environment variables.
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    /// The active configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Disasters
    // ------------------------------------------------------------------------

    /// List disaster records, optionally filtered.
    pub async fn list_disasters(&self, filter: &DisasterFilter) -> Result<Vec<Disaster>> {
        debug!(?filter, "Listing disasters");
        let response = self
            .request(Method::GET, "/disasters")
            .query(filter)
            .send()
            .await?;
        let envelope: DisastersEnvelope = Self::decode(response).await?;
        Ok(envelope.disasters)
    }

    /// Fetch one disaster record by id.
    pub async fn get_disaster(&self, id: &str) -> Result<Disaster> {
        let response = self
            .request(Method::GET, &format!("/disasters/{}", id))
            .send()
            .await?;
        let envelope: DisasterEnvelope = Self::decode(response).await?;
        Ok(envelope.disaster)
    }

    /// Create a disaster record.
    pub async fn create_disaster(&self, disaster: &NewDisaster) -> Result<Disaster> {
        debug!(title = %disaster.title, "Creating disaster record");
        let response = self
            .request(Method::POST, "/disasters")
            .json(disaster)
            .send()
            .await?;
        let envelope: DisasterEnvelope = Self::decode(response).await?;
        Ok(envelope.disaster)
    }

    /// Update a disaster record.
    pub async fn update_disaster(&self, id: &str, patch: &DisasterPatch) -> Result<Disaster> {
        debug!(disaster_id = id, "Updating disaster record");
        let response = self
            .request(Method::PUT, &format!("/disasters/{}", id))
            .json(patch)
            .send()
            .await?;
        let envelope: DisasterEnvelope = Self::decode(response).await?;
        Ok(envelope.disaster)
    }

    /// Delete a disaster record.
    pub async fn delete_disaster(&self, id: &str) -> Result<()> {
        debug!(disaster_id = id, "Deleting disaster record");
        let response = self
            .request(Method::DELETE, &format!("/disasters/{}", id))
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ------------------------------------------------------------------------
    // Per-disaster feeds
    // ------------------------------------------------------------------------

    /// Fetch the social-media feed for a disaster. `keywords` narrows the
    /// feed server-side; pass an empty slice for everything.
    pub async fn social_media(
        &self,
        disaster_id: &str,
        keywords: &[String],
    ) -> Result<SocialMediaFeed> {
        let path = format!("/social-media/disasters/{}/social-media", disaster_id);
        let mut request = self.request(Method::GET, &path);
        if !keywords.is_empty() {
            request = request.query(&[("keywords", keywords.join(","))]);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Fetch the resources deployed for a disaster.
    pub async fn resources(&self, disaster_id: &str) -> Result<Vec<Resource>> {
        let path = format!("/resources/disasters/{}/resources", disaster_id);
        let response = self.request(Method::GET, &path).send().await?;
        let envelope: ResourcesEnvelope = Self::decode(response).await?;
        Ok(envelope.resources)
    }

    /// Fetch official updates published for a disaster.
    pub async fn official_updates(&self, disaster_id: &str) -> Result<Vec<OfficialUpdate>> {
        let path = format!("/updates/disasters/{}/official-updates", disaster_id);
        let response = self.request(Method::GET, &path).send().await?;
        let envelope: UpdatesEnvelope = Self::decode(response).await?;
        Ok(envelope.updates)
    }

    // ------------------------------------------------------------------------
    // Verification, geocoding, health
    // ------------------------------------------------------------------------

    /// Verify a user-submitted image against a disaster's context.
    pub async fn verify_image(
        &self,
        disaster_id: &str,
        image_url: &str,
    ) -> Result<ImageVerification> {
        debug!(disaster_id, image_url, "Requesting image verification");
        let response = self
            .request(Method::POST, "/verification/verify-image")
            .json(&VerifyImageRequest {
                disaster_id,
                image_url,
            })
            .send()
            .await?;
        let envelope: VerificationEnvelope = Self::decode(response).await?;
        Ok(envelope.verification)
    }

    /// Resolve a free-text location name to coordinates.
    pub async fn geocode(&self, location: &str) -> Result<GeocodeResult> {
        let path = format!("/geocode/{}", urlencoding::encode(location));
        let response = self.request(Method::GET, &path).send().await?;
        Self::decode(response).await
    }

    /// Probe platform health.
    pub async fn health(&self) -> Result<ApiHealth> {
        let response = self.request(Method::GET, "/health").send().await?;
        Self::decode(response).await
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Decode a success body, or map a non-2xx response to [`Error::Api`].
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))
    }

    /// Success check for endpoints whose body carries nothing.
    async fn check_status(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), response).await);
        }
        Ok(())
    }

    async fn api_error(status: u16, response: reqwest::Response) -> Error {
        let body = response.text().await.unwrap_or_default();
        // The platform reports failures as {"error": "..."}; fall back to the
        // raw body for anything else.
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        warn!(status, message = %message, "Platform API request failed");
        Error::Api { status, message }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

// Response envelopes used by the platform API.

#[derive(Deserialize)]
struct DisastersEnvelope {
    #[serde(default)]
    disasters: Vec<Disaster>,
}

#[derive(Deserialize)]
struct DisasterEnvelope {
    disaster: Disaster,
}

#[derive(Deserialize)]
struct ResourcesEnvelope {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Deserialize)]
struct UpdatesEnvelope {
    #[serde(default)]
    updates: Vec<OfficialUpdate>,
}

#[derive(Deserialize)]
struct VerificationEnvelope {
    verification: ImageVerification,
}

#[derive(Serialize)]
struct VerifyImageRequest<'a> {
    disaster_id: &'a str,
    image_url: &'a str,
}
