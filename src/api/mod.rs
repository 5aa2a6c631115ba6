//! HTTP client for the remote photo feed service.
//!
//! All endpoints return JSON. Every non-success status collapses into
//! [`ApiError::HttpStatus`]; callers treat any rejection uniformly and
//! surface it as an alert or a full-screen error state.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Items per flat page. A shorter page ends pagination for the session.
pub const FEED_PAGE_SIZE: usize = 8;
/// Brand groups per brand-sorted page.
pub const BRAND_PAGE_SIZE: usize = 2;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static API_TOKEN: OnceLock<Option<SecretString>> = OnceLock::new();

fn api_token() -> Option<&'static SecretString> {
    API_TOKEN
        .get_or_init(|| std::env::var("MOSAIC_API_TOKEN").ok().map(SecretString::from))
        .as_ref()
}

// ============================================================================
// Wire Types
// ============================================================================

/// A single photo feed entry as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(rename = "feedId")]
    pub id: i64,
    #[serde(rename = "feedThumbnailImgUrl", default)]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "feedFavorite", default)]
    pub favorite: bool,
    #[serde(rename = "brandName", default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
}

/// One brand group inside a brand-sorted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandGroup {
    #[serde(rename = "brandName")]
    pub brand_name: String,
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandListResponse {
    #[serde(rename = "brandList", default)]
    pub brand_list: Vec<BrandGroup>,
}

/// Confirmed favorite state after a toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteResponse {
    #[serde(rename = "feedId")]
    pub feed_id: i64,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlbumResponse {
    #[serde(rename = "albumId")]
    pub album_id: i64,
}

/// Album summary for the add-to-album picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(rename = "albumId")]
    pub album_id: i64,
    #[serde(rename = "albumTitle")]
    pub title: String,
}

#[derive(Serialize)]
struct ImageListBody<'a> {
    #[serde(rename = "imageList")]
    image_list: &'a [i64],
}

#[derive(Serialize)]
struct CreateAlbumBody<'a> {
    #[serde(rename = "albumTitle")]
    album_title: &'a str,
    #[serde(rename = "imageList")]
    image_list: &'a [i64],
}

// ============================================================================
// Error Type
// ============================================================================

/// Errors from the feed service client.
///
/// The orchestrator does not distinguish between variants beyond logging:
/// every rejection becomes a user-visible alert or error screen.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the 10-second timeout
    #[error("request timed out")]
    Timeout,
    /// Non-2xx HTTP response
    #[error("server returned status {0}")]
    HttpStatus(u16),
    /// Response body was not the expected JSON shape
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The configured base URL could not be joined with an endpoint path
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

// ============================================================================
// Client
// ============================================================================

/// Typed client for the feed/album endpoints.
///
/// Cheap to clone: `reqwest::Client` is internally reference-counted, so
/// spawned background tasks clone freely.
#[derive(Debug, Clone)]
pub struct FeedApi {
    client: reqwest::Client,
    base_url: Url,
}

impl FeedApi {
    /// Create a client rooted at `base_url` (e.g. `http://127.0.0.1:8080/api/`).
    ///
    /// A trailing slash is appended when missing so that `Url::join` keeps
    /// the final path segment of the base.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Ok(Self {
            client,
            base_url: Url::parse(&normalized)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match api_token() {
            Some(token) => builder.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
            None => builder,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.request(builder).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let bytes = response.bytes().await.map_err(ApiError::Network)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, builder: reqwest::RequestBuilder) -> Result<(), ApiError> {
        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.request(builder).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    /// Fetch one flat page: `GET feeds?type={0|1}&page=N&size=8`.
    pub async fn feeds(
        &self,
        type_code: u8,
        page: usize,
        size: usize,
    ) -> Result<Vec<Feed>, ApiError> {
        let url = self.endpoint("feeds")?;
        let builder = self.client.get(url).query(&[
            ("type", type_code.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ]);
        self.send_json(builder).await
    }

    /// Fetch one brand-grouped page: `GET feeds/brand?type=2&page=N&size=2`.
    pub async fn feeds_by_brand(
        &self,
        type_code: u8,
        page: usize,
        size: usize,
    ) -> Result<BrandListResponse, ApiError> {
        let url = self.endpoint("feeds/brand")?;
        let builder = self.client.get(url).query(&[
            ("type", type_code.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ]);
        self.send_json(builder).await
    }

    /// Toggle the favorite flag server-side and return the confirmed state.
    pub async fn toggle_favorite(&self, feed_id: i64) -> Result<FavoriteResponse, ApiError> {
        let url = self.endpoint(&format!("feeds/{}/favorite", feed_id))?;
        self.send_json(self.client.post(url)).await
    }

    /// Delete the given feeds in one batch.
    pub async fn delete_feeds(&self, feed_ids: &[i64]) -> Result<(), ApiError> {
        let url = self.endpoint("feeds/delete")?;
        let body = ImageListBody { image_list: feed_ids };
        self.send_empty(self.client.post(url).json(&body)).await
    }

    /// Create an album containing the given feeds; returns the new album id.
    pub async fn create_album(
        &self,
        title: &str,
        feed_ids: &[i64],
    ) -> Result<CreateAlbumResponse, ApiError> {
        let url = self.endpoint("albums")?;
        let body = CreateAlbumBody {
            album_title: title,
            image_list: feed_ids,
        };
        self.send_json(self.client.post(url).json(&body)).await
    }

    /// Add the given feeds to an existing album.
    pub async fn add_photos_to_album(
        &self,
        album_id: i64,
        feed_ids: &[i64],
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("albums/{}/photos", album_id))?;
        let body = ImageListBody { image_list: feed_ids };
        self.send_empty(self.client.post(url).json(&body)).await
    }

    /// List existing albums for the add-to-album picker.
    pub async fn albums(&self) -> Result<Vec<Album>, ApiError> {
        let url = self.endpoint("albums")?;
        self.send_json(self.client.get(url)).await
    }
}
