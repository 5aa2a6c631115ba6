//! Thumbnail fetching through the local image proxy.
//!
//! Cells never talk to the remote image host directly: their URL is
//! rewritten to the proxy endpoint (unless it already points there), and
//! bodies are streamed with a hard size cap. Loaded bytes go into a
//! bounded LRU cache so cells scrolled back into view do not refetch.

use futures::StreamExt;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

/// Hard cap on a single thumbnail body.
pub const MAX_THUMBNAIL_SIZE: usize = 4 * 1024 * 1024; // 4MB

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of thumbnails kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The feed carries no thumbnail URL at all.
    #[error("feed has no thumbnail URL")]
    MissingUrl,
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("proxy returned status {0}")]
    HttpStatus(u16),
    #[error("thumbnail larger than {MAX_THUMBNAIL_SIZE} bytes")]
    TooLarge,
}

/// Route a thumbnail URL through the proxy, unless it is already proxied.
pub fn proxy_url(proxy_base: &str, raw: &str) -> String {
    if raw.contains("/api/image-proxy") {
        return raw.to_string();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(raw.as_bytes()).collect();
    format!(
        "{}/api/image-proxy?url={}",
        proxy_base.trim_end_matches('/'),
        encoded
    )
}

/// Fetch one thumbnail body with a timeout and a streamed size cap.
pub async fn fetch_thumbnail(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, ThumbnailError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| ThumbnailError::Timeout)?
        .map_err(ThumbnailError::Network)?;

    if !response.status().is_success() {
        return Err(ThumbnailError::HttpStatus(response.status().as_u16()));
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_THUMBNAIL_SIZE {
            return Err(ThumbnailError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ThumbnailError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > MAX_THUMBNAIL_SIZE {
            return Err(ThumbnailError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Bounded feed-id → thumbnail-bytes cache.
#[derive(Debug)]
pub struct ThumbnailCache {
    entries: LruCache<i64, Vec<u8>>,
}

impl ThumbnailCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn insert(&mut self, feed_id: i64, bytes: Vec<u8>) {
        self.entries.put(feed_id, bytes);
    }

    pub fn contains(&self, feed_id: i64) -> bool {
        self.entries.contains(&feed_id)
    }

    /// Byte length of a cached thumbnail, refreshing its LRU position.
    pub fn size_of(&mut self, feed_id: i64) -> Option<usize> {
        self.entries.get(&feed_id).map(Vec::len)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
