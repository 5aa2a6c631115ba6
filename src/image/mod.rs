//! Thumbnail loading: per-cell lifecycle and the proxied fetch path.

pub mod cell;
pub mod loader;

pub use cell::{CellPhase, CellTracker, MAX_AUTO_RETRIES, RETRY_BASE_DELAY};
pub use loader::{fetch_thumbnail, proxy_url, ThumbnailCache, ThumbnailError};
