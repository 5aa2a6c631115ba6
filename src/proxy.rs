//! Same-origin image proxy.
//!
//! Thumbnails are served by arbitrary remote hosts; the grid loads them
//! through this endpoint instead so every image arrives from one origin
//! with a uniform cache policy. The router is bound on a loopback port at
//! startup and the cell loader rewrites thumbnail URLs to it.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use thiserror::Error;

/// One day, public — the relay adds this to every successful response.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=86400";

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Clone)]
struct ProxyState {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    url: Option<String>,
}

#[derive(Debug, Error)]
enum ProxyError {
    #[error("Missing 'url' query parameter")]
    MissingUrl,
    #[error("Failed to fetch image")]
    UpstreamStatus(u16),
    #[error("Proxy error")]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MissingUrl => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Transport(err) => {
                tracing::error!(error = %err, "Image proxy transport failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the proxy router. The reqwest client is shared with the rest of
/// the application.
pub fn router(client: reqwest::Client) -> Router {
    Router::new()
        .route("/api/image-proxy", get(image_proxy))
        .with_state(ProxyState { client })
}

/// Serve the router on an already-bound listener until the process exits.
pub async fn serve(
    listener: tokio::net::TcpListener,
    client: reqwest::Client,
) -> std::io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "Image proxy listening");
    axum::serve(listener, router(client)).await
}

async fn image_proxy(
    State(state): State<ProxyState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, ProxyError> {
    let url = params.url.ok_or(ProxyError::MissingUrl)?;

    let upstream = state.client.get(&url).send().await?;
    if !upstream.status().is_success() {
        return Err(ProxyError::UpstreamStatus(upstream.status().as_u16()));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let body = upstream.bytes().await?;

    tracing::debug!(url = %url, bytes = body.len(), content_type = %content_type, "Relayed image");

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}
