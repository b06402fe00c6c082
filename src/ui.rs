//! Embedded web UI.
//!
//! The chat front-end is a single static page compiled into the binary via
//! `rust-embed`, so the server ships as one artifact with no asset
//! directory to deploy.

use axum::{
    http::{header, StatusCode, Uri},
    response::IntoResponse,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Serve embedded UI assets. `/` resolves to `index.html`.
pub async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_html_is_embedded() {
        assert!(Assets::get("index.html").is_some());
    }

    #[test]
    fn test_unknown_asset_is_none() {
        assert!(Assets::get("missing.js").is_none());
    }
}
