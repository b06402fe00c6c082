//! HTTP API handlers and routes.
//!
//! This module provides the HTTP layer, built on the Axum web framework.
//!
//! # API Endpoints
//!
//! - `GET  /api/health` - liveness check with index statistics
//! - `GET  /api/app` - application metadata for the UI
//! - `POST /api/chat` - ask a question; answers stream back as SSE events
//! - `GET  /api/sessions/{id}` - session transcript
//! - `POST /api/feedback` - record thumbs-up/down on an assistant message
//! - `GET  /api/feedback` - list recorded feedback
//!
//! With the `ui` feature enabled, the embedded chat front-end is served
//! from `/`.
//!
//! # Chat Streaming
//!
//! `POST /api/chat` responds with `text/event-stream`. Events, in order:
//! `session` (ids for the exchange), optionally `hyde` (the hypothetical
//! passage), repeated `token` events with answer deltas, optionally
//! `sources` (numbered citations), and finally `done`. A failure mid-stream
//! emits an `error` event instead of aborting the connection.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

pub use routes::build_router;
