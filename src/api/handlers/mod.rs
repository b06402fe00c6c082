//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Chat streaming handler.
pub mod chat;
/// Feedback recording and listing handlers.
pub mod feedback;
/// Health and application metadata handlers.
pub mod meta;
/// Session transcript handlers.
pub mod sessions;
