//! wx-webhook - Weixin official account webhook adapter
//!
//! Authenticates and decodes callback requests, builds passive replies,
//! and talks to the management API with a cached access token.

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod message;
pub mod webhook;

pub use error::{DecryptError, Result, WebhookError};
pub use message::{Reply, Request};
pub use webhook::{RawRequest, Webhook, WebhookConfig};
