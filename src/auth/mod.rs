//! Management API authentication
//!
//! The platform hands out short-lived access tokens in exchange for the
//! app id and secret. [`CredentialCache`] keeps one around and renews it
//! ten minutes before it runs out.

pub mod issuer;
pub mod tokens;

pub use issuer::HttpIssuer;
pub use tokens::{
    Clock, Credential, CredentialCache, CredentialIssuer, IssuedCredential, SystemClock,
    SAFETY_MARGIN_SECS,
};
