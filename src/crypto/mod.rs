//! Request authentication and payload encryption
//!
//! Signatures are a SHA-1 over the sorted concatenation of the shared token
//! and request parameters. Payloads are AES-256-CBC under the account's
//! 43-character encoding key.

pub mod cipher;
pub mod signature;

pub use cipher::{decrypt, encrypt, extract_and_validate, seal, AesKey};
pub use signature::{is_valid, is_valid_msg_signature, make_signature};
