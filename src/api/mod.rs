//! Management API client

pub mod client;
pub mod menu;

pub use client::{ApiClient, DEFAULT_API_BASE};
pub use menu::{ButtonType, Menu, MenuButton};
