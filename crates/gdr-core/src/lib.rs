//! Core domain + pipeline for the Google Drive folder relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the `gdown`
//! downloader live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod handler;
pub mod link;
pub mod locate;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod security;
pub mod workdir;

pub use errors::{Error, Result};
