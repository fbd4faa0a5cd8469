//! # herald-core
//!
//! Core types, traits, and configuration for the herald notification client.
//!
//! This crate provides the wire models, error type, defaults and the API
//! traits that the HTTP client implements and the notification surface
//! consumes.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod preferences;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{ConfigError, HeraldConfig, IdentityConfig, ToastConfig};
pub use error::{Error, Result};
pub use events::{Channel, ConnectionEvent, EventBus};
pub use models::*;
pub use pagination::{Pagination, PaginationView};
pub use preferences::{Preferences, PreferencesStore};
pub use temporal::{format_date, format_datetime, time_ago, Age};
pub use traits::*;
