//! Core library for the FlavorAI terminal client.
//!
//! - `auth`: the session store (who is logged in) and its lifecycle
//! - `storage`: durable key-value backends the session persists into
//! - `api`: HTTP client for the FlavorAI recipe API
//! - `models`: request/response types shared with the API
//! - `config`: user configuration and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionStatus, SessionStore};
pub use config::{Config, StorageBackend};
pub use storage::{DurableStorage, FileStorage, KeyringStorage, MemoryStorage, StorageError};
