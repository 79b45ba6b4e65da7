//! Authentication state for the client.
//!
//! This module provides:
//! - `SessionStore`: the single owner of "who is logged in", hydrated from
//!   durable storage once per process and kept in sync with it afterwards
//! - `Session`, `SessionStatus`: the values consumers read
//!
//! Tokens are opaque. The client never inspects or refreshes them; the API
//! rejecting a request is the only signal that a token stopped working.

pub mod session;

pub use session::{Session, SessionStatus, SessionStore, TOKEN_KEY, USER_KEY};
