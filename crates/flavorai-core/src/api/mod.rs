//! REST API client module for the FlavorAI recipe service.
//!
//! This module provides the `ApiClient` for logging in and for listing,
//! reading, creating and rating recipes.
//!
//! Protected endpoints take the bearer token obtained from `POST /auth/login`.
//! Error bodies of the form `{"message": string | string[]}` are flattened into
//! a single message suitable for showing to the user.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
