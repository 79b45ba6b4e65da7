//! Data models for FlavorAI entities.
//!
//! - `Identity`, `LoginRequest`, `LoginResponse`: authentication payloads
//! - `RecipeListItem`, `RecipeDetail`, `Author`: recipes as served by the API
//! - `NewRecipe`, `RateRequest`: request bodies for authoring and rating

pub mod auth;
pub mod recipe;

pub use auth::{Identity, LoginRequest, LoginResponse};
pub use recipe::{
    Author, NewRecipe, RateRequest, RecipeDetail, RecipeListItem, ValidationError, MAX_RATING,
    MIN_RATING,
};
