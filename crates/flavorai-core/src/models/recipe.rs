use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest value accepted by `POST /recipes/:id/rate`.
pub const MIN_RATING: u8 = 1;

/// Highest value accepted by `POST /recipes/:id/rate`.
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeListItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(rename = "averageRating", default)]
    pub average_rating: f64,
    #[serde(rename = "ratingsCount", default)]
    pub ratings_count: u32,
    #[serde(default)]
    pub author: Option<Author>,
}

impl RecipeListItem {
    pub fn rating_display(&self) -> String {
        rating_display(self.average_rating, self.ratings_count)
    }

    pub fn author_email(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.email.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(rename = "averageRating", default)]
    pub average_rating: f64,
    #[serde(rename = "ratingsCount", default)]
    pub ratings_count: u32,
}

impl RecipeDetail {
    pub fn rating_display(&self) -> String {
        rating_display(self.average_rating, self.ratings_count)
    }

    pub fn author_email(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.email.as_str())
    }
}

/// "⭐ 4.5 (2 ratings)"
fn rating_display(average: f64, count: u32) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("⭐ {:.1} ({} rating{})", average, count, plural)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange(u8),
}

/// Body of `POST /recipes`. Optional fields left blank are not sent at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl NewRecipe {
    /// Build a recipe from raw form fields.
    pub fn from_form(
        title: &str,
        description: &str,
        ingredients: &str,
        instructions: &str,
        cuisine: &str,
    ) -> Result<Self, ValidationError> {
        let required = |value: &str, name: &'static str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ValidationError::MissingField(name))
            } else {
                Ok(trimmed.to_string())
            }
        };
        let optional = |value: &str| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        Ok(Self {
            title: required(title, "Title")?,
            description: optional(description),
            ingredients: required(ingredients, "Ingredients")?,
            instructions: required(instructions, "Instructions")?,
            cuisine: optional(cuisine),
        })
    }
}

/// Body of `POST /recipes/:id/rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateRequest {
    pub value: u8,
}

impl RateRequest {
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self { value })
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }
}
