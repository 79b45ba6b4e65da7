//! API client for communicating with the FlavorAI REST API.
//!
//! Every call is a single request/response. There is no retry; failures are
//! returned as `ApiError` whose `Display` is the message to show inline.

use std::time::Duration;

use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{LoginRequest, LoginResponse, NewRecipe, RateRequest, RecipeDetail, RecipeListItem};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds, used when the config does not set one.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for FlavorAI.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/recipes/3`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    /// `GET /recipes`, with `?search=` only when there is something to search for.
    pub fn recipes_url(&self, search: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.endpoint("/recipes")?;
        if let Some(query) = search.map(str::trim).filter(|q| !q.is_empty()) {
            url.query_pairs_mut().append_pair("search", query);
        }
        Ok(url)
    }

    /// Send one request and return the JSON body untouched.
    ///
    /// The bearer header is attached only when `credential` is given. A
    /// non-success status becomes `ApiError::Status` with the server's message.
    pub async fn request_json<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Option<&str>,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        self.send(method, url, body, credential).await
    }

    /// `request_json`, deserialized into `T`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Option<&str>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.request_json(method, path, body, credential).await?;
        Self::decode(path, value)
    }

    async fn send<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        credential: Option<&str>,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        debug!(%method, %url, authenticated = credential.is_some(), "API request");

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(
                %method,
                %url,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&text),
                "API request failed"
            );
            return Err(ApiError::from_status(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{} {} returned invalid JSON: {}", method, url, e))
        })
    }

    fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, ApiError> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Unexpected response from {}: {}", what, e)))
    }

    // ===== Auth =====

    /// `POST /auth/login`
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.request(Method::POST, "/auth/login", Some(credentials), None)
            .await
    }

    // ===== Recipes =====

    /// `GET /recipes?search=<query>`
    pub async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<RecipeListItem>, ApiError> {
        let url = self.recipes_url(search)?;
        let value = self.send(Method::GET, url, None::<&()>, None).await?;
        Self::decode("/recipes", value)
    }

    /// `GET /recipes/me` - recipes written by the token's owner.
    pub async fn my_recipes(&self, token: &str) -> Result<Vec<RecipeListItem>, ApiError> {
        self.request(Method::GET, "/recipes/me", None::<&()>, Some(token))
            .await
    }

    /// `GET /recipes/:id`
    pub async fn get_recipe(&self, id: i64) -> Result<RecipeDetail, ApiError> {
        let path = format!("/recipes/{}", id);
        self.request(Method::GET, &path, None::<&()>, None).await
    }

    /// `POST /recipes`
    pub async fn create_recipe(&self, token: &str, recipe: &NewRecipe) -> Result<RecipeDetail, ApiError> {
        self.request(Method::POST, "/recipes", Some(recipe), Some(token))
            .await
    }

    /// `POST /recipes/:id/rate` - returns the recipe with its updated average.
    pub async fn rate_recipe(
        &self,
        token: &str,
        id: i64,
        rating: RateRequest,
    ) -> Result<RecipeDetail, ApiError> {
        let path = format!("/recipes/{}/rate", id);
        self.request(Method::POST, &path, Some(&rating), Some(token))
            .await
    }
}
