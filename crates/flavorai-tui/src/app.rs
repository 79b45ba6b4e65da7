//! Application state management for the FlavorAI terminal client.
//!
//! This module contains the core `App` struct: UI state, the session store,
//! per-page remote data, and the channel background requests report back on.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use flavorai_core::api::{ApiClient, ApiError};
use flavorai_core::config::{Config, StorageBackend};
use flavorai_core::models::{LoginRequest, LoginResponse, NewRecipe, RateRequest, RecipeDetail, RecipeListItem};
use flavorai_core::storage::{DurableStorage, MemoryStorage};
use flavorai_core::{Session, SessionStatus, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for single-line recipe fields (title, cuisine).
const MAX_LINE_FIELD_LENGTH: usize = 200;

/// Maximum length for free-text recipe fields.
const MAX_TEXT_FIELD_LENGTH: usize = 5000;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Shown when rating without a session.
pub const RATE_REQUIRES_LOGIN: &str = "You must be logged in to rate recipes.";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    AllRecipes,
    MyRecipes,
    NewRecipe,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::AllRecipes => "All recipes",
            Page::MyRecipes => "My recipes",
            Page::NewRecipe => "Add recipe",
        }
    }

    /// Pages other than the public list need a logged-in user.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Page::AllRecipes)
    }

    /// Next page (wrapping around), skipping pages the user cannot open.
    pub fn next(&self, authenticated: bool) -> Self {
        if !authenticated {
            return Page::AllRecipes;
        }
        match self {
            Page::AllRecipes => Page::MyRecipes,
            Page::MyRecipes => Page::NewRecipe,
            Page::NewRecipe => Page::AllRecipes,
        }
    }

    /// Previous page (wrapping around), skipping pages the user cannot open.
    pub fn prev(&self, authenticated: bool) -> Self {
        if !authenticated {
            return Page::AllRecipes;
        }
        match self {
            Page::AllRecipes => Page::NewRecipe,
            Page::MyRecipes => Page::AllRecipes,
            Page::NewRecipe => Page::MyRecipes,
        }
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// New-recipe form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Ingredients,
    Instructions,
    Cuisine,
    Submit,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Ingredients,
            FormField::Ingredients => FormField::Instructions,
            FormField::Instructions => FormField::Cuisine,
            FormField::Cuisine => FormField::Submit,
            FormField::Submit => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Submit,
            FormField::Description => FormField::Title,
            FormField::Ingredients => FormField::Description,
            FormField::Instructions => FormField::Ingredients,
            FormField::Cuisine => FormField::Instructions,
            FormField::Submit => FormField::Cuisine,
        }
    }

    /// Free-text fields accept newlines.
    pub fn is_multiline(&self) -> bool {
        matches!(self, FormField::Ingredients | FormField::Instructions)
    }

    fn max_len(&self) -> usize {
        if self.is_multiline() || *self == FormField::Description {
            MAX_TEXT_FIELD_LENGTH
        } else {
            MAX_LINE_FIELD_LENGTH
        }
    }
}

/// Remote data for one page region, with its own loading flag and inline error.
#[derive(Debug, Clone, Default)]
pub struct Remote<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl<T> Remote<T> {
    fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self, result: Result<T, RequestError>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.loaded_at = Some(Utc::now());
            }
            Err(e) => self.error = Some(e.message),
        }
    }
}

/// Contents of the new-recipe form.
#[derive(Debug, Clone)]
pub struct RecipeForm {
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub instructions: String,
    pub cuisine: String,
    pub focus: FormField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            ingredients: String::new(),
            instructions: String::new(),
            cuisine: String::new(),
            focus: FormField::Title,
            error: None,
            submitting: false,
        }
    }
}

impl RecipeForm {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::Ingredients => &self.ingredients,
            FormField::Instructions => &self.instructions,
            FormField::Cuisine => &self.cuisine,
            FormField::Submit => "",
        }
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Ingredients => Some(&mut self.ingredients),
            FormField::Instructions => Some(&mut self.instructions),
            FormField::Cuisine => Some(&mut self.cuisine),
            FormField::Submit => None,
        }
    }

    /// Append a character to the focused field if it fits.
    pub fn push_char(&mut self, c: char) {
        let field = self.focus;
        if let Some(value) = self.field_mut(field) {
            if can_add_form_char(field, value.chars().count(), c) {
                value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        let field = self.focus;
        if let Some(value) = self.field_mut(field) {
            value.pop();
        }
    }

    pub fn to_recipe(&self) -> Result<NewRecipe, flavorai_core::models::ValidationError> {
        NewRecipe::from_form(
            &self.title,
            &self.description,
            &self.ingredients,
            &self.instructions,
            &self.cuisine,
        )
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// A failed request, reduced to what the UI shows.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    pub message: String,
    pub unauthorized: bool,
}

impl From<ApiError> for RequestError {
    fn from(e: ApiError) -> Self {
        Self {
            unauthorized: e.is_unauthorized(),
            message: e.to_string(),
        }
    }
}

/// Results sent from spawned tasks back to the UI loop.
///
/// List and detail results carry the request they answer so that a result
/// for a view the user already left is dropped instead of applied.
#[derive(Debug)]
pub enum BackgroundResult {
    /// Persisted session read back at startup
    SessionRestored(Option<Session>),
    /// `GET /recipes` for the search generation that issued it
    Recipes(u64, Result<Vec<RecipeListItem>, RequestError>),
    /// `GET /recipes/me` for the generation that issued it
    MyRecipes(u64, Result<Vec<RecipeListItem>, RequestError>),
    /// `GET /recipes/:id`
    RecipeDetail(i64, Result<RecipeDetail, RequestError>),
    /// `POST /recipes/:id/rate`
    Rated(i64, Result<RecipeDetail, RequestError>),
    /// `POST /recipes`
    Created(Result<RecipeDetail, RequestError>),
    /// `POST /auth/login` for the attempt that issued it
    LoggedIn(u64, Result<LoginResponse, RequestError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionStore,
    pub api: ApiClient,
    /// Where config changes (last email) are written, if anywhere
    config_path: Option<PathBuf>,

    // UI State
    pub state: AppState,
    pub page: Page,
    pub focus: Focus,
    pub search_query: String,
    /// Search text of the list currently shown, if any
    pub active_search: Option<String>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_in_progress: bool,
    /// Page to open once login succeeds
    after_login: Option<Page>,
    login_attempt: u64,

    // All recipes page
    pub recipes: Remote<Vec<RecipeListItem>>,
    pub recipe_selection: usize,
    recipes_generation: u64,

    // My recipes page
    pub my_recipes: Remote<Vec<RecipeListItem>>,
    pub my_recipes_selection: usize,
    my_recipes_generation: u64,

    // Detail panel (shared by both list pages)
    pub detail: Remote<Option<RecipeDetail>>,
    pub detail_id: Option<i64>,
    pub rating_in_progress: bool,
    pub rating_error: Option<String>,

    // New recipe page
    pub form: RecipeForm,

    // Background task channel
    result_rx: mpsc::Receiver<BackgroundResult>,
    result_tx: mpsc::Sender<BackgroundResult>,

    // Status message
    pub status_message: Option<String>,
}

/// Open the session store for the configured backend. Falls back to
/// in-memory storage when the backend cannot be opened at all.
pub fn open_session_store(config: &Config, ephemeral: bool) -> SessionStore {
    let backend = if ephemeral {
        StorageBackend::Memory
    } else {
        config.storage
    };

    let storage: Arc<dyn DurableStorage> = match Config::open_storage(backend) {
        Ok(storage) => storage,
        Err(e) => {
            warn!(error = %e, ?backend, "Failed to open session storage, session will not persist");
            Arc::new(MemoryStorage::new())
        }
    };
    debug!(storage = %storage.describe(), "Session storage opened");
    SessionStore::new(storage)
}

impl App {
    /// Create a new application instance from the user's config
    pub fn new(ephemeral: bool) -> Result<Self> {
        let (config, config_path) = Config::load_for_update();

        let api_url = config.api_url();
        info!(%api_url, "Using API");
        let api = ApiClient::with_timeout(&api_url, config.request_timeout())?;
        let session = open_session_store(&config, ephemeral);

        let mut app = Self::with_parts(config, session, api);
        app.config_path = config_path;
        Ok(app)
    }

    /// Assemble an app from already-built services.
    pub fn with_parts(config: Config, session: SessionStore, api: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill from env vars or config
        let login_email = std::env::var("FLAVORAI_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let login_password = std::env::var("FLAVORAI_PASSWORD").unwrap_or_default();

        Self {
            config,
            session,
            api,
            config_path: None,

            state: AppState::Normal,
            page: Page::AllRecipes,
            focus: Focus::List,
            search_query: String::new(),
            active_search: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            login_in_progress: false,
            after_login: None,
            login_attempt: 0,

            recipes: Remote::default(),
            recipe_selection: 0,
            recipes_generation: 0,

            my_recipes: Remote::default(),
            my_recipes_selection: 0,
            my_recipes_generation: 0,

            detail: Remote::default(),
            detail_id: None,
            rating_in_progress: false,
            rating_error: None,

            form: RecipeForm::default(),

            result_rx: rx,
            result_tx: tx,

            status_message: None,
        }
    }

    /// Kick off session hydration and the public recipe list.
    pub fn start(&mut self) {
        let storage = self.session.storage();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let restored = SessionStore::restore(storage).await;
            Self::send_result(&tx, BackgroundResult::SessionRestored(restored)).await;
        });

        self.load_recipes();
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn session_status(&self) -> SessionStatus<'_> {
        self.session.status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Show the login overlay. `then` is opened after a successful login.
    pub fn start_login(&mut self, then: Option<Page>) {
        self.state = AppState::LoggingIn;
        self.after_login = then;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Close the login overlay. A request still in flight is abandoned.
    pub fn cancel_login(&mut self) {
        self.state = AppState::Normal;
        self.after_login = None;
        self.login_attempt += 1;
        self.login_in_progress = false;
        self.login_password.clear();
        self.login_error = None;
    }

    /// Submit the login form
    pub fn attempt_login(&mut self) {
        if self.login_in_progress {
            return;
        }
        let Some(request) = LoginRequest::new(&self.login_email, &self.login_password) else {
            self.login_error = Some("Email and password required".to_string());
            return;
        };

        self.login_error = None;
        self.login_in_progress = true;
        self.login_attempt += 1;
        let attempt = self.login_attempt;

        let api = self.api.clone();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = api.login(&request).await.map_err(RequestError::from);
            Self::send_result(&tx, BackgroundResult::LoggedIn(attempt, result)).await;
        });
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.my_recipes = Remote::default();
        self.my_recipes_selection = 0;
        self.my_recipes_generation += 1;
        self.form = RecipeForm::default();
        self.switch_page(Page::AllRecipes);
        self.status_message = Some("Logged out".to_string());
    }

    fn handle_login_result(&mut self, result: Result<LoginResponse, RequestError>) {
        self.login_in_progress = false;
        match result {
            Ok(response) => {
                let email = response.user.email.clone();
                self.session.login_with(response);

                self.config.last_email = Some(email.clone());
                if let Some(ref path) = self.config_path {
                    if let Err(e) = self.config.save_to(path) {
                        warn!(error = %e, "Failed to save config");
                    }
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                self.status_message = Some(format!("Logged in as {}", email));

                let target = self.after_login.take().unwrap_or(self.page);
                self.switch_page(target);
            }
            Err(e) => {
                error!(error = %e.message, "Login failed");
                self.login_error = Some(e.message);
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Open `page`, asking for a login first when it needs a session.
    pub fn open_page(&mut self, page: Page) {
        if page.requires_session() && !self.is_authenticated() {
            self.start_login(Some(page));
            return;
        }
        self.switch_page(page);
    }

    fn switch_page(&mut self, page: Page) {
        let changed = page != self.page;
        self.page = page;
        self.focus = Focus::List;
        if changed {
            self.close_detail();
        }
        if page == Page::MyRecipes && (changed || self.my_recipes.loaded_at.is_none()) {
            self.load_my_recipes();
        }
    }

    /// Recipes shown in the list of the current page
    pub fn current_list(&self) -> &[RecipeListItem] {
        match self.page {
            Page::MyRecipes => &self.my_recipes.data,
            _ => &self.recipes.data,
        }
    }

    pub fn current_selection(&self) -> usize {
        match self.page {
            Page::MyRecipes => self.my_recipes_selection,
            _ => self.recipe_selection,
        }
    }

    fn set_selection(&mut self, index: usize) {
        match self.page {
            Page::MyRecipes => self.my_recipes_selection = index,
            _ => self.recipe_selection = index,
        }
    }

    pub fn selected_recipe(&self) -> Option<&RecipeListItem> {
        self.current_list().get(self.current_selection())
    }

    /// Move the list selection by `delta`, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_list().len();
        if len == 0 {
            return;
        }
        let current = self.current_selection() as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        if next != self.current_selection() {
            self.set_selection(next);
            self.close_detail();
        }
    }

    pub fn select_last(&mut self) {
        let len = self.current_list().len();
        self.set_selection(len.saturating_sub(1));
        self.close_detail();
    }

    pub fn select_first(&mut self) {
        self.set_selection(0);
        self.close_detail();
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    /// Reload the public list with the current search.
    pub fn load_recipes(&mut self) {
        self.recipes_generation += 1;
        let generation = self.recipes_generation;
        self.recipes.start();

        let api = self.api.clone();
        let search = self.active_search.clone();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = api
                .list_recipes(search.as_deref())
                .await
                .map_err(RequestError::from);
            Self::send_result(&tx, BackgroundResult::Recipes(generation, result)).await;
        });
    }

    /// Apply the typed search and reload.
    pub fn submit_search(&mut self) {
        let query = self.search_query.trim().to_string();
        self.active_search = (!query.is_empty()).then_some(query);
        self.state = AppState::Normal;
        self.recipe_selection = 0;
        self.close_detail();
        self.load_recipes();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        if self.active_search.take().is_some() {
            self.recipe_selection = 0;
            self.close_detail();
            self.load_recipes();
        }
    }

    pub fn load_my_recipes(&mut self) {
        let Some(token) = self.session.token().map(str::to_string) else {
            return;
        };
        self.my_recipes_generation += 1;
        let generation = self.my_recipes_generation;
        self.my_recipes.start();

        let api = self.api.clone();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = api.my_recipes(&token).await.map_err(RequestError::from);
            Self::send_result(&tx, BackgroundResult::MyRecipes(generation, result)).await;
        });
    }

    /// Reload whatever the current page shows.
    pub fn refresh_current_page(&mut self) {
        match self.page {
            Page::AllRecipes => self.load_recipes(),
            Page::MyRecipes => self.load_my_recipes(),
            Page::NewRecipe => {}
        }
        if let Some(id) = self.detail_id {
            self.load_detail(id);
        }
    }

    /// Open the detail panel for the selected recipe.
    pub fn open_selected_detail(&mut self) {
        let Some(id) = self.selected_recipe().map(|r| r.id) else {
            return;
        };
        self.focus = Focus::Detail;
        if self.detail_id != Some(id) || self.detail.data.is_none() {
            self.load_detail(id);
        }
    }

    fn load_detail(&mut self, id: i64) {
        self.detail_id = Some(id);
        self.detail.start();
        self.rating_error = None;

        let api = self.api.clone();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = api.get_recipe(id).await.map_err(RequestError::from);
            Self::send_result(&tx, BackgroundResult::RecipeDetail(id, result)).await;
        });
    }

    pub fn close_detail(&mut self) {
        self.detail = Remote::default();
        self.detail_id = None;
        self.rating_in_progress = false;
        self.rating_error = None;
        self.focus = Focus::List;
    }

    /// Rate the recipe in the detail panel.
    pub fn rate_current(&mut self, value: u8) {
        let Some(id) = self.detail.data.as_ref().map(|d| d.id) else {
            return;
        };
        let Some(token) = self.session.token().map(str::to_string) else {
            self.rating_error = Some(RATE_REQUIRES_LOGIN.to_string());
            return;
        };
        if self.rating_in_progress {
            return;
        }
        let rating = match RateRequest::new(value) {
            Ok(rating) => rating,
            Err(e) => {
                self.rating_error = Some(e.to_string());
                return;
            }
        };

        self.rating_in_progress = true;
        self.rating_error = None;

        let api = self.api.clone();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = api
                .rate_recipe(&token, id, rating)
                .await
                .map_err(RequestError::from);
            Self::send_result(&tx, BackgroundResult::Rated(id, result)).await;
        });
    }

    /// Submit the new-recipe form.
    pub fn submit_recipe(&mut self) {
        if self.form.submitting {
            return;
        }
        let Some(token) = self.session.token().map(str::to_string) else {
            self.start_login(Some(Page::NewRecipe));
            return;
        };
        let recipe = match self.form.to_recipe() {
            Ok(recipe) => recipe,
            Err(e) => {
                self.form.error = Some(e.to_string());
                return;
            }
        };

        self.form.error = None;
        self.form.submitting = true;

        let api = self.api.clone();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = api
                .create_recipe(&token, &recipe)
                .await
                .map_err(RequestError::from);
            Self::send_result(&tx, BackgroundResult::Created(result)).await;
        });
    }

    /// Copy a fresh average/count into any list rows for the same recipe.
    fn update_list_ratings(&mut self, recipe: &RecipeDetail) {
        for item in self
            .recipes
            .data
            .iter_mut()
            .chain(self.my_recipes.data.iter_mut())
            .filter(|item| item.id == recipe.id)
        {
            item.average_rating = recipe.average_rating;
            item.ratings_count = recipe.ratings_count;
        }
    }

    fn note_unauthorized(&mut self, e: &RequestError) {
        if e.unauthorized {
            self.status_message =
                Some("The server rejected your session. Press l to log out and in again.".to_string());
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Helper to send results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<BackgroundResult>, result: BackgroundResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send background result - channel closed");
        }
    }

    /// Apply all results that arrived since the last frame.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            self.process_result(result);
        }
    }

    fn process_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::SessionRestored(restored) => {
                if self.session.apply_restored(restored)
                    && self.is_authenticated()
                    && self.state == AppState::LoggingIn
                {
                    self.cancel_login();
                }
            }
            BackgroundResult::Recipes(generation, result) => {
                if generation != self.recipes_generation {
                    debug!(generation, "Dropping superseded recipe list");
                    return;
                }
                self.recipes.finish(result);
                self.recipe_selection = clamp_selection(self.recipe_selection, self.recipes.data.len());
            }
            BackgroundResult::MyRecipes(generation, result) => {
                if generation != self.my_recipes_generation {
                    debug!(generation, "Dropping superseded my-recipes list");
                    return;
                }
                if let Err(ref e) = result {
                    self.note_unauthorized(e);
                }
                self.my_recipes.finish(result);
                self.my_recipes_selection =
                    clamp_selection(self.my_recipes_selection, self.my_recipes.data.len());
            }
            BackgroundResult::RecipeDetail(id, result) => {
                if self.detail_id != Some(id) {
                    debug!(id, "Dropping detail for recipe no longer shown");
                    return;
                }
                self.detail.finish(result.map(Some));
            }
            BackgroundResult::Rated(id, result) => {
                if self.detail_id != Some(id) {
                    debug!(id, "Rating finished for recipe no longer shown");
                    if let Ok(recipe) = result {
                        self.update_list_ratings(&recipe);
                    }
                    return;
                }
                self.rating_in_progress = false;
                match result {
                    Ok(recipe) => {
                        self.update_list_ratings(&recipe);
                        self.detail.data = Some(recipe);
                        self.status_message = Some("Thanks for rating!".to_string());
                    }
                    Err(e) => {
                        self.note_unauthorized(&e);
                        self.rating_error = Some(e.message);
                    }
                }
            }
            BackgroundResult::Created(result) => {
                self.form.submitting = false;
                match result {
                    Ok(recipe) => {
                        info!(id = recipe.id, "Recipe created");
                        self.form = RecipeForm::default();
                        self.status_message = Some(format!("Saved \"{}\"", recipe.title));
                        // Logged out while saving: stay on the public list
                        if self.is_authenticated() {
                            self.open_page(Page::MyRecipes);
                            if !self.my_recipes.loading {
                                self.load_my_recipes();
                            }
                        }
                    }
                    Err(e) => {
                        self.note_unauthorized(&e);
                        self.form.error = Some(e.message);
                    }
                }
            }
            BackgroundResult::LoggedIn(attempt, result) => {
                if attempt != self.login_attempt {
                    debug!(attempt, "Dropping result of cancelled login");
                    return;
                }
                self.handle_login_result(result);
            }
        }
    }
}

fn clamp_selection(selection: usize, len: usize) -> usize {
    selection.min(len.saturating_sub(1))
}

/// Check if a character is valid for text input (printable, non-control)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character can be added to email input
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a character can be added to password input
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a character can be added to a recipe form field
pub fn can_add_form_char(field: FormField, current_len: usize, c: char) -> bool {
    if current_len >= field.max_len() {
        return false;
    }
    if c == '\n' {
        return field.is_multiline();
    }
    is_valid_input_char(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flavorai_core::models::{Author, Identity};

    fn test_app() -> App {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        let api = ApiClient::new("http://127.0.0.1:9").expect("valid URL");
        let mut app = App::with_parts(Config::default(), session, api);
        app.session.apply_restored(None);
        app
    }

    fn logged_in_app() -> App {
        let mut app = test_app();
        app.session.login(
            "token",
            Identity {
                id: 1,
                email: "a@b.com".to_string(),
            },
        );
        app
    }

    fn item(id: i64, title: &str) -> RecipeListItem {
        RecipeListItem {
            id,
            title: title.to_string(),
            description: None,
            cuisine: None,
            average_rating: 0.0,
            ratings_count: 0,
            author: None,
        }
    }

    fn detail(id: i64, average: f64, count: u32) -> RecipeDetail {
        RecipeDetail {
            id,
            title: format!("Recipe {}", id),
            description: None,
            ingredients: "salt".to_string(),
            instructions: "cook".to_string(),
            cuisine: None,
            author: Some(Author {
                id: 1,
                email: "a@b.com".to_string(),
            }),
            average_rating: average,
            ratings_count: count,
        }
    }

    // -------------------------------------------------------------------------
    // Page Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_page_next_prev_authenticated() {
        assert_eq!(Page::AllRecipes.next(true), Page::MyRecipes);
        assert_eq!(Page::MyRecipes.next(true), Page::NewRecipe);
        assert_eq!(Page::NewRecipe.next(true), Page::AllRecipes); // Wraps around
        assert_eq!(Page::AllRecipes.prev(true), Page::NewRecipe);
        assert_eq!(Page::NewRecipe.prev(true), Page::MyRecipes);
    }

    #[test]
    fn test_page_next_prev_anonymous_stays_public() {
        assert_eq!(Page::AllRecipes.next(false), Page::AllRecipes);
        assert_eq!(Page::AllRecipes.prev(false), Page::AllRecipes);
    }

    #[test]
    fn test_form_field_cycle() {
        let mut field = FormField::Title;
        for _ in 0..6 {
            field = field.next();
        }
        assert_eq!(field, FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::Submit);
    }

    // -------------------------------------------------------------------------
    // Session gating
    // -------------------------------------------------------------------------

    #[test]
    fn test_protected_page_opens_login_when_anonymous() {
        let mut app = test_app();
        app.open_page(Page::NewRecipe);
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.page, Page::AllRecipes);
    }

    #[test]
    fn test_new_app_session_is_pending() {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let app = App::with_parts(Config::default(), session, api);
        assert_eq!(app.session_status(), SessionStatus::Pending);
    }

    #[test]
    fn test_session_restored_result_applies() {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut app = App::with_parts(Config::default(), session, api);

        let restored = Session::new(
            "abc",
            Identity {
                id: 1,
                email: "a@b.com".to_string(),
            },
        );
        app.process_result(BackgroundResult::SessionRestored(Some(restored)));
        assert!(app.is_authenticated());
    }

    #[test]
    fn test_restored_session_closes_login_overlay() {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut app = App::with_parts(Config::default(), session, api);

        let key = crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char('3'),
            crossterm::event::KeyModifiers::NONE,
        );
        crate::ui::input::handle_input(&mut app, key).unwrap();
        // Overlay opened some other way before hydration finished
        app.start_login(Some(Page::NewRecipe));

        let restored = Session::new(
            "abc",
            Identity {
                id: 1,
                email: "a@b.com".to_string(),
            },
        );
        app.process_result(BackgroundResult::SessionRestored(Some(restored)));

        assert!(app.is_authenticated());
        assert_ne!(app.state, AppState::LoggingIn);
        assert_eq!(app.page, Page::AllRecipes);
    }

    #[test]
    fn test_restored_anonymous_keeps_login_overlay() {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut app = App::with_parts(Config::default(), session, api);
        app.start_login(None);

        app.process_result(BackgroundResult::SessionRestored(None));
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_cancelled_login_result_is_dropped() {
        let mut app = test_app();
        app.start_login(Some(Page::NewRecipe));
        app.login_email = "c@d.com".to_string();
        app.login_password = "secret".to_string();
        // Stands in for attempt_login without spawning the request
        app.login_in_progress = true;
        app.login_attempt += 1;
        let attempt = app.login_attempt;

        app.cancel_login();
        assert!(!app.login_in_progress);

        app.process_result(BackgroundResult::LoggedIn(
            attempt,
            Ok(LoginResponse {
                access_token: "late".to_string(),
                user: Identity {
                    id: 2,
                    email: "c@d.com".to_string(),
                },
            }),
        ));

        assert!(!app.is_authenticated());
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.page, Page::AllRecipes);
    }

    #[test]
    fn test_created_after_logout_stays_on_public_list() {
        let mut app = test_app();
        app.form.submitting = true;

        app.process_result(BackgroundResult::Created(Ok(detail(9, 0.0, 0))));

        assert_ne!(app.state, AppState::LoggingIn);
        assert_eq!(app.page, Page::AllRecipes);
        assert!(!app.form.submitting);
        assert!(!app.my_recipes.loading);
    }

    #[test]
    fn test_login_saves_last_email_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = test_app();
        app.config_path = Some(path.clone());

        app.start_login(None);
        app.process_result(BackgroundResult::LoggedIn(
            0,
            Ok(LoginResponse {
                access_token: "xyz".to_string(),
                user: Identity {
                    id: 2,
                    email: "c@d.com".to_string(),
                },
            }),
        ));

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.last_email.as_deref(), Some("c@d.com"));
    }

    #[test]
    fn test_login_without_config_path_writes_nothing() {
        let mut app = test_app();
        assert_eq!(app.config_path, None);
        app.start_login(None);
        app.process_result(BackgroundResult::LoggedIn(
            0,
            Ok(LoginResponse {
                access_token: "xyz".to_string(),
                user: Identity {
                    id: 2,
                    email: "c@d.com".to_string(),
                },
            }),
        ));
        assert!(app.is_authenticated());
        assert_eq!(app.config.last_email.as_deref(), Some("c@d.com"));
    }

    #[test]
    fn test_rating_requires_login() {
        let mut app = test_app();
        app.detail_id = Some(3);
        app.detail.data = Some(detail(3, 0.0, 0));

        app.rate_current(4);
        assert_eq!(app.rating_error.as_deref(), Some(RATE_REQUIRES_LOGIN));
        assert!(!app.rating_in_progress);
    }

    #[test]
    fn test_login_result_opens_pending_page() {
        let mut app = test_app();
        app.start_login(Some(Page::NewRecipe));
        app.login_password = "secret".to_string();

        app.process_result(BackgroundResult::LoggedIn(0, Ok(LoginResponse {
            access_token: "xyz".to_string(),
            user: Identity {
                id: 2,
                email: "c@d.com".to_string(),
            },
        })));

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.page, Page::NewRecipe);
        assert_eq!(app.session.token(), Some("xyz"));
        assert!(app.login_password.is_empty());
        assert_eq!(app.config.last_email.as_deref(), Some("c@d.com"));
    }

    #[test]
    fn test_login_failure_shows_message() {
        let mut app = test_app();
        app.start_login(None);
        app.login_in_progress = true;

        app.process_result(BackgroundResult::LoggedIn(0, Err(RequestError {
            message: "Invalid credentials".to_string(),
            unauthorized: true,
        })));

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.login_in_progress);
        assert_eq!(app.login_error.as_deref(), Some("Invalid credentials"));
        assert!(!app.is_authenticated());
    }

    #[test]
    fn test_login_requires_email_and_password() {
        let mut app = test_app();
        app.login_email.clear();
        app.login_password.clear();
        app.attempt_login();
        assert_eq!(app.login_error.as_deref(), Some("Email and password required"));
        assert!(!app.login_in_progress);
    }

    #[test]
    fn test_logout_returns_to_public_list() {
        let mut app = logged_in_app();
        app.page = Page::MyRecipes;
        app.my_recipes.data = vec![item(1, "Mine")];

        app.logout();
        assert_eq!(app.page, Page::AllRecipes);
        assert!(app.my_recipes.data.is_empty());
        assert_eq!(app.session_status(), SessionStatus::Anonymous);
    }

    // -------------------------------------------------------------------------
    // Stale results
    // -------------------------------------------------------------------------

    #[test]
    fn test_superseded_list_result_is_dropped() {
        let mut app = test_app();
        app.recipes_generation = 2;

        app.process_result(BackgroundResult::Recipes(1, Ok(vec![item(1, "Old")])));
        assert!(app.recipes.data.is_empty());

        app.process_result(BackgroundResult::Recipes(2, Ok(vec![item(2, "New")])));
        assert_eq!(app.recipes.data[0].title, "New");
        assert!(app.recipes.loaded_at.is_some());
    }

    #[test]
    fn test_list_error_is_shown_inline() {
        let mut app = test_app();
        app.recipes_generation = 1;
        app.recipes.loading = true;

        app.process_result(BackgroundResult::Recipes(
            1,
            Err(RequestError {
                message: "Request failed with status 500".to_string(),
                unauthorized: false,
            }),
        ));
        assert!(!app.recipes.loading);
        assert_eq!(app.recipes.error.as_deref(), Some("Request failed with status 500"));
    }

    #[test]
    fn test_detail_for_other_recipe_is_dropped() {
        let mut app = test_app();
        app.detail_id = Some(2);

        app.process_result(BackgroundResult::RecipeDetail(1, Ok(detail(1, 0.0, 0))));
        assert!(app.detail.data.is_none());

        app.process_result(BackgroundResult::RecipeDetail(2, Ok(detail(2, 0.0, 0))));
        assert_eq!(app.detail.data.as_ref().map(|d| d.id), Some(2));
    }

    #[test]
    fn test_rating_updates_detail_and_lists() {
        let mut app = logged_in_app();
        app.recipes.data = vec![item(1, "A"), item(2, "B")];
        app.my_recipes.data = vec![item(2, "B")];
        app.detail_id = Some(2);
        app.detail.data = Some(detail(2, 0.0, 0));
        app.rating_in_progress = true;

        app.process_result(BackgroundResult::Rated(2, Ok(detail(2, 4.5, 2))));

        assert!(!app.rating_in_progress);
        assert_eq!(app.detail.data.as_ref().map(|d| d.ratings_count), Some(2));
        assert_eq!(app.recipes.data[1].average_rating, 4.5);
        assert_eq!(app.my_recipes.data[0].ratings_count, 2);
        assert_eq!(app.recipes.data[0].ratings_count, 0);
    }

    #[test]
    fn test_unauthorized_rating_sets_hint() {
        let mut app = logged_in_app();
        app.detail_id = Some(2);
        app.detail.data = Some(detail(2, 0.0, 0));

        app.process_result(BackgroundResult::Rated(
            2,
            Err(RequestError {
                message: "Unauthorized".to_string(),
                unauthorized: true,
            }),
        ));
        assert_eq!(app.rating_error.as_deref(), Some("Unauthorized"));
        assert!(app.status_message.is_some());
        // The session itself is left alone.
        assert!(app.is_authenticated());
    }

    #[test]
    fn test_move_selection_clamps_and_closes_detail() {
        let mut app = test_app();
        app.recipes.data = vec![item(1, "A"), item(2, "B")];
        app.detail_id = Some(1);

        app.move_selection(5);
        assert_eq!(app.recipe_selection, 1);
        assert_eq!(app.detail_id, None);

        app.move_selection(-5);
        assert_eq!(app.recipe_selection, 0);
    }

    // -------------------------------------------------------------------------
    // Form
    // -------------------------------------------------------------------------

    #[test]
    fn test_form_validation_error_shown() {
        let mut app = logged_in_app();
        app.page = Page::NewRecipe;
        app.form.title = "Soup".to_string();

        app.submit_recipe();
        assert_eq!(app.form.error.as_deref(), Some("Ingredients is required"));
        assert!(!app.form.submitting);
    }

    #[test]
    fn test_form_newlines_only_in_multiline_fields() {
        let mut form = RecipeForm::default();
        form.push_char('\n');
        assert!(form.title.is_empty());

        form.focus = FormField::Ingredients;
        form.push_char('a');
        form.push_char('\n');
        form.push_char('b');
        assert_eq!(form.ingredients, "a\nb");

        form.pop_char();
        assert_eq!(form.ingredients, "a\n");
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(253, '@'));
        assert!(!can_add_email_char(254, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
    }

    #[test]
    fn test_can_add_form_char_limits() {
        assert!(can_add_form_char(FormField::Title, 199, 'x'));
        assert!(!can_add_form_char(FormField::Title, 200, 'x'));
        assert!(can_add_form_char(FormField::Instructions, 4999, 'x'));
        assert!(!can_add_form_char(FormField::Cuisine, 0, '\n'));
        assert!(!can_add_form_char(FormField::Title, 0, '\x1b'));
    }
}
