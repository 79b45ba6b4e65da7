//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use flavorai_core::SessionStatus;

use crate::app::{
    can_add_email_char, can_add_password_char, App, AppState, Focus, FormField, LoginFocus, Page,
    PAGE_SCROLL_SIZE,
};

/// Maximum length of the search box
const MAX_SEARCH_LENGTH: usize = 100;

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        handle_login_input(app, key);
        return Ok(false);
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Until the saved session is read back, only help and quit respond
    if app.session_status() == SessionStatus::Pending {
        match key.code {
            KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
            KeyCode::Char('?') => app.state = AppState::ShowingHelp,
            _ => {}
        }
        return Ok(false);
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return Ok(false);
    }

    // Any key acknowledges the last status message
    app.status_message = None;

    // The form captures typing, so it gets keys before the global bindings
    if app.page == Page::NewRecipe {
        handle_form_input(app, key);
        return Ok(false);
    }

    // Rating keys only apply while reading a recipe
    if app.focus == Focus::Detail {
        if let KeyCode::Char(c @ '1'..='5') = key.code {
            if let Some(value) = c.to_digit(10) {
                app.rate_current(value as u8);
            }
            return Ok(false);
        }
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => app.open_page(Page::AllRecipes),
        KeyCode::Char('2') => app.open_page(Page::MyRecipes),
        KeyCode::Char('3') => app.open_page(Page::NewRecipe),
        KeyCode::Left => {
            let page = app.page.prev(app.is_authenticated());
            app.open_page(page);
        }
        KeyCode::Right => {
            let page = app.page.next(app.is_authenticated());
            app.open_page(page);
        }
        KeyCode::Char('l') => {
            if app.is_authenticated() {
                app.logout();
            } else {
                app.start_login(None);
            }
        }
        KeyCode::Char('r') => app.refresh_current_page(),
        KeyCode::Char('/') => {
            if app.page != Page::AllRecipes {
                app.open_page(Page::AllRecipes);
            }
            app.search_query = app.active_search.clone().unwrap_or_default();
            app.state = AppState::Searching;
        }
        // Toggle focus between list and detail panels
        KeyCode::Tab => match app.focus {
            Focus::Detail => app.focus = Focus::List,
            Focus::List if app.detail_id.is_some() => app.focus = Focus::Detail,
            Focus::List => app.open_selected_detail(),
        },
        KeyCode::Esc => {
            if app.focus == Focus::Detail {
                app.focus = Focus::List;
            } else if app.detail_id.is_some() {
                app.close_detail();
            } else if app.page == Page::AllRecipes {
                app.clear_search();
            }
        }
        KeyCode::Enter => app.open_selected_detail(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        _ => {}
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            // Leave the current results alone
            app.state = AppState::Normal;
            app.search_query = app.active_search.clone().unwrap_or_default();
        }
        KeyCode::Enter => app.submit_search(),
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            if app.search_query.chars().count() < MAX_SEARCH_LENGTH && !c.is_control() {
                app.search_query.push(c);
            }
        }
        _ => {}
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    if app.login_in_progress {
        // Only allow backing out while the request is in flight
        if key.code == KeyCode::Esc {
            app.cancel_login();
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.submit_recipe();
        return;
    }

    match key.code {
        KeyCode::Esc => app.open_page(Page::AllRecipes),
        KeyCode::Tab | KeyCode::Down => app.form.focus = app.form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus = app.form.focus.prev(),
        KeyCode::Enter => match app.form.focus {
            FormField::Submit => app.submit_recipe(),
            field if field.is_multiline() => app.form.push_char('\n'),
            _ => app.form.focus = app.form.focus.next(),
        },
        KeyCode::Backspace => app.form.pop_char(),
        KeyCode::Char(c) => app.form.push_char(c),
        _ => {}
    }
}
