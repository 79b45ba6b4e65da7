use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use flavorai_core::SessionStatus;

use crate::app::{App, AppState, LoginFocus, Page};
use crate::utils::format_age;

use super::styles;
use super::tabs::{new_recipe, recipes};

const LOGO: [&str; 3] = [
    "   ╔═╗╦  ╔═╗╦  ╦╔═╗╦═╗  ╔═╗╦",
    "   ╠╣ ║  ╠═╣╚╗╔╝║ ║╠╦╝  ╠═╣║",
    "   ╚  ╩═╝╩ ╩ ╚╝ ╚═╝╩╚═  ╩ ╩╩",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| Line::from(Span::styled(*row, styles::title_style())))
        .collect()
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  FlavorAI";
    let right = match app.session_status() {
        SessionStatus::Authenticated(session) => {
            format!("{}  [l] Log out  [?] Help", session.identity.email)
        }
        SessionStatus::Anonymous => "[l] Log in  [?] Help".to_string(),
        SessionStatus::Pending => "[?] Help".to_string(),
    };

    let padding = (area.width as usize)
        .saturating_sub(title.len() + right.chars().count() + 2);
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    if app.is_authenticated() {
        let tabs = [Page::AllRecipes, Page::MyRecipes, Page::NewRecipe];
        for (i, page) in tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            spans.push(Span::styled(
                format!("[{}] {}", i + 1, page.title()),
                styles::tab_style(app.page == *page),
            ));
        }
    } else {
        spans.push(Span::styled(
            format!("[1] {}", Page::AllRecipes.title()),
            styles::tab_style(true),
        ));
        if app.session_status() == SessionStatus::Anonymous {
            spans.push(Span::styled(
                "   Log in to add and rate recipes",
                styles::muted_style(),
            ));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.session_status() == SessionStatus::Pending {
        render_splash(frame, area);
        return;
    }

    match app.page {
        Page::AllRecipes | Page::MyRecipes => recipes::render(frame, app, area),
        Page::NewRecipe => new_recipe::render(frame, app, area),
    }
}

fn render_splash(frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from(""); (area.height as usize / 2).saturating_sub(3)];
    lines.extend(logo_lines());
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Loading FlavorAI...", styles::muted_style())));

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.page {
        Page::NewRecipe => "[Tab] next field | [Ctrl+S] save | [Esc] back",
        _ => "[/] search | [r]efresh | [q]uit",
    };

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        let loaded_at = match app.page {
            Page::MyRecipes => app.my_recipes.loaded_at,
            Page::AllRecipes => app.recipes.loaded_at,
            Page::NewRecipe => None,
        };
        match loaded_at {
            Some(at) => format!(" Updated {} ", format_age(at, Utc::now())),
            None => String::new(),
        }
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let left_style = if app.status_message.is_some() {
        styles::success_style()
    } else {
        styles::muted_style()
    };
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_row(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 26, frame.area());
    frame.render_widget(Clear, area);

    let mut help_text = logo_lines();
    help_text.push(Line::from(Span::styled(
        format!("              version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_row("1-3", "Switch page"),
        help_row("←/→", "Previous/next page"),
        help_row("↑/↓", "Navigate list"),
        help_row("Enter", "Open recipe"),
        help_row("Tab", "Switch focus (list ↔ recipe)"),
        help_row("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_row("/", "Search recipes"),
        help_row("1-5", "Rate the open recipe"),
        help_row("r", "Refresh"),
        help_row("l", "Log in / log out"),
        help_row("Ctrl+S", "Save new recipe"),
        help_row("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    // Show the tail of long emails so the cursor stays visible
    let email_chars = app.login_email.chars().count();
    let email_display: String = app
        .login_email
        .chars()
        .skip(email_chars.saturating_sub(24))
        .collect();
    lines.push(field_line(
        "   Email:    [",
        &format!("{:<24}", email_display),
        app.login_focus == LoginFocus::Email,
    ));

    let password_masked = "*".repeat(app.login_password.chars().count().min(24));
    lines.push(field_line(
        "   Password: [",
        &format!("{:<24}", password_masked),
        app.login_focus == LoginFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if app.login_in_progress {
        " Logging in... "
    } else if button_focused {
        "   ▶ Login ◀   "
    } else {
        "     Login     "
    };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" Log in ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(50, 10, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside_small_area() {
        let outer = Rect::new(0, 0, 40, 8);
        let rect = centered_rect_fixed(50, 12, outer);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.height, 8);
    }

    #[test]
    fn test_centered_rect_is_centered() {
        let outer = Rect::new(0, 0, 100, 40);
        let rect = centered_rect_fixed(50, 10, outer);
        assert_eq!((rect.x, rect.y), (25, 15));
    }
}
