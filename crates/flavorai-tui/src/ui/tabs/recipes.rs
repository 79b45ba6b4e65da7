//! Recipe list with a detail panel. Shared by "All recipes" and "My recipes".

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use flavorai_core::models::{RecipeDetail, RecipeListItem};

use crate::app::{App, AppState, Focus, Page, Remote};
use crate::ui::styles;
use crate::utils::{pluralize, truncate_string};

/// Width of the title column in the list
const TITLE_COLUMN_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let list_area = if app.page == Page::AllRecipes {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(chunks[0]);
        render_search_bar(frame, app, rows[0]);
        rows[1]
    } else {
        chunks[0]
    };

    render_list(frame, app, list_area);
    render_detail(frame, app, chunks[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching;
    let line = if searching {
        Line::from(vec![
            Span::styled(" / ", styles::search_style()),
            Span::raw(app.search_query.clone()),
            Span::styled("▌", styles::search_style()),
        ])
    } else if let Some(ref query) = app.active_search {
        Line::from(vec![
            Span::styled(" / ", styles::search_style()),
            Span::raw(query.clone()),
            Span::styled("   [Esc] clear", styles::muted_style()),
        ])
    } else {
        Line::from(Span::styled(
            " Press / to search by title or description",
            styles::muted_style(),
        ))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn list_source(app: &App) -> (&Remote<Vec<RecipeListItem>>, &'static str) {
    match app.page {
        Page::MyRecipes => (&app.my_recipes, "My recipes"),
        _ => (&app.recipes, "Recipes"),
    }
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let (remote, label) = list_source(app);
    let focused = app.focus == Focus::List && app.state != AppState::Searching;
    let selection = app.current_selection();

    let title = if remote.loading {
        format!(" {} (loading...) ", label)
    } else {
        format!(" {} ({}) ", label, remote.data.len())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if let Some(ref error) = remote.error {
        let lines = vec![
            Line::from(Span::styled(format!(" {}", error), styles::error_style())),
            Line::from(""),
            Line::from(Span::styled(" Press r to try again", styles::muted_style())),
        ];
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
        return;
    }

    if remote.data.is_empty() && !remote.loading {
        let message = match (app.page, &app.active_search) {
            (Page::MyRecipes, _) => " You have not added any recipes yet. Press 3 to add one.".to_string(),
            (_, Some(query)) => format!(" No recipes match \"{}\"", query),
            _ => " No recipes yet".to_string(),
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style())))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = remote
        .data
        .iter()
        .enumerate()
        .map(|(i, recipe)| {
            let style = if i == selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let line = Line::from(vec![
                Span::raw(format!(
                    " {:<width$} ",
                    truncate_string(&recipe.title, TITLE_COLUMN_WIDTH),
                    width = TITLE_COLUMN_WIDTH
                )),
                Span::styled(recipe.rating_display(), styles::rating_style()),
            ]);
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let (title, lines) = match (&app.detail.data, app.detail_id) {
        (Some(recipe), _) => (format!(" {} ", recipe.title), detail_lines(app, recipe)),
        (None, Some(_)) if app.detail.loading => (
            " Recipe ".to_string(),
            vec![Line::from(Span::styled("Loading recipe...", styles::muted_style()))],
        ),
        (None, Some(_)) => (
            " Recipe ".to_string(),
            vec![Line::from(Span::styled(
                app.detail.error.clone().unwrap_or_else(|| "Recipe not found".to_string()),
                styles::error_style(),
            ))],
        ),
        (None, None) => {
            let hint = match app.selected_recipe() {
                Some(recipe) => {
                    let mut lines = vec![Line::from(Span::styled(
                        recipe.title.clone(),
                        styles::title_style(),
                    ))];
                    if let Some(ref description) = recipe.description {
                        lines.push(Line::from(""));
                        lines.push(Line::from(description.clone()));
                    }
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "Press Enter to open the full recipe",
                        styles::muted_style(),
                    )));
                    lines
                }
                None => vec![Line::from(Span::styled(
                    "Select a recipe from the list",
                    styles::muted_style(),
                ))],
            };
            (" Recipe ".to_string(), hint)
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(block.title(title).title_style(styles::title_style()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn detail_lines(app: &App, recipe: &RecipeDetail) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(recipe.rating_display(), styles::rating_style()),
        Span::styled(
            match recipe.cuisine.as_deref() {
                Some(cuisine) if !cuisine.is_empty() => format!("  ·  {}", cuisine),
                _ => String::new(),
            },
            styles::muted_style(),
        ),
    ])];

    if let Some(email) = recipe.author_email() {
        lines.push(Line::from(Span::styled(format!("by {}", email), styles::muted_style())));
    }
    if let Some(ref description) = recipe.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.clone()));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Ingredients", styles::highlight_style())));
    lines.extend(recipe.ingredients.lines().map(|l| Line::from(format!("  {}", l))));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Instructions", styles::highlight_style())));
    lines.extend(recipe.instructions.lines().map(|l| Line::from(format!("  {}", l))));

    lines.push(Line::from(""));
    if app.rating_in_progress {
        lines.push(Line::from(Span::styled("Saving your rating...", styles::muted_style())));
    } else if app.is_authenticated() {
        lines.push(Line::from(vec![
            Span::styled("Rate this recipe: ", styles::muted_style()),
            Span::styled("1-5", styles::help_key_style()),
            Span::styled(
                format!(" ({})", pluralize(recipe.ratings_count as usize, "rating")),
                styles::muted_style(),
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "Log in with l to rate this recipe",
            styles::muted_style(),
        )));
    }
    if let Some(ref error) = app.rating_error {
        lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
    }

    lines
}
