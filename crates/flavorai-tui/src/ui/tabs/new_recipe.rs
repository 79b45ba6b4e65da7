use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FormField};
use crate::ui::styles;

fn label(field: FormField) -> &'static str {
    match field {
        FormField::Title => "Title *",
        FormField::Description => "Description",
        FormField::Ingredients => "Ingredients * (one per line)",
        FormField::Instructions => "Instructions *",
        FormField::Cuisine => "Cuisine",
        FormField::Submit => "",
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let outer = Block::default()
        .title(" Add a recipe ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::muted_style());
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Title
            Constraint::Length(3),      // Description
            Constraint::Percentage(40), // Ingredients
            Constraint::Min(4),         // Instructions
            Constraint::Length(3),      // Cuisine
            Constraint::Length(2),      // Submit + error
        ])
        .split(inner);

    let fields = [
        FormField::Title,
        FormField::Description,
        FormField::Ingredients,
        FormField::Instructions,
        FormField::Cuisine,
    ];
    for (field, chunk) in fields.iter().zip(chunks.iter()) {
        render_field(frame, app, *field, *chunk);
    }
    render_submit(frame, app, chunks[5]);
}

fn render_field(frame: &mut Frame, app: &App, field: FormField, area: Rect) {
    let focused = app.form.focus == field;
    let value = app.form.field(field);

    let mut lines: Vec<Line> = value.split('\n').map(|l| Line::from(l.to_string())).collect();
    if focused {
        if let Some(last) = lines.last_mut() {
            last.push_span(Span::styled("▌", styles::search_style()));
        }
    }

    // Keep the cursor line in view for long multi-line fields
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible.max(1)) as u16;

    let block = Block::default()
        .title(format!(" {} ", label(field)))
        .title_style(if focused {
            styles::title_style()
        } else {
            styles::muted_style()
        })
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_submit(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.form.focus == FormField::Submit;
    let label = if app.form.submitting {
        " Saving... "
    } else if focused {
        " ▶ Save recipe ◀ "
    } else {
        "   Save recipe   "
    };
    let button_style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let mut spans = vec![
        Span::raw(" ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ];
    if let Some(ref error) = app.form.error {
        spans.push(Span::styled(format!("  {}", error), styles::error_style()));
    } else {
        spans.push(Span::styled(
            "  Fields marked * are required",
            styles::muted_style(),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
