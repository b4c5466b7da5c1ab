//! Create/edit task overlay rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::theme;
use crate::app::{App, TaskField};

/// Render the task form overlay (assumes `app.task_form` is `Some`).
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(form) = &app.task_form else {
        return;
    };

    let title = if form.editing.is_some() {
        " Edit task "
    } else {
        " New task "
    };

    let mut lines = vec![
        Line::from(""),
        field_line("Title", &form.title, form.field == TaskField::Title),
        field_line(
            "Description",
            &form.description,
            form.field == TaskField::Description,
        ),
        Line::from(""),
    ];

    if let Some(error) = &app.form_error {
        lines.push(Line::styled(format!("  {error}"), theme::error()));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::styled(
        "  Enter: save | Tab: next field | Esc: cancel",
        theme::dimmed(),
    ));

    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    // Clear whatever the overlay covers so the board doesn't bleed through.
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One labeled input line; the focused field gets a cursor marker.
fn field_line<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    let label_style = if focused {
        theme::highlighted()
    } else {
        theme::dimmed()
    };

    let mut spans = vec![
        Span::styled(marker, label_style),
        Span::styled(format!("{label:12}"), label_style),
        Span::styled(value.to_string(), theme::normal()),
    ];
    if focused {
        spans.push(Span::styled("\u{2588}", theme::input_cursor()));
    }
    Line::from(spans)
}
