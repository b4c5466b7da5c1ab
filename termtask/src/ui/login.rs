//! Login / register form rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{centered_rect, theme};
use crate::app::{App, AuthField, AuthMode};

/// Render the centered login/register form.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.auth_form;
    let title = match form.mode {
        AuthMode::Login => " Log in ",
        AuthMode::Register => " Create account ",
    };

    let mut lines = vec![Line::from("")];

    if form.mode == AuthMode::Register {
        lines.push(field_line(
            "Name",
            &form.name,
            form.field == AuthField::Name,
        ));
    }
    lines.push(field_line(
        "Email",
        &form.email,
        form.field == AuthField::Email,
    ));
    lines.push(field_line(
        "Password",
        &"*".repeat(form.password.chars().count()),
        form.field == AuthField::Password,
    ));

    lines.push(Line::from(""));
    if form.submitting {
        lines.push(Line::styled("  signing in...", theme::busy()));
    } else if let Some(error) = &app.form_error {
        lines.push(Line::styled(format!("  {error}"), theme::error()));
    } else {
        lines.push(Line::from(""));
    }

    let switch_hint = match form.mode {
        AuthMode::Login => "  Ctrl-R: create an account instead",
        AuthMode::Register => "  Ctrl-R: log in instead",
    };
    lines.push(Line::styled(switch_hint, theme::dimmed()));

    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, centered_rect(50, 60, area));
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
        Span::styled(format!("{label:9}"), label_style),
        Span::styled(value.to_string(), theme::normal()),
    ];
    if focused {
        spans.push(Span::styled("\u{2588}", theme::input_cursor()));
    }
    Line::from(spans)
}
