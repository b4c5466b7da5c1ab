//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, BoardFocus, Screen};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    // A store error takes over the whole bar until the next operation.
    if app.screen() == Screen::Board
        && let Some(error) = &app.snapshot.error
    {
        let line = Line::from(vec![
            Span::styled(" Error: ", theme::error()),
            Span::raw(error.clone()),
        ]);
        frame.render_widget(Paragraph::new(line).style(theme::status_bar_bg()), area);
        return;
    }

    let help_text = match app.screen() {
        Screen::Splash => "checking session... | Ctrl-C: quit",
        Screen::Auth => "Enter: submit | Tab: next field | Ctrl-R: switch mode | Esc: quit",
        Screen::Board => {
            if app.task_form.is_some() {
                "Enter: save | Tab: next field | Esc: cancel"
            } else if app.focus == BoardFocus::Search {
                "type to search | Enter/Esc: back to list"
            } else {
                "Space: toggle | n: new | e: edit | d: delete | f: filter | s: sort | /: search | r: refresh | Ctrl-L: logout | q: quit"
            }
        }
    };

    let status_line = Line::from(vec![
        Span::styled("TermTask v0.1.0", theme::bold()),
        Span::raw(" | "),
        Span::styled(help_text, theme::dimmed()),
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
