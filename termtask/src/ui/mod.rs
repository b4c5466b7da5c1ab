//! Terminal UI rendering.

pub mod login;
pub mod stats_panel;
pub mod status_bar;
pub mod task_form;
pub mod task_panel;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::Paragraph,
};

use crate::app::{App, Screen};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Status bar pinned to the bottom on every screen.
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let content_area = main_chunks[0];
    let status_area = main_chunks[1];

    match app.screen() {
        Screen::Splash => draw_splash(frame, content_area),
        Screen::Auth => login::render(frame, content_area, app),
        Screen::Board => draw_board(frame, content_area, app),
    }

    status_bar::render(frame, status_area, app);
}

/// Neutral screen while the stored session is being verified.
fn draw_splash(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::styled("TermTask", theme::bold()),
        Line::styled("checking session...", theme::dimmed()),
    ];
    let paragraph = Paragraph::new(lines).centered();
    frame.render_widget(paragraph, centered_rect(40, 20, area));
}

/// Task board: stats row on top, task list below, form overlay on top.
fn draw_board(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    stats_panel::render(frame, chunks[0], app);
    task_panel::render(frame, chunks[1], app);

    if app.task_form.is_some() {
        task_form::render(frame, centered_rect(60, 50, area), app);
    }
}

/// A centered sub-rectangle taking the given percentage of the area.
#[must_use]
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
