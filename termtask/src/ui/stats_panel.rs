//! Stats row rendering: totals, progress, and recent-activity numbers.

use chrono::Utc;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::App;
use crate::tasks::view::TaskStats;

/// Render the stats row above the task list.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let stats = TaskStats::compute(&app.snapshot.tasks, Utc::now());

    let counts = Line::from(vec![
        Span::styled(format!(" {} total", stats.total), theme::bold()),
        Span::styled("  |  ", theme::dimmed()),
        Span::styled(format!("{} active", stats.active), theme::normal()),
        Span::styled("  |  ", theme::dimmed()),
        Span::styled(
            format!("{} done", stats.completed),
            theme::normal().fg(theme::SUCCESS),
        ),
        Span::styled("  |  ", theme::dimmed()),
        Span::styled(format!("{}%", stats.progress_percent), theme::bold()),
        Span::styled(" complete", theme::dimmed()),
    ]);

    let activity = Line::from(vec![
        Span::styled(
            format!(" today {}/{}", stats.completed_today, stats.created_today),
            theme::dimmed(),
        ),
        Span::styled("  |  ", theme::dimmed()),
        Span::styled(format!("7d rate {}%", stats.week_rate), theme::dimmed()),
        Span::styled("  |  ", theme::dimmed()),
        Span::styled(
            format!("{} active days", stats.active_days),
            theme::dimmed(),
        ),
    ]);

    let block = Block::default()
        .title(Span::styled(
            " Overview ",
            theme::panel_title(theme::STATS_TITLE),
        ))
        .borders(Borders::ALL);

    let paragraph = Paragraph::new(vec![counts, activity]).block(block);
    frame.render_widget(paragraph, area);
}
