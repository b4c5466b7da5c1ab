//! Task list rendering with filter/search/sort header.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::theme;
use crate::app::{App, BoardFocus};

/// Render the task panel: query line on top, the list below.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    render_query_line(frame, chunks[0], app);
    render_list(frame, chunks[1], app);
}

/// One line showing the active filter, sort order, and search input.
fn render_query_line(frame: &mut Frame, area: Rect, app: &App) {
    let search_focused = app.focus == BoardFocus::Search;
    let mut spans = vec![
        Span::styled(" filter: ", theme::dimmed()),
        Span::styled(app.query.filter.label(), theme::bold()),
        Span::styled("  sort: ", theme::dimmed()),
        Span::styled(app.query.sort.label(), theme::bold()),
        Span::styled("  search: ", theme::dimmed()),
        Span::styled(
            app.query.search.clone(),
            if search_focused {
                theme::highlighted()
            } else {
                theme::normal()
            },
        ),
    ];
    if search_focused {
        spans.push(Span::styled("\u{2588}", theme::input_cursor()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// The visible task list with checkboxes and busy markers.
fn render_list(frame: &mut Frame, area: Rect, app: &App) {
    let visible = app.visible();

    let items: Vec<ListItem> = visible
        .iter()
        .map(|task| {
            let busy = app.snapshot.pending.contains(&task.id);
            let checkbox = if busy {
                Span::styled("[\u{22ef}]", theme::busy())
            } else if task.is_completed {
                Span::styled("[\u{2713}]", theme::normal().fg(theme::SUCCESS))
            } else {
                Span::styled("[ ]", theme::normal())
            };

            let title_style = if task.is_completed {
                theme::done()
            } else {
                theme::normal()
            };

            let mut spans = vec![
                checkbox,
                Span::raw(" "),
                Span::styled(task.title.as_str(), title_style),
            ];
            if !task.description.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", task.description),
                    theme::dimmed(),
                ));
            }
            spans.push(Span::styled(
                format!("  ({})", task.created_at.format(&app.date_format)),
                theme::dimmed(),
            ));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if app.snapshot.loading {
        " Tasks (loading...) ".to_string()
    } else {
        format!(" Tasks ({}) ", visible.len())
    };

    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(if app.focus == BoardFocus::List {
            theme::highlighted()
        } else {
            theme::normal()
        });

    if items.is_empty() {
        let message = if app.snapshot.loading {
            "loading tasks..."
        } else if app.snapshot.tasks.is_empty() {
            "no tasks yet — press n to add one"
        } else {
            "nothing matches the current filter"
        };
        let paragraph = Paragraph::new(Line::styled(message, theme::dimmed()))
            .centered()
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut state = ListState::default();
    state.select(Some(app.selected));

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected());

    frame.render_stateful_widget(list, area, &mut state);
}
