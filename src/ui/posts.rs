use crate::api::{Post, PostStatus};
use crate::app::App;
use crate::util::{single_line, strip_control_chars, truncate_to_width};
use chrono::NaiveDateTime;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

const COLUMN_WIDTHS: [Constraint; 6] = [
    Constraint::Length(6),
    Constraint::Percentage(32),
    Constraint::Length(8),
    Constraint::Percentage(16),
    Constraint::Min(20),
    Constraint::Length(16),
];

/// Color used for a status in the table and the form.
pub(super) fn status_color(status: PostStatus) -> Color {
    match status {
        PostStatus::Publish => Color::Green,
        PostStatus::Draft => Color::Yellow,
        PostStatus::Trash => Color::Red,
        PostStatus::Pending | PostStatus::Future => Color::Cyan,
        PostStatus::Private | PostStatus::Other => Color::Gray,
    }
}

/// Modified date as shown in the table.
pub(super) fn format_modified(modified: Option<NaiveDateTime>) -> String {
    modified
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Backend text made safe and compact for a single table cell.
fn cell_text(raw: &str, width: usize) -> String {
    let clean = strip_control_chars(raw);
    let line = single_line(&clean);
    truncate_to_width(&line, width).into_owned()
}

fn post_row<'a>(app: &'a App, post: &'a Post, title_width: usize, url_width: usize) -> Row<'a> {
    let title = post.title_text();
    let title = if title.trim().is_empty() {
        "(no title)".to_string()
    } else {
        cell_text(&title, title_width)
    };

    Row::new(vec![
        Cell::from(post.id.to_string()),
        Cell::from(title),
        Cell::from(Span::styled(
            post.status.as_str(),
            Style::default().fg(status_color(post.status)),
        )),
        Cell::from(cell_text(app.category_name(post), 24)),
        Cell::from(Span::styled(
            cell_text(app.image_url(post), url_width),
            Style::default().fg(Color::DarkGray),
        )),
        Cell::from(format_modified(post.modified)),
    ])
}

/// Render the post table
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Posts ({}) - {} @ {} ", app.posts.len(), app.user, app.site);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if app.posts.is_empty() {
        let text = if app.is_loading() {
            "Loading..."
        } else {
            "No posts. Press 'a' to add one, 'r' to reload."
        };
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    // Rough column budgets for truncation; ratatui clips the rest
    let inner = area.width.saturating_sub(2) as usize;
    let title_width = (inner * 32 / 100).max(8);
    let url_width = inner.saturating_sub(title_width + 6 + 8 + inner * 16 / 100 + 16 + 5).max(10);

    let rows: Vec<Row> = app
        .posts
        .iter()
        .map(|post| post_row(app, post, title_width, url_width))
        .collect();

    let header = Row::new(vec![
        "ID",
        "Title",
        "Status",
        "Category",
        "Featured image",
        "Modified",
    ])
    .style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::UNDERLINED),
    );

    let table = Table::new(rows, COLUMN_WIDTHS)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol(Line::from("> "));

    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}
