//! Render functions for the TUI.
//!
//! The post table fills the screen; the form, confirmation and help
//! overlays are drawn on top of it.

use crate::app::{App, ConfirmAction};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::helpers::centered_rect;
use super::{form, help, posts, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    posts::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);

    if let Some(ref state) = app.form {
        form::render(f, app, state);
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, confirm);
    }

    if app.show_help {
        help::render(f, app);
    }
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::DeletePost { post_id, title } => format!(
            "Delete post #{} \"{}\"?\n\nIt is removed permanently, not moved to trash.\n\n(y) Confirm  (n/Esc) Cancel",
            post_id, title
        ),
    };

    let overlay = centered_rect(56, 9, f.area());
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, overlay);
}
