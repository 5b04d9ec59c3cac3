use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Key hints for the topmost layer
fn hints(context: Context) -> &'static str {
    match context {
        Context::Global => "[a]dd [e]dit [d]elete [r]efresh [o]pen [?]help [q]uit",
        Context::Form => "[Tab]next field [Ctrl+s]save [Esc]cancel",
        Context::Confirm => "[y]es [n]o",
        Context::Help => "[j/k]scroll [?/Esc]close",
    }
}

fn status_text(app: &App) -> Cow<'_, str> {
    if let Some(label) = app.loading_label() {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        Cow::Owned(format!("{} {}...", frame, label))
    } else if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Borrowed(hints(app.input_context()))
    }
}

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(status_text(app)).style(style), area);
}
