//! Add/edit post overlay.

use crate::app::{App, FormState};
use crate::forms::{FormField, PostForm};
use crate::util::strip_control_chars;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::helpers::centered_rect;
use super::posts::status_color;

const LABEL_WIDTH: usize = 10;
/// Content lines shown before the field is cut off.
const CONTENT_PREVIEW_LINES: usize = 6;

/// Display text for a field's current value.
///
/// Text loaded from the site may carry terminal escapes; they are stripped
/// here and kept in the form itself.
fn field_value(form: &PostForm, field: FormField, app: &App) -> String {
    match field {
        FormField::Title => strip_control_chars(&form.title).into_owned(),
        FormField::Content => strip_control_chars(&form.content).into_owned(),
        FormField::Image => strip_control_chars(&form.image_path).into_owned(),
        FormField::Category => match form.category {
            Some(id) => app
                .categories
                .get(&id)
                .map(|name| strip_control_chars(name).into_owned())
                .unwrap_or_else(|| format!("#{}", id)),
            None => "(none)".to_string(),
        },
        FormField::Status => form
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "(choose)".to_string()),
    }
}

fn field_lines<'a>(form: &PostForm, field: FormField, app: &App) -> Vec<Line<'a>> {
    let focused = form.focus == field;
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let marker = if focused { "> " } else { "  " };
    let label = format!("{}{:<width$}", marker, field.label(), width = LABEL_WIDTH);

    let value = field_value(form, field, app);
    let value_style = match field {
        FormField::Status => form
            .status
            .map(|s| Style::default().fg(status_color(s)))
            .unwrap_or_default(),
        _ => Style::default(),
    };

    if field.is_text() {
        let cursor = if focused { "_" } else { "" };
        let mut lines: Vec<&str> = value.split('\n').collect();
        let clipped = lines.len() > CONTENT_PREVIEW_LINES;
        // Keep the tail visible so the cursor line shows while typing
        if clipped {
            lines.drain(..lines.len() - CONTENT_PREVIEW_LINES);
        }
        let last = lines.len().saturating_sub(1);
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let head = if i == 0 {
                    Span::styled(label.clone(), label_style)
                } else {
                    Span::raw(" ".repeat(LABEL_WIDTH + 2))
                };
                let mut spans = vec![head, Span::styled(text.to_string(), value_style)];
                if i == last {
                    spans.push(Span::raw(cursor));
                }
                Line::from(spans)
            })
            .collect()
    } else {
        let shown = if focused {
            format!("< {} >", value)
        } else {
            value
        };
        vec![Line::from(vec![
            Span::styled(label, label_style),
            Span::styled(shown, value_style),
        ])]
    }
}

/// Render the form overlay on top of the post table.
pub fn render(f: &mut Frame, app: &App, state: &FormState) {
    let overlay = centered_rect(76, 24, f.area());
    if overlay.width < 30 || overlay.height < 10 {
        return;
    }
    f.render_widget(Clear, overlay);

    let form = &state.form;
    let mut lines: Vec<Line> = Vec::new();

    for field in FormField::ALL {
        lines.extend(field_lines(form, field, app));
        if field == FormField::Image {
            if let Some(ref url) = form.preview_url {
                lines.push(Line::from(Span::styled(
                    format!("{}current: {}", " ".repeat(LABEL_WIDTH + 2), url),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    if let Some(ref error) = state.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if state.is_submitting() {
        lines.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(Span::styled(
        "[Tab] next field  [Left/Right] choose  [Ctrl+s] save  [Esc] cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", form.heading())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, overlay);
}
