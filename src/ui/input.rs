//! Input handling for the TUI.
//!
//! Keys are resolved through the keybinding registry for the topmost layer
//! (help, confirmation, form, post table). In the form, keys without a
//! binding are typed into the focused field.

use crate::app::{App, AppEvent, ConfirmAction, FormState};
use crate::forms::PostForm;
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::util::validate_url_for_open;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{spawn_delete, spawn_form_load, spawn_refresh, spawn_submit, LOADING_POST};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let context = app.input_context();
    let action = app.keybindings.action_for_key(code, modifiers, context);

    match context {
        KbContext::Help => Ok(handle_help_input(app, action)),
        KbContext::Confirm => {
            handle_confirm_input(app, action, event_tx);
            Ok(Action::Continue)
        }
        KbContext::Form => {
            handle_form_input(app, code, modifiers, action, event_tx);
            Ok(Action::Continue)
        }
        KbContext::Global => handle_table_input(app, action, event_tx),
    }
}

/// Handle input while the help overlay is visible.
///
/// j/k scroll; anything bound to Quit still quits.
fn handle_help_input(app: &mut App, action: Option<KbAction>) -> Action {
    match action {
        Some(KbAction::Quit) => return Action::Quit,
        Some(KbAction::Back) => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        Some(KbAction::NavDown) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        Some(KbAction::NavUp) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

fn handle_table_input(
    app: &mut App,
    action: Option<KbAction>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match action {
        Some(KbAction::Quit) => return Ok(Action::Quit),
        Some(KbAction::NavDown) => app.nav_down(),
        Some(KbAction::NavUp) => app.nav_up(),
        Some(KbAction::NavFirst) => app.nav_first(),
        Some(KbAction::NavLast) => app.nav_last(),
        Some(KbAction::Refresh) => {
            spawn_refresh(app, event_tx);
            app.set_status("Refreshing posts...");
        }
        Some(KbAction::AddPost) => {
            // The new form takes over from a pending edit-form load
            if app.form_request.take().is_some() {
                app.finish_loading(LOADING_POST);
            }
            app.form = Some(FormState::new(PostForm::create()));
        }
        Some(KbAction::EditPost) => {
            if let Some(post_id) = app.selected_post().map(|p| p.id) {
                spawn_form_load(app, post_id, event_tx);
            }
        }
        Some(KbAction::DeletePost) => {
            if let Some(post) = app.selected_post() {
                let confirm = ConfirmAction::DeletePost {
                    post_id: post.id,
                    title: post.title_text().into_owned(),
                };
                if app.confirm_delete {
                    app.pending_confirm = Some(confirm);
                } else {
                    run_confirmed(app, confirm, event_tx);
                }
            }
        }
        Some(KbAction::OpenInBrowser) => {
            if let Some(post) = app.selected_post() {
                match post.link.clone() {
                    // Validate before open::that() so non-web links never reach the shell
                    Some(link) => match validate_url_for_open(&link) {
                        Err(e) => app.set_status(e),
                        Ok(url) => match open::that(url.as_str()) {
                            Ok(()) => app.set_status(format!("Opening {}...", url)),
                            Err(e) => app.set_status(format!("Failed to open browser: {}", e)),
                        },
                    },
                    None => app.set_status("Post has no link"),
                }
            }
        }
        Some(KbAction::ShowHelp) => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        Some(KbAction::Back) => {
            // Cancel a pending edit-form load
            if app.form_request.take().is_some() {
                app.finish_loading(LOADING_POST);
                app.set_status("Cancelled");
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

fn handle_confirm_input(
    app: &mut App,
    action: Option<KbAction>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match action {
        Some(KbAction::Confirm) => {
            if let Some(confirm) = app.pending_confirm.take() {
                run_confirmed(app, confirm, event_tx);
            }
        }
        Some(KbAction::Deny) => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
}

fn run_confirmed(app: &mut App, confirm: ConfirmAction, event_tx: &mpsc::Sender<AppEvent>) {
    match confirm {
        ConfirmAction::DeletePost { post_id, title } => {
            app.set_status(format!("Deleting \"{}\"...", title));
            spawn_delete(app, post_id, title, event_tx);
        }
    }
}

fn handle_form_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    action: Option<KbAction>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(state) = app.form.as_mut() else {
        return;
    };

    match action {
        // A save in flight still completes; its result no longer targets this form
        Some(KbAction::Back) => {
            app.form = None;
            app.set_status("Cancelled");
        }
        Some(KbAction::NextField) => state.form.focus_next(),
        Some(KbAction::PrevField) => state.form.focus_prev(),
        Some(KbAction::PickNext) => {
            state.form.cycle_focused(&app.categories, true);
        }
        Some(KbAction::PickPrev) => {
            state.form.cycle_focused(&app.categories, false);
        }
        Some(KbAction::Submit) => {
            if state.is_submitting() {
                return;
            }
            match state.form.validate() {
                Ok(draft) => {
                    state.error = None;
                    let mode = state.form.mode;
                    let submit_id = app.next_submit_id();
                    if let Some(state) = app.form.as_mut() {
                        state.submitting = Some(submit_id);
                    }
                    spawn_submit(app, submit_id, mode, draft, event_tx);
                }
                Err(e) => state.error = Some(e.to_string()),
            }
        }
        Some(_) => {}
        None => {
            if state.is_submitting() {
                return;
            }
            match code {
                KeyCode::Char(c)
                    if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    state.form.insert_char(c)
                }
                KeyCode::Enter => state.form.insert_newline(),
                KeyCode::Backspace => state.form.backspace(),
                _ => {}
            }
        }
    }
}
