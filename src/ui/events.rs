//! Application event handling.
//!
//! Applies the results of background tasks (listing, form load, submit,
//! delete) to the application state.

use crate::app::{App, AppEvent, FormState};
use crate::forms::FormMode;
use tokio::sync::mpsc;

use super::helpers::{spawn_refresh, DELETING_POST, LOADING_POST, LOADING_POSTS, SAVING_POST};

/// Handle application events from background tasks.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::PostsLoaded { generation, result } => {
            if generation != app.refresh_generation {
                tracing::debug!(
                    generation,
                    current = app.refresh_generation,
                    "Dropping stale post listing"
                );
                return;
            }
            app.refresh_handle = None;
            app.finish_loading(LOADING_POSTS);
            match result {
                Ok((posts, images)) => {
                    tracing::info!(count = posts.len(), "Posts loaded");
                    app.set_posts(posts, images);
                }
                Err(e) => app.set_status(format!("Failed to load posts: {}", e)),
            }
        }
        AppEvent::CategoriesLoaded(result) => match result {
            Ok(categories) => {
                tracing::debug!(count = categories.len(), "Categories loaded");
                app.categories = categories;
            }
            Err(e) => app.set_status(format!("Failed to load categories: {}", e)),
        },
        AppEvent::FormLoaded { post_id, result } => {
            if app.form_request != Some(post_id) {
                tracing::debug!(post_id, "Ignoring post load that is no longer wanted");
                return;
            }
            app.form_request = None;
            app.finish_loading(LOADING_POST);
            if app.form.is_some() {
                // Never replace a form the user is already working in
                tracing::debug!(post_id, "Ignoring post load while a form is open");
                return;
            }
            match result {
                Ok(form) => app.form = Some(FormState::new(form)),
                Err(e) => app.set_status(format!("Failed to load post #{}: {}", post_id, e)),
            }
        }
        AppEvent::Submitted {
            submit_id,
            mode,
            result,
        } => {
            app.finish_loading(SAVING_POST);
            let current = app
                .form
                .as_ref()
                .is_some_and(|state| state.submitting == Some(submit_id));
            match result {
                Ok(post) => {
                    if current {
                        app.form = None;
                    }
                    app.set_status(match mode {
                        FormMode::Create => format!("Post #{} created", post.id),
                        FormMode::Edit { .. } => format!("Post #{} updated", post.id),
                    });
                    spawn_refresh(app, event_tx);
                }
                Err(e) if current => {
                    // Keep the form open so nothing typed is lost
                    if let Some(state) = app.form.as_mut() {
                        state.submitting = None;
                        state.error = Some(e.clone());
                    }
                    app.set_status(e);
                }
                Err(e) => {
                    tracing::debug!(submit_id, "Save failed after its form was closed");
                    app.set_status(format!("Earlier save failed: {}", e));
                }
            }
        }
        AppEvent::Deleted {
            post_id,
            title,
            result,
        } => {
            app.finish_loading(DELETING_POST);
            match result {
                Ok(()) => {
                    app.remove_post(post_id);
                    app.set_status(format!("Deleted \"{}\"", title));
                    spawn_refresh(app, event_tx);
                }
                Err(e) => app.set_status(format!("Failed to delete \"{}\": {}", title, e)),
            }
        }
        AppEvent::TaskPanicked {
            task,
            loading,
            error,
        } => {
            if let Some(label) = loading {
                app.finish_loading(label);
            }
            match task {
                "refresh" => app.refresh_handle = None,
                "load_post" => app.form_request = None,
                "submit" => {
                    if let Some(state) = app.form.as_mut() {
                        state.submitting = None;
                    }
                }
                _ => {}
            }
            app.set_status(format!("Internal error in {}: {}", task, error));
        }
    }
}
