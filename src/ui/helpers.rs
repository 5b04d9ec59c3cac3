//! Helper functions for UI operations.
//!
//! Background work (listing, loading a post, submitting, deleting) runs in
//! spawned tasks that report back through the `AppEvent` channel.

use crate::aggregate::resolve_featured_images;
use crate::api::{index_categories, PostId};
use crate::app::{App, AppEvent};
use crate::forms::{load_for_edit, submit, FormMode, PostDraft};
use futures::FutureExt;
use ratatui::layout::Rect;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

pub(super) const LOADING_POSTS: &str = "Loading posts";
pub(super) const LOADING_POST: &str = "Loading post";
pub(super) const SAVING_POST: &str = "Saving post";
pub(super) const DELETING_POST: &str = "Deleting post";

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking task would otherwise vanish silently, leaving the UI waiting
/// on an event that never arrives.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Spawn `work` and send the event it produces.
///
/// Panics are reported as `AppEvent::TaskPanicked { task }`, carrying the
/// task's loading label so its spinner can be dropped.
fn spawn_reporting<F>(
    task: &'static str,
    loading: Option<&'static str>,
    tx: &mpsc::Sender<AppEvent>,
    work: F,
) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    loading,
                    error: panic_msg,
                }
            }
        };
        if tx.send(event).await.is_err() {
            tracing::warn!(task, "Channel send failed (receiver dropped)");
        }
    })
}

/// Reload the post list and resolve featured images.
///
/// A refresh already in flight is aborted; its generation is superseded and
/// its loading registration is taken over by the new one.
pub(super) fn spawn_refresh(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    match app.refresh_handle.take() {
        Some(handle) => {
            handle.abort();
            tracing::debug!("Aborted previous refresh task");
        }
        None => app.start_loading(LOADING_POSTS),
    }

    app.refresh_generation = app.refresh_generation.wrapping_add(1);
    let generation = app.refresh_generation;

    let backend = app.backend.clone();
    let statuses = app.statuses.clone();
    let placeholder = app.placeholder.clone();

    tracing::debug!(generation, "Spawning refresh task");

    app.refresh_handle = Some(spawn_reporting("refresh", Some(LOADING_POSTS), tx, async move {
        let result = match backend.list_posts(&statuses).await {
            Ok(posts) => {
                let images = resolve_featured_images(&*backend, &posts, &placeholder).await;
                Ok((posts, images))
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Failed to list posts");
                Err(e.to_string())
            }
        };
        AppEvent::PostsLoaded { generation, result }
    }));
}

/// Load the category index. Done once per session.
pub(super) fn spawn_categories_load(app: &App, tx: &mpsc::Sender<AppEvent>) {
    let backend = app.backend.clone();
    spawn_reporting("categories", None, tx, async move {
        let result = backend
            .list_categories()
            .await
            .map(index_categories)
            .map_err(|e| {
                tracing::warn!(kind = e.kind(), error = %e, "Failed to load categories");
                e.to_string()
            });
        AppEvent::CategoriesLoaded(result)
    });
}

/// Fetch a post for the edit form.
pub(super) fn spawn_form_load(app: &mut App, post_id: PostId, tx: &mpsc::Sender<AppEvent>) {
    // A newer request replaces the pending one and its registration
    if app.form_request.replace(post_id).is_none() {
        app.start_loading(LOADING_POST);
    }

    let backend = app.backend.clone();
    let placeholder = app.placeholder.clone();
    spawn_reporting("load_post", Some(LOADING_POST), tx, async move {
        let result = load_for_edit(&*backend, post_id, &placeholder)
            .await
            .map_err(|e| {
                tracing::warn!(post_id, kind = e.kind(), error = %e, "Failed to load post");
                e.to_string()
            });
        AppEvent::FormLoaded { post_id, result }
    });
}

/// Write a draft. `submit_id` is echoed back in `AppEvent::Submitted`.
pub(super) fn spawn_submit(
    app: &mut App,
    submit_id: u64,
    mode: FormMode,
    draft: PostDraft,
    tx: &mpsc::Sender<AppEvent>,
) {
    app.start_loading(SAVING_POST);

    let backend = app.backend.clone();
    spawn_reporting("submit", Some(SAVING_POST), tx, async move {
        let result = submit(&*backend, mode, &draft)
            .await
            .map_err(|e| e.to_string());
        AppEvent::Submitted {
            submit_id,
            mode,
            result,
        }
    });
}

pub(super) fn spawn_delete(
    app: &mut App,
    post_id: PostId,
    title: String,
    tx: &mpsc::Sender<AppEvent>,
) {
    app.start_loading(DELETING_POST);

    let backend = app.backend.clone();
    spawn_reporting("delete", Some(DELETING_POST), tx, async move {
        let result = backend.delete_post(post_id).await.map_err(|e| {
            tracing::error!(post_id, kind = e.kind(), error = %e, "Failed to delete post");
            e.to_string()
        });
        AppEvent::Deleted {
            post_id,
            title,
            result,
        }
    });
}

/// Rectangle of the given size centered in `area`, clamped to fit.
pub(super) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
