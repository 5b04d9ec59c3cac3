use crate::aggregate::FeaturedImages;
use crate::api::{Backend, CategoryIndex, Post, PostId, PostStatus};
use crate::config::Config;
use crate::forms::{FormMode, PostForm};
use crate::keybindings::{Context as KbContext, KeybindingRegistry};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long a status bar message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Shown in the category column when a post has none (or an unknown one).
pub const NO_CATEGORY: &str = "No Category";

// ============================================================================
// Dialog State
// ============================================================================

/// Pending confirmation action for destructive operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    DeletePost { post_id: PostId, title: String },
}

/// The add/edit overlay.
#[derive(Debug, Clone)]
pub struct FormState {
    pub form: PostForm,
    /// Last validation or submission error, shown inside the form.
    pub error: Option<String>,
    /// Id of the submit in flight; further submits are ignored until it
    /// reports back.
    pub submitting: Option<u64>,
}

impl FormState {
    pub fn new(form: PostForm) -> Self {
        Self {
            form,
            error: None,
            submitting: None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }
}

// ============================================================================
// Background Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    /// Post listing plus resolved featured images.
    ///
    /// `generation` identifies the refresh that produced it; stale results are
    /// dropped.
    PostsLoaded {
        generation: u64,
        result: Result<(Vec<Post>, FeaturedImages), String>,
    },
    CategoriesLoaded(Result<CategoryIndex, String>),
    /// A post fetched for the edit form.
    FormLoaded {
        post_id: PostId,
        result: Result<PostForm, String>,
    },
    /// Outcome of a create or update.
    ///
    /// `submit_id` identifies the form that sent it; a result for a form that
    /// was cancelled meanwhile must not touch whatever form is open now.
    Submitted {
        submit_id: u64,
        mode: FormMode,
        result: Result<Post, String>,
    },
    Deleted {
        post_id: PostId,
        title: String,
        result: Result<(), String>,
    },
    /// A background task panicked.
    ///
    /// - `task`: Name of the task that panicked (e.g., "refresh", "submit")
    /// - `error`: The panic message extracted from the panic payload
    /// - `loading`: Loading label the task registered, if any
    TaskPanicked {
        task: &'static str,
        loading: Option<&'static str>,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub backend: Arc<dyn Backend>,
    pub keybindings: KeybindingRegistry,

    // Settings
    pub placeholder: Arc<str>,
    pub statuses: Arc<[PostStatus]>,
    pub confirm_delete: bool,
    /// Logged-in user and site, for the title bar.
    pub user: String,
    pub site: String,

    // Data
    pub posts: Vec<Post>,
    pub categories: CategoryIndex,
    pub featured_images: FeaturedImages,

    // UI State
    pub selected: usize,
    pub form: Option<FormState>,
    /// Post whose edit form is being fetched.
    pub form_request: Option<PostId>,
    pub pending_confirm: Option<ConfirmAction>,
    pub show_help: bool,
    pub help_scroll_offset: usize,

    /// Labels of the operations in flight, oldest first. The newest is shown
    /// with a spinner in the status bar.
    pub loading: Vec<&'static str>,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,

    /// Source of [`FormState::submitting`] ids.
    pub submit_counter: u64,

    /// Incremented for each refresh; see [`AppEvent::PostsLoaded`].
    pub refresh_generation: u64,
    /// Handle to the in-flight refresh, aborted when a new one starts.
    pub refresh_handle: Option<tokio::task::JoinHandle<()>>,

    /// Status message with the time it was set
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, config: &Config, user: String) -> Self {
        Self {
            backend,
            keybindings: KeybindingRegistry::new(),
            placeholder: Arc::from(config.placeholder_image_url.as_str()),
            statuses: Arc::from(config.statuses.as_slice()),
            confirm_delete: config.confirm_delete,
            user,
            site: config.base_url.clone(),
            posts: Vec::new(),
            categories: CategoryIndex::new(),
            featured_images: FeaturedImages::new(),
            selected: 0,
            form: None,
            form_request: None,
            pending_confirm: None,
            show_help: false,
            help_scroll_offset: 0,
            loading: Vec::new(),
            submit_counter: 0,
            spinner_frame: 0,
            refresh_generation: 0,
            refresh_handle: None,
            status_message: None,
            needs_redraw: true,
        }
    }

    /// Keybinding context for the topmost layer of the UI.
    pub fn input_context(&self) -> KbContext {
        if self.show_help {
            KbContext::Help
        } else if self.pending_confirm.is_some() {
            KbContext::Confirm
        } else if self.form.is_some() {
            KbContext::Form
        } else {
            KbContext::Global
        }
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts.get(self.selected)
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn nav_down(&mut self) {
        if self.selected + 1 < self.posts.len() {
            self.selected += 1;
        }
    }

    pub fn nav_first(&mut self) {
        self.selected = 0;
    }

    pub fn nav_last(&mut self) {
        self.selected = self.posts.len().saturating_sub(1);
    }

    /// Replace the listing, keeping the cursor on the same post when it survives.
    pub fn set_posts(&mut self, posts: Vec<Post>, images: FeaturedImages) {
        let current = self.selected_post().map(|p| p.id);
        self.posts = posts;
        self.featured_images = images;
        self.selected = current
            .and_then(|id| self.posts.iter().position(|p| p.id == id))
            .unwrap_or(self.selected);
        self.clamp_selection();
    }

    /// Drop a deleted post from the listing without waiting for a refresh.
    pub fn remove_post(&mut self, post_id: PostId) {
        self.posts.retain(|p| p.id != post_id);
        self.featured_images.remove(&post_id);
        self.clamp_selection();
    }

    pub fn clamp_selection(&mut self) {
        if self.posts.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.posts.len() {
            self.selected = self.posts.len() - 1;
        }
    }

    /// Display name of the post's category.
    pub fn category_name(&self, post: &Post) -> &str {
        post.category()
            .and_then(|id| self.categories.get(&id))
            .map(String::as_str)
            .unwrap_or(NO_CATEGORY)
    }

    /// Featured image URL for the table; placeholder until resolved.
    pub fn image_url(&self, post: &Post) -> &str {
        self.featured_images
            .get(&post.id)
            .map(String::as_str)
            .unwrap_or(&self.placeholder)
    }

    /// Register an operation in flight under `label`.
    pub fn start_loading(&mut self, label: &'static str) {
        self.loading.push(label);
    }

    /// Drop one registration of `label`; other operations keep their spinner.
    pub fn finish_loading(&mut self, label: &'static str) {
        if let Some(idx) = self.loading.iter().rposition(|l| *l == label) {
            self.loading.remove(idx);
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Label shown next to the spinner.
    pub fn loading_label(&self) -> Option<&'static str> {
        self.loading.last().copied()
    }

    /// Next id for a submit from the open form.
    pub fn next_submit_id(&mut self) -> u64 {
        self.submit_counter = self.submit_counter.wrapping_add(1);
        self.submit_counter
    }

    /// Set status message (expires after a few seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

/// Abort in-flight work when the UI exits.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_handle.take() {
            handle.abort();
            tracing::debug!("Aborted refresh task on App drop");
        }
    }
}
