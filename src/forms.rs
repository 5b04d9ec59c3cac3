//! Post form state and the create/update submitters.
//!
//! A submission runs in three steps: upload the image (if one was chosen),
//! assemble the payload, send one write request. Any failure stops the
//! remaining steps and is returned to the caller as a [`SubmitError`].

use crate::aggregate::resolve_featured_image;
use crate::api::{
    ApiError, Backend, CategoryId, CategoryIndex, MediaId, MediaUpload, Post, PostId, PostPayload,
    PostStatus,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest image accepted for upload (20 MB).
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

const CREATE_ALT_TEXT: &str = "Featured Image of Post";
const UPDATE_ALT_TEXT: &str = "New Featured Image";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Cannot read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image {} is {size} bytes (max 20 MB)", path.display())]
    ImageTooLarge { path: PathBuf, size: u64 },

    #[error("Image upload failed: {0}")]
    Upload(#[source] ApiError),

    #[error("Saving post failed: {0}")]
    Write(#[source] ApiError),
}

// ============================================================================
// Form State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { post_id: PostId },
}

impl FormMode {
    fn alt_text(self) -> &'static str {
        match self {
            Self::Create => CREATE_ALT_TEXT,
            Self::Edit { .. } => UPDATE_ALT_TEXT,
        }
    }
}

/// Form fields in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Category,
    Content,
    Image,
    Status,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::Category,
        FormField::Content,
        FormField::Image,
        FormField::Status,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Category => "Category",
            Self::Content => "Content",
            Self::Image => "Featured image",
            Self::Status => "Status",
        }
    }

    /// Fields edited by typing (the others are pickers).
    pub fn is_text(self) -> bool {
        matches!(self, Self::Title | Self::Content | Self::Image)
    }
}

/// Values entered in the add/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct PostForm {
    pub mode: FormMode,
    pub title: String,
    pub category: Option<CategoryId>,
    pub content: String,
    pub status: Option<PostStatus>,
    /// Path of a new image to upload. Empty means "no new image".
    pub image_path: String,
    pub focus: FormField,
    /// Image currently attached to the post (edit mode).
    pub preview_url: Option<String>,
}

impl PostForm {
    /// Empty form for a new post.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            category: None,
            content: String::new(),
            status: None,
            image_path: String::new(),
            focus: FormField::Title,
            preview_url: None,
        }
    }

    /// Form prefilled from an existing post.
    ///
    /// Statuses the form cannot set (trash, pending, ...) start unselected.
    pub fn edit(post: &Post, preview_url: Option<String>) -> Self {
        Self {
            mode: FormMode::Edit { post_id: post.id },
            title: post.title_text().into_owned(),
            category: post.category(),
            content: post.content.text().into_owned(),
            status: Some(post.status).filter(|s| s.is_editable()),
            image_path: String::new(),
            focus: FormField::Title,
            preview_url,
        }
    }

    pub fn heading(&self) -> String {
        match self.mode {
            FormMode::Create => "Add Post".to_string(),
            FormMode::Edit { post_id } => format!("Edit Post #{}", post_id),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Content => Some(&mut self.content),
            FormField::Image => Some(&mut self.image_path),
            FormField::Category | FormField::Status => None,
        }
    }

    /// Type a character into the focused text field.
    pub fn insert_char(&mut self, c: char) {
        if c == '\n' || c == '\r' {
            self.insert_newline();
            return;
        }
        if let Some(text) = self.focused_text_mut() {
            text.push(c);
        }
    }

    /// Newlines are only meaningful in the content body.
    pub fn insert_newline(&mut self) {
        if self.focus == FormField::Content {
            self.content.push('\n');
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text_mut() {
            text.pop();
        }
    }

    /// Step the category picker through `categories` (ordered by id).
    pub fn cycle_category(&mut self, categories: &CategoryIndex, forward: bool) {
        let ids: Vec<CategoryId> = categories.keys().copied().collect();
        self.category = cycle(&ids, self.category, forward);
    }

    pub fn cycle_status(&mut self, forward: bool) {
        self.status = cycle(&PostStatus::EDITABLE, self.status, forward);
    }

    /// Cycle the picker under focus. Returns false when focus is on a text field.
    pub fn cycle_focused(&mut self, categories: &CategoryIndex, forward: bool) -> bool {
        match self.focus {
            FormField::Category => self.cycle_category(categories, forward),
            FormField::Status => self.cycle_status(forward),
            _ => return false,
        }
        true
    }

    /// Check required fields and produce the values to submit.
    pub fn validate(&self) -> Result<PostDraft, SubmitError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(SubmitError::MissingField("Title"));
        }
        let category = self.category.ok_or(SubmitError::MissingField("Category"))?;
        let status = self.status.ok_or(SubmitError::MissingField("Status"))?;

        let image_path = self.image_path.trim();
        let image = (!image_path.is_empty()).then(|| expand_home(image_path));

        Ok(PostDraft {
            title: title.to_string(),
            content: self.content.clone(),
            category,
            status,
            image,
        })
    }
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: Option<T>, forward: bool) -> Option<T> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let next = match current.and_then(|c| options.iter().position(|o| *o == c)) {
        Some(idx) if forward => (idx + 1) % len,
        Some(idx) => (idx + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    Some(options[next])
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Validated form values, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: CategoryId,
    pub status: PostStatus,
    pub image: Option<PathBuf>,
}

impl PostDraft {
    pub fn payload(&self, featured_media: Option<MediaId>) -> PostPayload {
        PostPayload {
            title: self.title.clone(),
            content: self.content.clone(),
            categories: vec![self.category],
            status: self.status,
            featured_media,
        }
    }
}

// ============================================================================
// Submitters
// ============================================================================

/// Create or update a post from a validated draft.
///
/// Without a new image no upload happens and `featured_media` is left out of
/// the payload, so an update keeps the post's current image.
pub async fn submit<B>(backend: &B, mode: FormMode, draft: &PostDraft) -> Result<Post, SubmitError>
where
    B: Backend + ?Sized,
{
    let featured_media = match &draft.image {
        Some(path) => {
            let upload = read_image(path, mode.alt_text()).await?;
            let media = backend.upload_media(upload).await.map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Featured image upload failed");
                SubmitError::Upload(e)
            })?;
            Some(media.id)
        }
        None => None,
    };

    let payload = draft.payload(featured_media);
    let result = match mode {
        FormMode::Create => backend.create_post(&payload).await,
        FormMode::Edit { post_id } => backend.update_post(post_id, &payload).await,
    };

    result.map_err(|e| {
        tracing::warn!(mode = ?mode, kind = e.kind(), error = %e, "Post write failed");
        SubmitError::Write(e)
    })
}

/// Read an image from disk for upload, enforcing [`MAX_IMAGE_BYTES`].
pub async fn read_image(path: &Path, alt_text: &str) -> Result<MediaUpload, SubmitError> {
    let read_error = |source| SubmitError::ImageRead {
        path: path.to_path_buf(),
        source,
    };

    let meta = tokio::fs::metadata(path).await.map_err(read_error)?;
    if meta.len() > MAX_IMAGE_BYTES {
        return Err(SubmitError::ImageTooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
        });
    }
    let bytes = tokio::fs::read(path).await.map_err(read_error)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Ok(MediaUpload {
        mime_type: guess_mime(path),
        file_name,
        bytes,
        alt_text: alt_text.to_string(),
    })
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Fetch a post and build an edit form for it.
///
/// The preview image goes through the same placeholder policy as the list.
pub async fn load_for_edit<B>(
    backend: &B,
    post_id: PostId,
    placeholder: &str,
) -> Result<PostForm, ApiError>
where
    B: Backend + ?Sized,
{
    let post = backend.get_post(post_id).await?;
    let preview = resolve_featured_image(backend, &post, placeholder).await;
    Ok(PostForm::edit(&post, Some(preview)))
}
