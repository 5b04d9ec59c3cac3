use super::error::ApiError;
use super::types::{Category, Media, MediaId, MediaUpload, Post, PostId, PostPayload, PostStatus};
use async_trait::async_trait;

/// Resolves a media id to its library record.
///
/// Split from [`Backend`] because the featured image aggregator needs
/// nothing else.
#[async_trait]
pub trait MediaLookup: Send + Sync {
    async fn get_media(&self, media_id: MediaId) -> Result<Media, ApiError>;
}

/// Authenticated operations against the content backend.
#[async_trait]
pub trait Backend: MediaLookup {
    /// Posts in any of the given statuses, newest first.
    async fn list_posts(&self, statuses: &[PostStatus]) -> Result<Vec<Post>, ApiError>;

    async fn get_post(&self, id: PostId) -> Result<Post, ApiError>;

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, ApiError>;

    /// Replace the post's editable fields.
    async fn update_post(&self, id: PostId, payload: &PostPayload) -> Result<Post, ApiError>;

    /// Permanently delete (bypasses the trash).
    async fn delete_post(&self, id: PostId) -> Result<(), ApiError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn upload_media(&self, upload: MediaUpload) -> Result<Media, ApiError>;
}
