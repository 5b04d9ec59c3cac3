//! In-memory backend shared by unit tests.

use crate::api::{
    ApiError, Backend, Category, Media, MediaId, MediaLookup, MediaUpload, Post, PostId,
    PostPayload, PostStatus, RenderedField,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A post with the given id and raw `featured_media` value.
pub fn post(id: PostId, featured_media: i64) -> Post {
    Post {
        id,
        title: RenderedField::plain(format!("Post {}", id)),
        content: RenderedField::plain(""),
        status: PostStatus::Publish,
        categories: vec![],
        featured_media: Some(featured_media),
        link: Some(format!("http://localhost/wp/?p={}", id)),
        date: None,
        modified: None,
    }
}

/// Serves fixed posts, categories and media. Writes succeed unless
/// `fail_writes` is set; deletes are recorded.
#[derive(Default)]
pub struct StaticBackend {
    pub posts: Vec<Post>,
    pub categories: Vec<Category>,
    pub media: HashMap<MediaId, String>,
    pub fail_writes: bool,
    pub deleted: Mutex<Vec<PostId>>,
}

#[async_trait]
impl MediaLookup for StaticBackend {
    async fn get_media(&self, media_id: MediaId) -> Result<Media, ApiError> {
        self.media
            .get(&media_id)
            .map(|url| Media {
                id: media_id,
                source_url: url.clone(),
                alt_text: None,
            })
            .ok_or_else(|| ApiError::NotFound(format!("media {}", media_id)))
    }
}

#[async_trait]
impl Backend for StaticBackend {
    async fn list_posts(&self, statuses: &[PostStatus]) -> Result<Vec<Post>, ApiError> {
        Ok(self
            .posts
            .iter()
            .filter(|p| statuses.contains(&p.status))
            .cloned()
            .collect())
    }

    async fn get_post(&self, id: PostId) -> Result<Post, ApiError> {
        self.posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("post {}", id)))
    }

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, ApiError> {
        self.write(1000, payload)
    }

    async fn update_post(&self, id: PostId, payload: &PostPayload) -> Result<Post, ApiError> {
        self.write(id, payload)
    }

    async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        if self.fail_writes {
            return Err(ApiError::Unauthorized("read-only".into()));
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.categories.clone())
    }

    async fn upload_media(&self, _upload: MediaUpload) -> Result<Media, ApiError> {
        Err(ApiError::InvalidRequest("uploads not supported".into()))
    }
}

impl StaticBackend {
    fn write(&self, id: PostId, payload: &PostPayload) -> Result<Post, ApiError> {
        if self.fail_writes {
            return Err(ApiError::Unauthorized("read-only".into()));
        }
        Ok(Post {
            id,
            title: RenderedField::plain(payload.title.clone()),
            content: RenderedField::plain(payload.content.clone()),
            status: payload.status,
            categories: payload.categories.clone(),
            featured_media: payload.featured_media.map(|m| m as i64),
            link: None,
            date: None,
            modified: None,
        })
    }
}
