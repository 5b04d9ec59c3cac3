//! Featured image aggregation for the post list.
//!
//! Every post in a listing gets exactly one display image URL. Posts that
//! reference media are resolved concurrently; posts without a reference and
//! lookups that fail get the placeholder. Failures never reach the caller.
//!
//! The concurrency shape lives in [`settle_all`]: run independent futures
//! together, wait for all of them, keep every outcome. The placeholder policy
//! is applied afterwards in [`resolve_featured_images`].

use crate::api::{MediaId, MediaLookup, Post, PostId};
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;

/// Post id -> image URL shown for that post.
pub type FeaturedImages = HashMap<PostId, String>;

/// Outcome of one job passed to [`settle_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T, E> {
    Resolved(T),
    Failed(E),
    /// No job was supplied for this key.
    Skipped,
}

/// Run every job concurrently and wait until all of them have settled.
///
/// A failing job does not cancel or delay the others. The returned vector
/// preserves input order, regardless of completion order.
pub async fn settle_all<K, T, E, Fut, I>(jobs: I) -> Vec<(K, Settled<T, E>)>
where
    I: IntoIterator<Item = (K, Option<Fut>)>,
    Fut: Future<Output = Result<T, E>>,
{
    join_all(jobs.into_iter().map(|(key, job)| async move {
        let outcome = match job {
            Some(job) => match job.await {
                Ok(value) => Settled::Resolved(value),
                Err(error) => Settled::Failed(error),
            },
            None => Settled::Skipped,
        };
        (key, outcome)
    }))
    .await
}

/// Resolve the display image for every post.
///
/// - `featured_media > 0`: one lookup; its `source_url` on success, the
///   placeholder on any failure
/// - anything else: the placeholder, without a lookup
///
/// The result has one entry per distinct post id. When an id appears twice,
/// the later post in `posts` wins.
pub async fn resolve_featured_images<L>(lookup: &L, posts: &[Post], placeholder: &str) -> FeaturedImages
where
    L: MediaLookup + ?Sized,
{
    if posts.is_empty() {
        return FeaturedImages::new();
    }

    let jobs = posts.iter().map(|post| {
        let media_id = post.media_ref();
        ((post.id, media_id), media_id.map(|id| lookup.get_media(id)))
    });

    let settled = settle_all(jobs).await;

    let mut images = FeaturedImages::with_capacity(settled.len());
    let mut failed = 0usize;
    for ((post_id, media_id), outcome) in settled {
        let url = match outcome {
            Settled::Resolved(media) if !media.source_url.is_empty() => media.source_url,
            Settled::Resolved(_) => {
                failed += 1;
                tracing::debug!(post_id, media_id = ?media_id, "Media record has no source URL");
                placeholder.to_string()
            }
            Settled::Failed(error) => {
                failed += 1;
                log_lookup_failure(post_id, media_id, &error);
                placeholder.to_string()
            }
            Settled::Skipped => placeholder.to_string(),
        };
        images.insert(post_id, url);
    }

    tracing::debug!(
        posts = posts.len(),
        resolved = images.len(),
        failed,
        "Featured images aggregated"
    );

    images
}

/// Resolve a single post's image with the same placeholder policy.
pub async fn resolve_featured_image<L>(lookup: &L, post: &Post, placeholder: &str) -> String
where
    L: MediaLookup + ?Sized,
{
    resolve_featured_images(lookup, std::slice::from_ref(post), placeholder)
        .await
        .remove(&post.id)
        .unwrap_or_else(|| placeholder.to_string())
}

fn log_lookup_failure(post_id: PostId, media_id: Option<MediaId>, error: &crate::api::ApiError) {
    tracing::warn!(
        post_id,
        media_id = ?media_id,
        kind = error.kind(),
        error = %error,
        "Featured image lookup failed, using placeholder"
    );
}
