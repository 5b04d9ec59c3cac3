//! WordPress REST API client.
//!
//! This module provides everything needed to talk to a WordPress backend:
//!
//! - **Types**: Posts, categories and media records as the REST API returns them
//! - **Session**: The authenticated credential context created at login
//! - **Client**: HTTP plumbing with timeouts, size limits and error mapping
//! - **Backend**: The trait seam used by the UI, the form submitters and the
//!   featured image aggregator
//!
//! # Architecture
//!
//! Authentication is explicit. A [`WpClient`] can only acquire or validate
//! tokens; calling [`WpClient::login`] produces a [`WpApi`] that owns the
//! [`Session`] and is the only type able to issue authenticated calls.
//! [`WpApi::logout`] consumes the handle, dropping the session.
//!
//! # Example
//!
//! ```ignore
//! use pressroom::api::{AuthScheme, Backend, Credentials, WpClient};
//!
//! let client = WpClient::new("http://localhost/wp", Default::default())?;
//! let api = client.login(&credentials, AuthScheme::Jwt).await?;
//! let posts = api.list_posts(&PostStatus::LISTED).await?;
//! ```

mod backend;
mod client;
mod error;
mod session;
mod types;

pub use backend::{Backend, MediaLookup};
pub use client::{ClientOptions, WpApi, WpClient};
pub use error::ApiError;
pub use session::{AuthScheme, Credentials, Session};
pub use types::{
    index_categories, Category, CategoryId, CategoryIndex, CurrentUser, Media, MediaId,
    MediaUpload, Post, PostId, PostPayload, PostStatus, RenderedField, TokenGrant,
};
