use super::backend::{Backend, MediaLookup};
use super::error::ApiError;
use super::session::{AuthScheme, Credentials, Session};
use super::types::{
    Category, CurrentUser, Media, MediaId, MediaUpload, Post, PostId, PostPayload, PostStatus,
    TokenGrant,
};
use crate::util::{is_local_host, validate_base_url};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024; // 10MB
const CATEGORIES_PER_PAGE: u32 = 100;

/// Tunables for the HTTP layer.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Budget for one request, including reading the body.
    pub timeout: Duration,
    /// Bodies larger than this are rejected.
    pub max_response_bytes: usize,
    /// Posts requested per listing (WordPress caps this at 100).
    pub per_page: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            per_page: 100,
        }
    }
}

/// Create a redirect policy with loop detection and limited hops.
///
/// Credentials ride on every request, so redirects are kept short and
/// logged.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

// ============================================================================
// Unauthenticated Client
// ============================================================================

/// HTTP handle rooted at a site's `/wp-json/` prefix.
///
/// Without a session it can only acquire and validate tokens. Cloning is
/// cheap (the underlying connection pool is shared).
#[derive(Clone)]
pub struct WpClient {
    http: reqwest::Client,
    api_root: Url,
    options: ClientOptions,
}

impl std::fmt::Debug for WpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WpClient")
            .field("api_root", &self.api_root.as_str())
            .field("options", &self.options)
            .finish()
    }
}

impl WpClient {
    /// Build a client for the WordPress site at `base_url`.
    ///
    /// `base_url` is the site root (`https://blog.example.com` or
    /// `http://localhost/wp`); the `/wp-json/` prefix is appended here.
    pub fn new(base_url: &str, options: ClientOptions) -> Result<Self, ApiError> {
        let base =
            validate_base_url(base_url).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        if base.scheme() == "http" && !is_local_host(&base) {
            tracing::warn!(
                base_url = %base,
                "Credentials will be sent over plain HTTP to a non-local host"
            );
        }

        let mut root = base;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let api_root = root
            .join("wp-json/")
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .user_agent(concat!("pressroom/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(api_root = %api_root, "REST client ready");

        Ok(Self {
            http,
            api_root,
            options,
        })
    }

    /// The `/wp-json/` URL every endpoint is resolved against.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .api_root
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a request and decode the JSON body.
    ///
    /// The timeout covers both the response headers and the body read.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let secs = self.options.timeout.as_secs();
        let limit = self.options.max_response_bytes;

        tokio::time::timeout(self.options.timeout, async move {
            let response = request.send().await?;
            let status = response.status();
            let bytes = read_limited_bytes(response, limit).await?;

            if !status.is_success() {
                return Err(ApiError::from_status(status, &bytes));
            }

            serde_json::from_slice(&bytes).map_err(|e| ApiError::Malformed(e.to_string()))
        })
        .await
        .map_err(|_| ApiError::Timeout(secs))?
    }

    fn json_body<T: Serialize>(request: RequestBuilder, body: &T) -> Result<RequestBuilder, ApiError> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(request.header(CONTENT_TYPE, "application/json").body(bytes))
    }

    /// Exchange credentials for a JWT.
    pub async fn acquire_token(&self, credentials: &Credentials) -> Result<TokenGrant, ApiError> {
        #[derive(Serialize)]
        struct TokenRequest<'a> {
            username: &'a str,
            password: &'a str,
        }

        let url = self.endpoint("jwt-auth/v1/token", &[])?;
        let request = Self::json_body(
            self.http.post(url),
            &TokenRequest {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            },
        )?;

        let grant: TokenGrant = self.execute(request).await?;
        if grant.token.is_empty() {
            return Err(ApiError::Malformed("token endpoint returned an empty token".into()));
        }
        tracing::debug!(user = %credentials.username, "Token acquired");
        Ok(grant)
    }

    /// Ask the backend whether a token is still accepted.
    pub async fn validate_token(&self, token: &SecretString) -> Result<(), ApiError> {
        #[derive(Deserialize)]
        struct ValidateResponse {
            #[serde(default)]
            code: String,
        }

        let url = self.endpoint("jwt-auth/v1/token/validate", &[])?;
        let request = self.http.post(url).bearer_auth(token.expose_secret());
        let response: ValidateResponse = self.execute(request).await?;

        if response.code == "jwt_auth_valid_token" {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(format!(
                "token validation returned '{}'",
                response.code
            )))
        }
    }

    /// Authenticate and return a handle that owns the new session.
    ///
    /// - `Jwt`: acquire a token, then validate it before use.
    /// - `Basic`: probe `/wp/v2/users/me` with the credentials.
    pub async fn login(
        &self,
        credentials: &Credentials,
        scheme: AuthScheme,
    ) -> Result<WpApi, ApiError> {
        let session = match scheme {
            AuthScheme::Jwt => {
                let grant = self.acquire_token(credentials).await?;
                let token = SecretString::from(grant.token);
                self.validate_token(&token).await?;
                let user = grant
                    .user_display_name
                    .or(grant.user_nicename)
                    .unwrap_or_else(|| credentials.username.clone());
                Session::bearer(user, token)
            }
            AuthScheme::Basic => {
                let session = Session::basic(credentials);
                let url = self.endpoint("wp/v2/users/me", &[("context", "edit".into())])?;
                let me: CurrentUser = self
                    .execute(session.authorize(self.http.get(url)))
                    .await?;
                tracing::debug!(user_id = me.id, slug = %me.slug, "Basic credentials accepted");
                if me.name.is_empty() {
                    session
                } else {
                    session.with_user(me.name)
                }
            }
        };

        tracing::info!(
            user = %session.user(),
            scheme = scheme.name(),
            "Logged in"
        );

        Ok(WpApi {
            client: self.clone(),
            session,
        })
    }
}

// ============================================================================
// Authenticated API
// ============================================================================

/// Authenticated handle: a [`WpClient`] plus the [`Session`] it owns.
#[derive(Debug)]
pub struct WpApi {
    client: WpClient,
    session: Session,
}

impl WpApi {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &WpClient {
        &self.client
    }

    /// End the session. The returned client can log in again.
    pub fn logout(self) -> WpClient {
        tracing::info!(user = %self.session.user(), "Logged out");
        self.client
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.session
            .authorize(self.client.http.request(method, url))
    }
}

#[async_trait]
impl MediaLookup for WpApi {
    async fn get_media(&self, media_id: MediaId) -> Result<Media, ApiError> {
        let url = self
            .client
            .endpoint(&format!("wp/v2/media/{}", media_id), &[])?;
        self.client.execute(self.request(Method::GET, url)).await
    }
}

#[async_trait]
impl Backend for WpApi {
    async fn list_posts(&self, statuses: &[PostStatus]) -> Result<Vec<Post>, ApiError> {
        let status = statuses
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = self.client.endpoint(
            "wp/v2/posts",
            &[
                ("status", status),
                ("context", "edit".into()),
                ("per_page", self.client.options.per_page.to_string()),
            ],
        )?;

        let posts: Vec<Post> = self.client.execute(self.request(Method::GET, url)).await?;
        tracing::debug!(count = posts.len(), "Listed posts");
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Result<Post, ApiError> {
        let url = self
            .client
            .endpoint(&format!("wp/v2/posts/{}", id), &[("context", "edit".into())])?;
        self.client.execute(self.request(Method::GET, url)).await
    }

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, ApiError> {
        let url = self.client.endpoint("wp/v2/posts", &[])?;
        let request = WpClient::json_body(self.request(Method::POST, url), payload)?;
        let post: Post = self.client.execute(request).await?;
        tracing::info!(post_id = post.id, status = %post.status, "Post created");
        Ok(post)
    }

    async fn update_post(&self, id: PostId, payload: &PostPayload) -> Result<Post, ApiError> {
        let url = self.client.endpoint(&format!("wp/v2/posts/{}", id), &[])?;
        let request = WpClient::json_body(self.request(Method::PUT, url), payload)?;
        let post: Post = self.client.execute(request).await?;
        tracing::info!(post_id = post.id, status = %post.status, "Post updated");
        Ok(post)
    }

    async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        #[derive(Deserialize)]
        struct DeleteResponse {
            #[serde(default)]
            deleted: bool,
        }

        let url = self
            .client
            .endpoint(&format!("wp/v2/posts/{}", id), &[("force", "true".into())])?;
        let response: DeleteResponse = self
            .client
            .execute(self.request(Method::DELETE, url))
            .await?;

        if !response.deleted {
            return Err(ApiError::Malformed(format!(
                "backend did not confirm deletion of post {}",
                id
            )));
        }
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let url = self.client.endpoint(
            "wp/v2/categories",
            &[("per_page", CATEGORIES_PER_PAGE.to_string())],
        )?;
        self.client.execute(self.request(Method::GET, url)).await
    }

    async fn upload_media(&self, upload: MediaUpload) -> Result<Media, ApiError> {
        let MediaUpload {
            file_name,
            mime_type,
            bytes,
            alt_text,
        } = upload;
        let size = bytes.len();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime_type)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("alt_text", alt_text);

        let url = self.client.endpoint("wp/v2/media", &[])?;
        let media: Media = self
            .client
            .execute(self.request(Method::POST, url).multipart(form))
            .await?;

        tracing::info!(
            media_id = media.id,
            file = %file_name,
            bytes = size,
            "Media uploaded"
        );
        Ok(media)
    }
}

/// Read a response body, failing once it grows past `limit`.
async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
