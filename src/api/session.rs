use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// How an authenticated session presents itself to the backend.
///
/// A session uses exactly one scheme for every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// Token from the JWT authentication plugin, sent as `Bearer`.
    #[default]
    Jwt,
    /// Username + application password, sent as HTTP basic auth.
    Basic,
}

impl AuthScheme {
    pub fn name(self) -> &'static str {
        match self {
            Self::Jwt => "jwt",
            Self::Basic => "basic",
        }
    }
}

/// Login credentials. `Debug` never shows the password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

enum SessionAuth {
    Bearer(SecretString),
    Basic {
        username: String,
        password: SecretString,
    },
}

/// Authenticated context created at login and dropped at logout.
///
/// Only [`WpClient::login`](super::WpClient::login) constructs one; the
/// secret material is never exposed outside request signing.
pub struct Session {
    user: String,
    auth: SessionAuth,
}

impl Session {
    pub(crate) fn bearer(user: impl Into<String>, token: SecretString) -> Self {
        Self {
            user: user.into(),
            auth: SessionAuth::Bearer(token),
        }
    }

    pub(crate) fn basic(credentials: &Credentials) -> Self {
        Self {
            user: credentials.username.clone(),
            auth: SessionAuth::Basic {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            },
        }
    }

    pub(crate) fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Display name of the logged-in user.
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn scheme(&self) -> AuthScheme {
        match self.auth {
            SessionAuth::Bearer(_) => AuthScheme::Jwt,
            SessionAuth::Basic { .. } => AuthScheme::Basic,
        }
    }

    /// Attach this session's credentials to a request.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            SessionAuth::Bearer(token) => request.bearer_auth(token.expose_secret()),
            SessionAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("scheme", &self.scheme())
            .finish_non_exhaustive()
    }
}
