use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::models::{RegisterRequest, TokenResponse, User, UserUpdate};

/// `/users` operations.
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Create an account. A duplicate email yields `ApiError::Conflict`
    /// (or `ValidationFailed`, depending on the backend version).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<User, ApiError> {
        let body = RegisterRequest {
            email,
            password,
            username: username.filter(|u| !u.trim().is_empty()),
        };
        let req = self
            .client
            .request(Method::POST, "/users/register", &[])?
            .json(&body);
        self.client.send_json(req).await
    }

    /// Exchange credentials for a bearer token.
    ///
    /// The backend follows the OAuth2 password form: the email goes in the
    /// `username` field and the body is form-encoded.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", email)
            .append_pair("password", password)
            .finish();
        let req = self
            .client
            .request(Method::POST, "/users/login", &[])?
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form);
        self.client.send_json(req).await
    }

    /// Profile of the token holder.
    pub async fn me(&self) -> Result<User, ApiError> {
        let req = self.client.request(Method::GET, "/users/me", &[])?;
        self.client.send_json(req).await
    }

    pub async fn update_me(&self, update: &UserUpdate) -> Result<User, ApiError> {
        let req = self
            .client
            .request(Method::PUT, "/users/me", &[])?
            .json(update);
        self.client.send_json(req).await
    }
}
