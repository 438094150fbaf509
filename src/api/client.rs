use reqwest::redirect::Policy;
use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::{extract_detail, ApiError};
use super::{Admin, Articles, Users};
use crate::session::SessionStore;

/// Typed gateway to the backend REST API.
///
/// The only component that performs network I/O. Every request picks up the
/// current bearer token from the [`SessionStore`] at send time, and a `401`
/// from any endpoint clears the held credential before the error is returned.
///
/// Cloning is cheap: the connection pool and the store are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: Arc<SessionStore>,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client for `base` (a validated versioned REST root).
    pub fn new(
        base: Url,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ainews/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::limited(3))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            session,
            timeout,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn articles(&self) -> Articles<'_> {
        Articles::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn admin(&self) -> Admin<'_> {
        Admin::new(self)
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// Absolute URL for `path` (which starts with `/`) under the base root.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let joined = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::Transport(format!("invalid request URL '{joined}': {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.request(method, self.endpoint(path, query)?))
    }

    /// Send a request and decode a JSON success body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(&e, self.timeout))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Attach the credential, send, and normalize the outcome.
    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let sent = self.session.token();
        let builder = match &sent {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };
        let request = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build request: {e}")))?;

        let method = request.method().clone();
        let path = request.url().path().to_string();
        let authenticated = request
            .headers()
            .contains_key(reqwest::header::AUTHORIZATION);

        let response = self.http.execute(request).await.map_err(|e| {
            let err = ApiError::from_transport(&e, self.timeout);
            tracing::debug!(%method, path = %path, error = %err, "API request failed");
            err
        })?;

        let status = response.status();
        tracing::debug!(
            %method,
            path = %path,
            status = status.as_u16(),
            authenticated,
            "API response"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), extract_detail(&body));

        if err.is_unauthorized() {
            tracing::warn!(path = %path, "Backend rejected the credential, clearing local session");
            if let Err(e) = self.session.invalidate_credentials(sent.as_ref()).await {
                tracing::warn!(error = %e, "Failed to clear persisted credential");
            }
        }

        Err(err)
    }
}
