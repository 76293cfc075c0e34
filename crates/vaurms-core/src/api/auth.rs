//! Login, token refresh, logout and current-user endpoints (`/auth`).

use reqwest::header::{self, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{LoginResponse, RefreshResponse, User};

use super::client::{ApiClient, RequestOptions, NO_PARAMS};
use super::ApiError;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Authenticate and make the returned token the live credential.
    ///
    /// The refresh token is handed back to the caller and not persisted.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let login: LoginResponse = self
            .post("/auth/login", &LoginRequest { email, password })
            .await?
            .deserialize()?;

        self.credentials().set(Some(login.token.clone()));
        info!(user_id = login.user.id, role = login.user.role.as_str(), "Logged in");
        Ok(login)
    }

    /// Exchange a refresh token for a new access token and store it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", refresh_token))
            .map_err(|_| ApiError::InvalidRequest("Refresh token is not a valid header value".into()))?;
        bearer.set_sensitive(true);

        let options = RequestOptions::new(Method::POST)
            .json(serde_json::json!({}))
            .header(header::AUTHORIZATION, bearer);

        let refreshed: RefreshResponse = self
            .request("/auth/refresh", options)
            .await?
            .deserialize()?;

        self.credentials().set(Some(refreshed.token.clone()));
        info!(user_id = refreshed.user.id, "Access token refreshed");
        Ok(refreshed)
    }

    /// Tell the server we are leaving, then drop the local credential.
    ///
    /// The server call is best-effort: its failure is logged and the local
    /// credential is cleared regardless. Never fails.
    pub async fn logout(&self) {
        if self.credentials().is_present() {
            if let Err(e) = self.post("/auth/logout", &serde_json::json!({})).await {
                warn!(error = %e, "Logout request failed, clearing local session anyway");
            }
        }
        self.credentials().clear();
        info!("Logged out");
    }

    /// The user the current credential belongs to.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/auth/me", NO_PARAMS)
            .await?
            .deserialize()
    }
}
