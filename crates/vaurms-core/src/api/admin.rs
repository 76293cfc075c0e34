//! Admin-only endpoints (`/admin`, `/users`). Non-admins get a 403, surfaced
//! as [`ApiError::Application`].

use crate::models::{AuditEntry, Job, NewUser, User};

use super::client::{ApiClient, NO_PARAMS};
use super::ApiError;

impl ApiClient {
    /// The most recent audit entries, newest first.
    pub async fn audit_log(&self) -> Result<Vec<AuditEntry>, ApiError> {
        self.get("/admin/audit", NO_PARAMS).await?.deserialize()
    }

    pub async fn jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.get("/admin/jobs", NO_PARAMS).await?.deserialize()
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/users/", NO_PARAMS).await?.deserialize()
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post("/users/", user).await?.deserialize()
    }
}
