//! Dashboard analytics endpoints (`/analytics`).

use crate::models::{Kpis, Series};

use super::client::{ApiClient, NO_PARAMS};
use super::ApiError;

impl ApiClient {
    /// Headline KPIs for the active dataset.
    pub async fn kpis(&self) -> Result<Kpis, ApiError> {
        self.get("/analytics/kpis", NO_PARAMS).await?.deserialize()
    }

    /// Monthly trend of `metric` (`revenue` or `consumption`).
    pub async fn trends(&self, metric: &str) -> Result<Series, ApiError> {
        self.get("/analytics/trends", [("metric", metric)])
            .await?
            .deserialize()
    }

    /// Customer breakdown for a customer class (`residential` or `commercial`).
    pub async fn cohorts(&self, customer_class: &str) -> Result<Series, ApiError> {
        self.get("/analytics/cohorts", [("class", customer_class)])
            .await?
            .deserialize()
    }
}
