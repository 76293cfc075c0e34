//! Financial forecast endpoint (`/forecast`).

use serde::Serialize;

use crate::models::ForecastResult;

use super::client::ApiClient;
use super::ApiError;

impl ApiClient {
    /// Run a forecast with the given scenario parameters.
    pub async fn run_forecast<P: Serialize + ?Sized>(
        &self,
        parameters: &P,
    ) -> Result<ForecastResult, ApiError> {
        self.post("/forecast/run", parameters).await?.deserialize()
    }
}
