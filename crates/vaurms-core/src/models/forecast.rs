use serde::{Deserialize, Serialize};

/// One projected fiscal year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastYear {
    pub year: i32,
    pub revenue: f64,
    pub opex: f64,
    pub capex: f64,
    pub ending_fund: f64,
}

impl ForecastYear {
    /// Revenue left after operating and capital spend.
    pub fn net(&self) -> f64 {
        self.revenue - self.opex - self.capex
    }
}

/// Reply to `POST /forecast/run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast_id: i64,
    pub results: Vec<ForecastYear>,
}
