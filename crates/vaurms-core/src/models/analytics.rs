use serde::{Deserialize, Serialize};

/// `GET /analytics/kpis`. The `*_change` fields are percentage deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    pub total_revenue: f64,
    /// Percent of billed revenue collected.
    pub collection_rate: f64,
    pub customer_count: u64,
    pub coverage_ratio: f64,
    #[serde(default)]
    pub revenue_change: f64,
    #[serde(default)]
    pub collection_change: f64,
    #[serde(default)]
    pub customer_change: f64,
    #[serde(default)]
    pub coverage_change: f64,
}

/// A labelled series, as returned by `/analytics/trends` and `/analytics/cohorts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

impl Series {
    /// Label/value pairs; extra entries on either side are dropped.
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().copied())
    }
}
