use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bill change for one customer class, in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BillImpact {
    pub avg_increase: f64,
    pub max_increase: f64,
}

/// Reply to `POST /rates/model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateModel {
    /// Keyed by customer class (`residential`, `commercial`, ...).
    pub bill_impacts: BTreeMap<String, BillImpact>,
}

/// One block of a tiered volumetric rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    /// Upper bound of the block. `None` is unbounded (the server sends a
    /// non-finite number for the last tier).
    pub up_to: Option<f64>,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimisedStructure {
    pub fixed_charge: f64,
    pub tiers: Vec<RateTier>,
}

/// Reply to `POST /rates/optimise`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimisationResult {
    #[serde(rename = "optimized_structure")]
    pub structure: OptimisedStructure,
    pub constraints_satisfied: bool,
    pub coverage_ratio: f64,
    pub reserve_balance: f64,
}
