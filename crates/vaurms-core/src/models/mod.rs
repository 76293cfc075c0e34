//! Data models for VAURMS API entities.
//!
//! - `User`, `UserRole`, `NewUser`: accounts
//! - `LoginResponse`, `RefreshResponse`: token-issuing replies
//! - `Dataset`, `DatasetProfile`, `DatasetStatus`: uploaded billing data
//! - `Kpis`, `Series`: dashboard analytics
//! - `RateModel`, `OptimisationResult`: rate design
//! - `ForecastResult`: multi-year financial projection
//! - `AuditEntry`, `Job`: admin views
//! - `ReportExport`: exported report location

pub mod admin;
pub mod analytics;
pub mod dataset;
pub mod forecast;
pub mod rates;
pub mod report;
pub mod timestamp;
pub mod user;

pub use admin::{AuditEntry, Job};
pub use analytics::{Kpis, Series};
pub use dataset::{CommitResult, Dataset, DatasetProfile, DatasetStatus, UploadedDataset};
pub use forecast::{ForecastResult, ForecastYear};
pub use rates::{BillImpact, OptimisationResult, OptimisedStructure, RateModel, RateTier};
pub use report::ReportExport;
pub use user::{LoginResponse, NewUser, RefreshResponse, User, UserRole};
