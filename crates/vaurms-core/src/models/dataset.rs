use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetStatus {
    Uploaded,
    Processing,
    Validated,
    Error,
    Active,
    #[serde(other)]
    Unknown,
}

impl DatasetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetStatus::Uploaded => "uploaded",
            DatasetStatus::Processing => "processing",
            DatasetStatus::Validated => "validated",
            DatasetStatus::Error => "error",
            DatasetStatus::Active => "active",
            DatasetStatus::Unknown => "unknown",
        }
    }
}

/// An entry of `GET /datasets/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub status: DatasetStatus,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub row_count: Option<u64>,
    pub created_at: Option<NaiveDateTime>,
    /// Uploader's email.
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

impl Dataset {
    pub fn display_size(&self) -> String {
        match self.file_size {
            Some(bytes) => format_bytes(bytes),
            None => "Unknown".to_string(),
        }
    }
}

/// `GET /datasets/{id}/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub id: i64,
    pub name: String,
    pub status: DatasetStatus,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub row_count: Option<u64>,
    #[serde(default)]
    pub schema_info: Option<Value>,
    #[serde(default)]
    pub validation_errors: Option<Value>,
    pub created_at: Option<NaiveDateTime>,
}

/// Reply to a successful `POST /datasets/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDataset {
    pub id: i64,
    pub name: String,
    pub status: DatasetStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `POST /datasets/{id}/commit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    pub message: String,
    pub dataset_id: i64,
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
