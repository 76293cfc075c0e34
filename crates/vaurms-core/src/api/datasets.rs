//! Dataset endpoints (`/datasets`).

use std::path::Path;

use reqwest::multipart;
use tracing::debug;

use crate::models::{CommitResult, Dataset, DatasetProfile, UploadedDataset};

use super::client::{ApiClient, NO_PARAMS};
use super::ApiError;

/// MIME type to declare for an uploaded file, by extension.
fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => "text/csv",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

impl ApiClient {
    /// All datasets, newest first.
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        self.get("/datasets/", NO_PARAMS)
            .await?
            .deserialize()
    }

    /// Upload a local file as a new dataset, with an optional description field.
    pub async fn upload_dataset(
        &self,
        file: &Path,
        description: Option<&str>,
    ) -> Result<UploadedDataset, ApiError> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidRequest(format!("Not a file: {}", file.display())))?
            .to_string();
        let contents = tokio::fs::read(file).await?;
        debug!(file = %file.display(), bytes = contents.len(), "Uploading dataset");

        let part = multipart::Part::bytes(contents)
            .file_name(file_name.clone())
            .mime_str(mime_for(&file_name))
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create multipart part: {}", e)))?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }

        self.upload("/datasets/upload", form).await?.deserialize()
    }

    pub async fn dataset_profile(&self, dataset_id: i64) -> Result<DatasetProfile, ApiError> {
        let path = format!("/datasets/{}/profile", dataset_id);
        self.get(&path, NO_PARAMS)
            .await?
            .deserialize()
    }

    /// Mark a dataset as the active baseline.
    pub async fn commit_dataset(&self, dataset_id: i64) -> Result<CommitResult, ApiError> {
        let path = format!("/datasets/{}/commit", dataset_id);
        self.post(&path, &serde_json::json!({})).await?.deserialize()
    }
}
