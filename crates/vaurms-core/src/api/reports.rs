//! Report export endpoints (`/reports`).

use reqwest::Url;
use serde::Serialize;

use crate::models::ReportExport;

use super::client::ApiClient;
use super::ApiError;

#[derive(Serialize)]
struct ExportRequest<'a> {
    #[serde(rename = "type")]
    report_type: &'a str,
    scope: &'a str,
}

impl ApiClient {
    /// Ask the server to prepare a report, e.g. `("pdf", "kpi")`.
    pub async fn export_report(&self, report_type: &str, scope: &str) -> Result<ReportExport, ApiError> {
        self.post("/reports/export", &ExportRequest { report_type, scope })
            .await?
            .deserialize()
    }

    /// Download a prepared report under its suggested file name.
    pub async fn download_report(&self, export: &ReportExport) -> Result<(), ApiError> {
        let path = self.api_relative(&export.download_url);
        self.download(&path, &export.filename).await
    }

    /// Strip the API root from a server-issued URL so it can be requested.
    fn api_relative(&self, url: &str) -> String {
        if let Some(rest) = url.strip_prefix(self.base_url()) {
            return rest.to_string();
        }

        let base_path = Url::parse(self.base_url())
            .map(|u| u.path().trim_end_matches('/').to_string())
            .unwrap_or_default();
        if !base_path.is_empty() {
            if let Some(rest) = url.strip_prefix(&base_path) {
                if rest.is_empty() || rest.starts_with('/') {
                    return rest.to_string();
                }
            }
        }
        url.to_string()
    }
}
