use serde::{Deserialize, Serialize};

/// Reply to `POST /reports/export`: where to fetch the file and what to call it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportExport {
    pub download_url: String,
    pub filename: String,
}
