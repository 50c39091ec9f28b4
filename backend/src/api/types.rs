//! REST API response types.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::{PipelineOutput, PipelineReport};

/// Response for a completed pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Always "ok"; failures use [`error_response`]
    pub status: String,

    /// Rows in the full cleaned table (the report only carries a preview)
    pub cleaned_rows: usize,

    pub report: PipelineReport,
}

impl From<PipelineOutput> for ReportResponse {
    fn from(output: PipelineOutput) -> Self {
        ReportResponse {
            status: "ok".to_string(),
            cleaned_rows: output.cleaned.n_rows(),
            report: output.report,
        }
    }
}

/// Create an error response. No partial report is included.
pub fn error_response(error: &str) -> Value {
    json!({
        "runId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "report": null
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = error_response("Load error: CSV file is empty");

        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Load error: CSV file is empty");
        assert!(body["report"].is_null());
        assert!(Uuid::parse_str(body["runId"].as_str().unwrap()).is_ok());
    }
}
