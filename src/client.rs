use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::models::RecognitionData;
use crate::settings::SettingsStore;

pub const UPLOAD_FALLBACK_MESSAGE: &str = "File upload failed";
pub const RECOGNITION_FALLBACK_MESSAGE: &str = "Document recognition failed";

/// The two-step recognition protocol. Object-safe so the pipeline can be
/// driven by a scripted fake in tests.
#[async_trait]
pub trait RecognitionApi: Send + Sync {
    /// Sends the image as multipart form content and returns the backend's
    /// file id.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, PipelineError>;

    /// Asks the backend to recognize a previously uploaded file.
    async fn recognize(&self, file_id: &str) -> Result<RecognitionData, PipelineError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    file_id: String,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    data: RecognitionData,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the recognition backend. Holds no state across calls;
/// the base URL is read from settings at request time so changes apply to
/// the next run.
pub struct HttpRecognitionClient {
    http: reqwest::Client,
    settings: Arc<SettingsStore>,
}

impl HttpRecognitionClient {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.settings.api().base_url;
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    /// Fetches the privacy-masked rendition of an uploaded image. The
    /// backend serves it by basename, the final segment of `masked_image`.
    pub async fn fetch_masked_image(&self, masked_ref: &str) -> Result<Vec<u8>> {
        let basename = masked_basename(masked_ref);
        let response = self
            .http
            .get(self.endpoint(&format!("/api/images/{basename}")))
            .send()
            .await
            .context("Masked image request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Masked image request returned {}",
                response.status()
            ));
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read masked image body")?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RecognitionApi for HttpRecognitionClient {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, PipelineError> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("/api/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| PipelineError::Upload(err.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response, UPLOAD_FALLBACK_MESSAGE).await;
            return Err(PipelineError::Upload(message));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::Upload(err.to_string()))?;
        Ok(body.file_id)
    }

    async fn recognize(&self, file_id: &str) -> Result<RecognitionData, PipelineError> {
        let response = self
            .http
            .post(self.endpoint("/api/recognize"))
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await
            .map_err(|err| PipelineError::Recognition(err.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response, RECOGNITION_FALLBACK_MESSAGE).await;
            return Err(PipelineError::Recognition(message));
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::Recognition(err.to_string()))?;
        Ok(body.data)
    }
}

/// Error bodies optionally carry a `message`; fall back to a generic one.
async fn failure_message(response: reqwest::Response, fallback: &str) -> String {
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| fallback.to_string())
}

fn masked_basename(masked_ref: &str) -> &str {
    masked_ref.split('/').next_back().unwrap_or(masked_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_basename_takes_the_final_path_segment() {
        assert_eq!(masked_basename("results/masked/abc123.png"), "abc123.png");
        assert_eq!(masked_basename("abc123.png"), "abc123.png");
        assert_eq!(masked_basename("results/masked/"), "");
    }

    #[test]
    fn upload_response_parses_file_id() {
        let body: UploadResponse = serde_json::from_str(
            "{\"status\":\"success\",\"file_id\":\"abc123\",\"filename\":\"abc123.jpg\"}",
        )
        .expect("upload response should parse");
        assert_eq!(body.file_id, "abc123");
    }

    #[test]
    fn recognize_response_parses_the_data_object() {
        let body: RecognizeResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "data": {
                "document_type": "bank_statement",
                "confidence": 0.71,
                "extracted_info": { "account_number": "1234" }
            }
        }))
        .expect("recognize response should parse");
        assert_eq!(
            body.data.extracted_info.account_number.as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn error_body_message_is_optional() {
        let with: ErrorBody =
            serde_json::from_str("{\"message\":\"model unavailable\"}").expect("should parse");
        assert_eq!(with.message.as_deref(), Some("model unavailable"));

        let without: ErrorBody = serde_json::from_str("{}").expect("should parse");
        assert_eq!(without.message, None);
    }
}
