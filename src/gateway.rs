use crate::config::GatewayCredentials;
use crate::constants::{FILE_FIELD, GATEWAY_SUCCESS_CODE, STORAGE_TYPE};
use crate::error::{Result, UploaderError};
use crate::http::{HttpClient, UploadFile};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Reply of the gateway's `uploadFile` endpoint
///
/// `statusCode` is 200 on success; 401 means the token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResult {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    #[serde(rename = "StatusString", default)]
    pub message: String,
    #[serde(rename = "fileUrl", default)]
    pub file_url: String,
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        self.status_code == GATEWAY_SUCCESS_CODE
    }
}

/// Something that can store one local file and report where it ended up.
///
/// A returned `UploadResult` may still carry a failure status code; callers
/// decide whether to retry. `Err` is reserved for transport-level failures.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    async fn upload_file(&self, path: &Path) -> Result<UploadResult>;
}

/// Multipart uploader for a NoaHandler gateway
pub struct NoaGateway {
    client: HttpClient,
    credentials: GatewayCredentials,
}

impl NoaGateway {
    pub fn new(credentials: GatewayCredentials, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(timeout)?,
            credentials,
        })
    }

    /// Metadata fields sent next to the file.
    pub fn form_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert("token".to_string(), self.credentials.token.clone());
        fields.insert("storageType".to_string(), STORAGE_TYPE.to_string());
        fields.insert("bucket".to_string(), self.credentials.bucket.clone());
        fields.insert("workFlow".to_string(), self.credentials.workflow.clone());
        fields
    }
}

#[async_trait]
impl UploadGateway for NoaGateway {
    async fn upload_file(&self, path: &Path) -> Result<UploadResult> {
        let url = self.credentials.upload_url();
        let response = self
            .client
            .post_file(
                &url,
                self.form_fields(),
                vec![UploadFile::new(FILE_FIELD, path)],
                &[],
            )
            .await?;

        parse_upload_result(response.status, &response.body)
    }
}

/// Decode a gateway reply body.
pub fn parse_upload_result(http_status: u16, body: &[u8]) -> Result<UploadResult> {
    serde_json::from_slice(body).map_err(|e| UploaderError::InvalidResponse {
        status: http_status,
        reason: format!("{} (body: {})", e, String::from_utf8_lossy(body)),
    })
}
