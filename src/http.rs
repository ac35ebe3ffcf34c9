//! Small POST helper over `reqwest`
//!
//! Supports the three body encodings the gateway family understands:
//! multipart forms carrying files, URL-encoded forms and flat JSON objects.

use crate::constants::USER_AGENT;
use crate::error::{Result, UploaderError};
use crate::utils::display_name;
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// A file attached to a multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Form field name
    pub field_name: String,
    /// Full path of the file on disk
    pub path: PathBuf,
}

impl UploadFile {
    pub fn new(field_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field_name: field_name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `multipart/form-data`: files first, then text fields
    Multipart {
        fields: BTreeMap<String, String>,
        files: Vec<UploadFile>,
    },
    /// `application/x-www-form-urlencoded`
    Form(BTreeMap<String, String>),
    /// `application/json` object of string values
    Json(BTreeMap<String, String>),
}

/// Status and raw body of a response. Interpreting the body is up to the caller.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_user_agent(USER_AGENT, timeout)
    }

    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { inner })
    }

    /// POST a multipart form with the given files attached.
    pub async fn post_file(
        &self,
        url: &str,
        params: BTreeMap<String, String>,
        files: Vec<UploadFile>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        self.post(
            url,
            RequestBody::Multipart {
                fields: params,
                files,
            },
            headers,
        )
        .await
    }

    /// POST a URL-encoded form.
    pub async fn post_form(
        &self,
        url: &str,
        params: BTreeMap<String, String>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        self.post(url, RequestBody::Form(params), headers).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let mut request = self.inner.post(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        request = match body {
            RequestBody::Multipart { fields, files } => {
                request.multipart(build_multipart(fields, &files).await?)
            }
            RequestBody::Form(params) => request.form(&params),
            RequestBody::Json(params) => request.json(&params),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(url, status, bytes = body.len(), "POST completed");
        Ok(HttpResponse { status, body })
    }
}

async fn build_multipart(fields: BTreeMap<String, String>, files: &[UploadFile]) -> Result<Form> {
    let mut form = Form::new();

    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|_| UploaderError::FileNotFound(file.path.clone()))?;
        let part = Part::bytes(bytes)
            .file_name(display_name(&file.path))
            .mime_str("application/octet-stream")?;
        form = form.part(file.field_name.clone(), part);
    }

    for (name, value) in fields {
        form = form.text(name, value);
    }

    Ok(form)
}
