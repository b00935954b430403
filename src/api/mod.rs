use crate::models::{Section, TreeResponse};
use base64::Engine;
use serde::{Deserialize, Serialize};

pub(crate) const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:8080".to_string();

        // Both `window.ENV.API_URL` (documented) and `window.ENV.api_url` are accepted.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    for key in ["API_URL", "api_url"] {
                        if let Ok(api_url) = js_sys::Reflect::get(&env, &key.into()) {
                            if let Some(url_str) = api_url.as_string() {
                                return Self { api_url: url_str };
                            }
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ReportRequest {
    #[serde(rename = "reportNumber")]
    pub report_number: String,
}

/// Export body: the outline as JSON, base64-encoded.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ExportRequest {
    pub data: String,
}

impl ExportRequest {
    pub fn encode(sections: &[Section]) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(sections)?;
        Ok(Self {
            data: base64::engine::general_purpose::STANDARD.encode(json),
        })
    }
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(res: reqwest::Response, ctx: &str) -> ApiResult<reqwest::Response> {
        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn request_tree(&self, req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<Vec<Section>> {
        let res = req.send().await.map_err(ApiError::network)?;
        let res = Self::check(res, ctx).await?;
        let data: serde_json::Value = res.json().await.map_err(ApiError::parse)?;
        Self::parse_tree_response(data)
    }

    /// Accepts `{"tree": [...]}` or a bare array of sections.
    pub(crate) fn parse_tree_response(data: serde_json::Value) -> ApiResult<Vec<Section>> {
        if data.is_array() {
            return serde_json::from_value(data).map_err(ApiError::parse);
        }
        if data.get("tree").is_none() {
            return Err(ApiError::parse("Response is missing the section tree"));
        }
        let parsed: TreeResponse = serde_json::from_value(data).map_err(ApiError::parse)?;
        Ok(parsed.tree)
    }

    pub async fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<Vec<Section>> {
        log::info!("uploading {file_name} ({} bytes)", bytes.len());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(DOCX_MIME)
            .map_err(ApiError::network)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let req = reqwest::Client::new()
            .post(self.url("/api/upload"))
            .multipart(form);
        self.request_tree(req, "Upload failed").await
    }

    pub async fn fetch_report(&self, report_number: &str) -> ApiResult<Vec<Section>> {
        log::info!("fetching report {report_number}");
        let req = reqwest::Client::new()
            .post(self.url("/api/report"))
            .json(&ReportRequest {
                report_number: report_number.to_string(),
            });
        self.request_tree(req, "Failed to load report").await
    }

    /// Returns the exported document bytes.
    pub async fn export_document(&self, sections: &[Section]) -> ApiResult<Vec<u8>> {
        let body = ExportRequest::encode(sections).map_err(ApiError::parse)?;
        log::info!("exporting {} top-level sections", sections.len());

        let res = reqwest::Client::new()
            .post(self.url("/api/export"))
            .json(&body)
            .send()
            .await
            .map_err(ApiError::network)?;
        let res = Self::check(res, "Export failed").await?;
        let bytes = res.bytes().await.map_err(ApiError::network)?;
        Ok(bytes.to_vec())
    }
}
