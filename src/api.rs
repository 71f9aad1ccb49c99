// API client module: a small blocking HTTP client that uploads a photo to
// the analysis service and turns whatever happens into either a typed
// `AnalysisResult` or a normalized `ClientError`.

use crate::analysis::AnalysisResult;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::image::ImageReference;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Upload client holding a reqwest blocking client and the deployment
/// configuration it was built with.
#[derive(Clone, Debug)]
pub struct UploadClient {
    client: Client,
    config: ClientConfig,
}

/// Error body returned by the server on non-2xx. FastAPI puts the reason in
/// `detail`, other backends in `message`.
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    message: Option<serde_json::Value>,
    detail: Option<serde_json::Value>,
}

impl UploadClient {
    /// Create a client for the given configuration. Fails only if the
    /// configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(UploadClient { client, config })
    }

    /// Build a client from environment variables (see `ClientConfig::from_env`).
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the username sent with subsequent uploads.
    pub fn set_username(&mut self, username: Option<String>) {
        self.config = self.config.clone().with_username(username);
    }

    /// Full URL for an endpoint path on the configured server.
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Upload a blood-test photo to the configured endpoint.
    pub fn upload_blood_test(&self, image: &ImageReference) -> ClientResult<AnalysisResult> {
        self.submit_image(image, &self.config.endpoint)
    }

    /// Send a barcode photo for analysis to the configured endpoint.
    pub fn analyze_barcode(&self, image: &ImageReference) -> ClientResult<AnalysisResult> {
        self.submit_image(image, &self.config.endpoint)
    }

    /// POST the image as multipart/form-data and wait for the full response.
    ///
    /// Each call issues exactly one request; nothing is cached or retried.
    pub fn submit_image(
        &self,
        image: &ImageReference,
        endpoint_path: &str,
    ) -> ClientResult<AnalysisResult> {
        let kind = image.kind();
        let action = kind.action();
        let url = self.endpoint_url(endpoint_path);

        let form = self.build_form(image)?;
        info!(%url, kind = %kind, file_name = image.file_name(), "uploading image");

        let res = self.client.post(&url).multipart(form).send().map_err(|e| {
            if e.is_builder() {
                warn!(error = %e, "could not build upload request");
                ClientError::unexpected(action, e)
            } else {
                warn!(error = %e, "no response from analysis server");
                ClientError::Network { source: e }
            }
        })?;

        let status = res.status();
        if !status.is_success() {
            let message = error_message(res, status);
            warn!(status = status.as_u16(), %message, "analysis server rejected upload");
            return Err(ClientError::Server {
                action,
                status: status.as_u16(),
                message,
            });
        }

        let body = res.bytes().map_err(|e| {
            warn!(error = %e, "response body was cut off");
            ClientError::Network { source: e }
        })?;
        let result = self
            .config
            .response_shape
            .parse(&body)
            .map_err(|reason| {
                warn!(shape = %self.config.response_shape, %reason, "unexpected response body");
                ClientError::MalformedResponse { action, reason }
            })?;

        debug!(?result, "analysis received");
        Ok(result)
    }

    fn build_form(&self, image: &ImageReference) -> ClientResult<multipart::Form> {
        let action = image.kind().action();
        let bytes = image.read_bytes().map_err(|e| {
            warn!(path = %image.path().display(), error = %e, "cannot read image");
            ClientError::unexpected(action, e)
        })?;

        let part = multipart::Part::bytes(bytes)
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| ClientError::unexpected(action, e))?;

        let mut form = multipart::Form::new().part(self.config.file_field.clone(), part);
        if let Some(username) = &self.config.username {
            form = form.text("username", username.clone());
        }
        Ok(form)
    }
}

// Prefer the body's `message`, then `detail`, then the status reason phrase.
fn error_message(res: Response, status: StatusCode) -> String {
    let body: ErrorBody = res
        .bytes()
        .ok()
        .and_then(|b| serde_json::from_slice(&b).ok())
        .unwrap_or_default();

    body.message
        .and_then(value_text)
        .or_else(|| body.detail.and_then(value_text))
        .unwrap_or_else(|| status_text(status))
}

// Strings are used as-is; structured details (FastAPI validation lists) are
// rendered as compact JSON.
fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UploadClient {
        UploadClient::new(ClientConfig::default().with_base_url(base)).unwrap()
    }

    #[test]
    fn endpoint_url_joins_slashes() {
        assert_eq!(
            client("http://10.0.0.2:8000").endpoint_url("/uploadfile/"),
            "http://10.0.0.2:8000/uploadfile/"
        );
        assert_eq!(
            client("http://10.0.0.2:8000/").endpoint_url("/upload"),
            "http://10.0.0.2:8000/upload"
        );
        assert_eq!(
            client("https://api.example.com").endpoint_url("upload"),
            "https://api.example.com/upload"
        );
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let err = UploadClient::new(ClientConfig::default().with_base_url("ftp://x")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn status_text_falls_back_to_code() {
        assert_eq!(status_text(StatusCode::INTERNAL_SERVER_ERROR), "Internal Server Error");
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap()), "599");
    }

    #[test]
    fn value_text_renders_structured_detail() {
        assert_eq!(value_text(serde_json::json!("bad image")).as_deref(), Some("bad image"));
        assert_eq!(value_text(serde_json::json!("")), None);
        assert_eq!(value_text(serde_json::Value::Null), None);
        assert_eq!(
            value_text(serde_json::json!([{"msg": "field required"}])).as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
    }

    #[test]
    fn set_username_updates_config() {
        let mut c = client("http://localhost:8000");
        c.set_username(Some("Grace".into()));
        assert_eq!(c.config().username.as_deref(), Some("Grace"));
        c.set_username(None);
        assert_eq!(c.config().username, None);
    }
}
