// Client configuration. Nothing about a deployment is hardcoded in the
// client: base URL, endpoint, timeout and response shape all come from here,
// layered as defaults < config file < environment < command-line flags.

use crate::analysis::ResponseShape;
use crate::error::{ClientError, ClientResult};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ENDPOINT: &str = "/uploadfile/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FILE_FIELD: &str = "file";

/// Multipart field names the analysis servers accept for the image.
pub const FILE_FIELDS: [&str; 2] = ["file", "image"];

/// Settings the upload client is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the analysis server
    pub base_url: String,
    /// Upload path appended to `base_url`
    pub endpoint: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Shape successful responses are validated against
    pub response_shape: ResponseShape,
    /// Multipart field carrying the image (`file` or `image`)
    pub file_field: String,
    /// Sent as a `username` text field when present
    pub username: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            response_shape: ResponseShape::default(),
            file_field: DEFAULT_FILE_FIELD.to_string(),
            username: None,
        }
    }
}

/// On-disk form of the config; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    response_shape: Option<ResponseShape>,
    file_field: Option<String>,
    username: Option<String>,
}

impl ClientConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Reads `LABEL_SCANNER_API_URL`, `LABEL_SCANNER_ENDPOINT`,
    /// `LABEL_SCANNER_TIMEOUT_SECS`, `LABEL_SCANNER_RESPONSE_SHAPE`,
    /// `LABEL_SCANNER_FILE_FIELD` and `LABEL_SCANNER_USERNAME`.
    pub fn from_env() -> ClientResult<Self> {
        Self::default().apply_env()
    }

    /// Defaults, then the TOML file (explicit path or the per-user default
    /// location if it exists), then environment variables.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let config = match path {
            Some(path) => Self::default().apply_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::default().apply_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env()
    }

    fn apply_file(mut self, path: &Path) -> ClientResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            ClientError::config(format!("invalid config file {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");

        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.endpoint {
            self.endpoint = v;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(v) = file.response_shape {
            self.response_shape = v;
        }
        if let Some(v) = file.file_field {
            self.file_field = v;
        }
        if let Some(v) = file.username {
            self.username = Some(v).filter(|s| !s.trim().is_empty());
        }
        Ok(self)
    }

    fn apply_env(mut self) -> ClientResult<Self> {
        if let Ok(v) = env::var("LABEL_SCANNER_API_URL") {
            self.base_url = v;
        }
        if let Ok(v) = env::var("LABEL_SCANNER_ENDPOINT") {
            self.endpoint = v;
        }
        if let Ok(v) = env::var("LABEL_SCANNER_TIMEOUT_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| {
                ClientError::config(format!("LABEL_SCANNER_TIMEOUT_SECS is not a number: {}", v))
            })?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Ok(v) = env::var("LABEL_SCANNER_RESPONSE_SHAPE") {
            self.response_shape = v.parse().map_err(ClientError::Config)?;
        }
        if let Ok(v) = env::var("LABEL_SCANNER_FILE_FIELD") {
            self.file_field = v;
        }
        if let Ok(v) = env::var("LABEL_SCANNER_USERNAME") {
            self.username = Some(v).filter(|s| !s.trim().is_empty());
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_response_shape(mut self, shape: ResponseShape) -> Self {
        self.response_shape = shape;
        self
    }

    #[must_use]
    pub fn with_file_field(mut self, field: impl Into<String>) -> Self {
        self.file_field = field.into();
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|s| !s.trim().is_empty());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("base_url cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config(
                "base_url must start with http:// or https://",
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::config("endpoint cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::config("timeout cannot be zero"));
        }
        if !FILE_FIELDS.contains(&self.file_field.as_str()) {
            return Err(ClientError::config(format!(
                "file_field must be one of {:?}, got '{}'",
                FILE_FIELDS, self.file_field
            )));
        }
        Ok(())
    }
}

/// `<config_dir>/label-scanner/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("label-scanner").join("config.toml"))
}
