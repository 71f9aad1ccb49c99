// Image references: a local handle to a captured or selected photo. The
// filename and MIME type sent with the upload are inferred here so the
// client itself never has to look at paths.

use reqwest::Url;
use std::fmt;
use std::path::{Path, PathBuf};

/// MIME type used when the file name carries no extension.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Which flow an upload belongs to. Drives the fallback filename and the
/// verb used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    BloodTest,
    Barcode,
}

impl UploadKind {
    /// Filename used when the reference has no usable name of its own.
    pub fn default_file_name(self) -> &'static str {
        match self {
            UploadKind::BloodTest => "blood_test.png",
            UploadKind::Barcode => "barcode.png",
        }
    }

    /// Verb prefixed to failure messages ("Upload failed: ...").
    pub fn action(self) -> &'static str {
        match self {
            UploadKind::BloodTest => "Upload",
            UploadKind::Barcode => "Analysis",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::BloodTest => f.write_str("blood test"),
            UploadKind::Barcode => f.write_str("barcode"),
        }
    }
}

/// Local image handle plus the metadata inferred for the multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    path: PathBuf,
    file_name: String,
    mime_type: String,
    kind: UploadKind,
}

impl ImageReference {
    /// Build a reference from a plain path or a `file://` URI.
    ///
    /// When the last segment has an extension it is kept as the filename and
    /// the MIME type becomes `image/<ext>`. Otherwise the kind's default
    /// filename and `image/png` are used.
    pub fn new(location: impl AsRef<str>, kind: UploadKind) -> Self {
        let location = location.as_ref();
        let last_segment = location.rsplit('/').next();
        Self::with_name(resolve_location(location), last_segment, kind)
    }

    /// Build a reference from a path the caller already holds.
    ///
    /// The path is kept exactly as given, so non-UTF-8 names still resolve;
    /// only the filename sent with the upload is converted lossily.
    pub fn from_path(path: impl Into<PathBuf>, kind: UploadKind) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self::with_name(path, name.as_deref(), kind)
    }

    fn with_name(path: PathBuf, name: Option<&str>, kind: UploadKind) -> Self {
        let named = name.and_then(|name| extension_of(name).map(|ext| (name, ext)));

        let (file_name, mime_type) = match named {
            Some((name, ext)) => (name.to_string(), format!("image/{}", ext)),
            None => (
                kind.default_file_name().to_string(),
                DEFAULT_MIME_TYPE.to_string(),
            ),
        };

        ImageReference {
            path,
            file_name,
            mime_type,
            kind,
        }
    }

    /// Local path the bytes are read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename sent in the multipart part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `Content-Type` of the multipart part.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Flow this image was captured for.
    pub fn kind(&self) -> UploadKind {
        self.kind
    }

    /// Read the referenced image bytes from disk.
    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

// `file://` URIs are what pickers hand back; anything else is a path.
fn resolve_location(location: &str) -> PathBuf {
    if location.starts_with("file://") {
        if let Some(path) = Url::parse(location)
            .ok()
            .and_then(|url| url.to_file_path().ok())
        {
            return path;
        }
        return PathBuf::from(location.trim_start_matches("file://"));
    }
    PathBuf::from(location)
}

// Trailing `.<word chars>` only, so "scan." and "archive.tar-gz" have none.
fn extension_of(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(ext)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_name_and_infers_mime_from_extension() {
        let image = ImageReference::new("/tmp/photos/report.jpg", UploadKind::BloodTest);
        assert_eq!(image.file_name(), "report.jpg");
        assert_eq!(image.mime_type(), "image/jpg");
        assert_eq!(image.path(), Path::new("/tmp/photos/report.jpg"));
    }

    #[test]
    fn missing_extension_falls_back_per_kind() {
        let blood = ImageReference::new("/tmp/photos/capture", UploadKind::BloodTest);
        assert_eq!(blood.file_name(), "blood_test.png");
        assert_eq!(blood.mime_type(), "image/png");

        let barcode = ImageReference::new("/tmp/photos/capture", UploadKind::Barcode);
        assert_eq!(barcode.file_name(), "barcode.png");
        assert_eq!(barcode.mime_type(), "image/png");
    }

    #[test]
    fn trailing_slash_uses_default_name() {
        let image = ImageReference::new("/tmp/photos/", UploadKind::Barcode);
        assert_eq!(image.file_name(), "barcode.png");
        assert_eq!(image.mime_type(), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn file_uri_resolves_to_local_path() {
        let image = ImageReference::new("file:///tmp/cache/IMG_0042.heic", UploadKind::Barcode);
        assert_eq!(image.path(), Path::new("/tmp/cache/IMG_0042.heic"));
        assert_eq!(image.file_name(), "IMG_0042.heic");
        assert_eq!(image.mime_type(), "image/heic");
    }

    #[test]
    fn trailing_dot_is_not_an_extension() {
        let image = ImageReference::new("scan.", UploadKind::BloodTest);
        assert_eq!(image.file_name(), "blood_test.png");
    }

    #[test]
    fn from_path_keeps_path_and_name() {
        let image = ImageReference::from_path(Path::new("/tmp/photos/scan.webp"), UploadKind::Barcode);
        assert_eq!(image.path(), Path::new("/tmp/photos/scan.webp"));
        assert_eq!(image.file_name(), "scan.webp");
        assert_eq!(image.mime_type(), "image/webp");

        let bare = ImageReference::from_path(PathBuf::from("/tmp/photos/capture"), UploadKind::BloodTest);
        assert_eq!(bare.file_name(), "blood_test.png");
        assert_eq!(bare.mime_type(), DEFAULT_MIME_TYPE);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_file_name_stays_readable() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"r\xe9sultat.png"));
        std::fs::write(&path, b"png bytes").unwrap();

        let image = ImageReference::from_path(&path, UploadKind::BloodTest);
        assert_eq!(image.path(), path.as_path());
        assert_eq!(image.read_bytes().unwrap(), b"png bytes");
        assert_eq!(image.file_name(), "r\u{FFFD}sultat.png");
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn upload_kind_labels() {
        assert_eq!(UploadKind::BloodTest.action(), "Upload");
        assert_eq!(UploadKind::Barcode.action(), "Analysis");
        assert_eq!(UploadKind::Barcode.to_string(), "barcode");
    }
}
