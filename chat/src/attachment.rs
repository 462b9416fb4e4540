//! Image attachment pipeline: file-like input -> validated, base64-encoded data URL.

use std::future::Future;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

/// Display name used when neither the file nor the caller supplies one.
pub const DEFAULT_IMAGE_NAME: &str = "Attached image";

/// Fallback display name for images that arrive through a paste.
pub const PASTED_IMAGE_LABEL: &str = "Pasted image";

/// Why an attachment attempt was rejected. Both variants are recoverable; the staged image is
/// cleared and the composer stays usable.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("unsupported attachment type `{mime_type}`")]
    UnsupportedType { mime_type: String },
    #[error("failed to read attachment: {source}")]
    ReadFailure {
        #[source]
        source: io::Error,
    },
}

impl AttachError {
    /// Short alert shown to the user.
    pub fn alert_text(&self) -> &'static str {
        match self {
            AttachError::UnsupportedType { .. } => "Only image files can be uploaded.",
            AttachError::ReadFailure { .. } => "Couldn't load the image. Please try again.",
        }
    }
}

/// Something that looks like a browser `File`: a declared MIME type, an optional name and
/// bytes that can be read asynchronously.
pub trait FileSource {
    fn name(&self) -> Option<&str>;

    fn mime_type(&self) -> &str;

    fn read_bytes(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// A file whose bytes are already in memory (clipboard contents, tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryFile {
    name: Option<String>,
    mime_type: String,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: Option<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name,
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

impl FileSource for InMemoryFile {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn read_bytes(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        let bytes = self.bytes.clone();
        async move { Ok(bytes) }
    }
}

/// A file on local disk. The MIME type is guessed from the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: PathBuf,
    name: Option<String>,
    mime_type: String,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            path,
            name,
            mime_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource for LocalFile {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn read_bytes(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        tokio::fs::read(self.path.clone())
    }
}

/// True if `mime_type` declares an image (`image/*`).
pub fn is_image_type(mime_type: &str) -> bool {
    mime_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Validate and encode `file` as a self-contained `data:` URL.
///
/// The type check happens before any bytes are read.
pub async fn encode_image<F: FileSource>(file: &F) -> Result<String, AttachError> {
    let mime_type = file.mime_type();
    if !is_image_type(mime_type) {
        return Err(AttachError::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }
    let bytes = file
        .read_bytes()
        .await
        .map_err(|source| AttachError::ReadFailure { source })?;
    Ok(data_url(mime_type, &bytes))
}

pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Pick the display name: the file's own name, then the caller's label, then
/// [`DEFAULT_IMAGE_NAME`].
pub fn display_name<F: FileSource>(file: &F, fallback: Option<&str>) -> String {
    [file.name(), fallback]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(DEFAULT_IMAGE_NAME)
        .to_string()
}
