//! Clipboard paste handling: finding an image in a clipboard payload, and recognizing pasted
//! text that is really a path to a local image.

use std::path::PathBuf;

use crate::attachment::FileSource;
use crate::attachment::LocalFile;
use crate::attachment::is_image_type;

/// Kind of a clipboard item, mirroring `DataTransferItem.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardItemKind {
    File,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem<F> {
    pub kind: ClipboardItemKind,
    pub mime_type: String,
    /// Present when the item can produce a file.
    pub file: Option<F>,
}

/// What a paste event delivers: directly attached files and typed items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload<F> {
    pub files: Vec<F>,
    pub items: Vec<ClipboardItem<F>>,
}

impl<F> Default for ClipboardPayload<F> {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<F: FileSource> ClipboardPayload<F> {
    /// Find the image to attach, if any.
    ///
    /// Prefers a directly attached image file; otherwise the first file-kind item with an image
    /// type. `None` means "nothing to attach" and is not an error.
    pub fn into_image(self) -> Option<F> {
        let Self { files, items } = self;
        files
            .into_iter()
            .find(|file| is_image_type(file.mime_type()))
            .or_else(|| {
                items
                    .into_iter()
                    .filter(|item| {
                        item.kind == ClipboardItemKind::File && is_image_type(&item.mime_type)
                    })
                    .find_map(|item| item.file)
            })
    }
}

impl ClipboardPayload<LocalFile> {
    /// Payload for pasted text. If the text names an existing local file it is offered as a
    /// file; otherwise the payload carries nothing attachable.
    pub fn from_pasted_text(pasted: &str) -> Self {
        let Some(path) = normalize_pasted_path(pasted).filter(|path| path.is_file()) else {
            return Self::default();
        };
        tracing::debug!("pasted text resolves to local file {}", path.display());
        Self {
            files: vec![LocalFile::new(path)],
            items: Vec::new(),
        }
    }
}

/// Normalize pasted text that may represent a filesystem path.
///
/// Supports:
/// - `file://` URLs (converted to local paths)
/// - Windows/UNC paths
/// - shell-escaped single paths (via `shlex`)
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() {
        return None;
    }

    // file:// URL → filesystem path
    if let Ok(url) = url::Url::parse(pasted)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }

    // Detect unquoted Windows paths and bypass POSIX shlex which
    // treats backslashes as escapes (e.g., C:\Users\Alice\file.png).
    // Also handles UNC paths (\\server\share\path).
    let looks_like_windows_path = {
        // Drive letter path: C:\ or C:/
        let drive = pasted
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && pasted.get(1..2) == Some(":")
            && pasted
                .get(2..3)
                .is_some_and(|s| s == "\\" || s == "/");
        // UNC path: \\server\share
        let unc = pasted.starts_with("\\\\");
        drive || unc
    };
    if looks_like_windows_path {
        #[cfg(target_os = "linux")]
        {
            if is_probably_wsl()
                && let Some(converted) = convert_windows_path_to_wsl(pasted)
            {
                return Some(converted);
            }
        }
        return Some(PathBuf::from(pasted));
    }

    // shell-escaped single path → unescaped
    let parts: Vec<String> = shlex::Shlex::new(pasted).collect();
    if parts.len() == 1 {
        return parts.into_iter().next().map(PathBuf::from);
    }

    None
}

#[cfg(target_os = "linux")]
fn is_probably_wsl() -> bool {
    if let Ok(version) = std::fs::read_to_string("/proc/version") {
        let version_lower = version.to_lowercase();
        if version_lower.contains("microsoft") || version_lower.contains("wsl") {
            return true;
        }
    }

    std::env::var_os("WSL_DISTRO_NAME").is_some() || std::env::var_os("WSL_INTEROP").is_some()
}

#[cfg(target_os = "linux")]
fn convert_windows_path_to_wsl(input: &str) -> Option<PathBuf> {
    if input.starts_with("\\\\") {
        return None;
    }

    let drive_letter = input.chars().next()?.to_ascii_lowercase();
    if !drive_letter.is_ascii_lowercase() {
        return None;
    }

    if input.get(1..2) != Some(":") {
        return None;
    }

    let mut result = PathBuf::from(format!("/mnt/{drive_letter}"));
    for component in input
        .get(2..)?
        .trim_start_matches(['\\', '/'])
        .split(['\\', '/'])
        .filter(|component| !component.is_empty())
    {
        result.push(component);
    }

    Some(result)
}
