use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use interio_chat::ChatConfig;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

/// Environment variable consulted when `--base-url` is not given.
pub const BACKEND_URL_ENV: &str = "INTERIO_BACKEND_URL";

/// Read-only view of `~/.interio/config.toml`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured backend base URL, if any. Blank values count as unset.
    pub fn base_url(&self) -> anyhow::Result<Option<String>> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(None);
        };

        let base_url = match content.parse::<DocumentMut>() {
            Ok(doc) => read_base_url(&doc),
            Err(err) => {
                tracing::debug!(
                    "{} is not valid TOML ({err}); using line fallback",
                    self.path.display()
                );
                parse_base_url_fallback(&content)
            }
        };

        Ok(base_url.filter(|url| !url.trim().is_empty()))
    }
}

/// Pick the backend base URL: explicit flag (or its env var, which clap folds in), then the
/// config file, then the built-in default.
///
/// An unreadable config file is logged and skipped; it never blocks startup.
pub fn resolve_chat_config(flag: Option<&str>, store: Option<&ConfigStore>) -> ChatConfig {
    if let Some(url) = flag.filter(|url| !url.trim().is_empty()) {
        return ChatConfig::new(url);
    }

    let from_file = store.and_then(|store| match store.base_url() {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!("ignoring {}: {err:#}", store.path().display());
            None
        }
    });

    from_file
        .map(|url| ChatConfig::new(&url))
        .unwrap_or_default()
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".interio").join("config.toml")
}

fn read_base_url(doc: &DocumentMut) -> Option<String> {
    doc.get("base_url")
        .and_then(TomlItem::as_value)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Best-effort scan for a top-level `base_url = "..."` in a file `toml_edit` rejected.
fn parse_base_url_fallback(contents: &str) -> Option<String> {
    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            // Keys under a table header are not top-level.
            return None;
        }
        let Some(line) = strip_toml_comment(trimmed) else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != "base_url" {
            continue;
        }

        let value = value.trim();
        let unquoted = value
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|rest| rest.strip_suffix('\''))
            });
        if let Some(url) = unquoted {
            return Some(url.to_string());
        }
    }

    None
}

fn strip_toml_comment(line: &str) -> Option<&str> {
    let line = line.split_once('#').map_or(line, |(head, _)| head).trim();
    if line.is_empty() { None } else { Some(line) }
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
