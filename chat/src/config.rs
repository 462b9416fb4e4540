/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Startup configuration for the chat core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    base_url: String,
}

impl ChatConfig {
    /// Build a config from a raw base URL. Trailing slashes are dropped and a blank value falls
    /// back to [`DEFAULT_BASE_URL`].
    pub fn new(base_url: &str) -> Self {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = if trimmed.is_empty() {
            DEFAULT_BASE_URL
        } else {
            trimmed
        };
        Self {
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_endpoint(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
