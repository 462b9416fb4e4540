use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::models::Product;
use crate::models::Role;

/// Body of `POST {base}/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Always serialized, as `null` when the user did not attach an image.
    pub image_url: Option<String>,
    pub history: Vec<HistoryEntry>,
}

/// One finalized transcript entry as the backend sees it: no products, no loading state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Successful reply from the backend after lenient decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub image_url: Option<String>,
    pub products: Vec<Product>,
}

impl ChatReply {
    /// Decode a reply body. Returns `None` unless the body is a JSON object.
    ///
    /// - A missing or non-string `text` becomes `""`.
    /// - An empty `imageUrl` is treated as absent.
    /// - A non-array `products` is treated as empty; non-object entries are skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        let value = value.as_object()?;
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let image_url = value
            .get("imageUrl")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        let products = value
            .get("products")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Product::from_json).collect())
            .unwrap_or_default();

        Some(Self {
            text,
            image_url,
            products,
        })
    }
}

impl HistoryEntry {
    pub fn new(role: Role, text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            role,
            text: text.into(),
            image_url,
        }
    }
}
