use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use strum_macros::Display;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A product recommendation attached to an assistant reply.
///
/// Every field is optional on the wire. Display fallbacks (e.g. a generic title) are applied by
/// the renderer, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "img", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Product {
    /// Decode a product from a JSON object, accepting the alternate key names the backend has
    /// used over time (`name` for the title, `thumbnail` for the image).
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |keys: &[&str]| keys.iter().find_map(|key| scalar_text(object.get(*key)?));
        Some(Self {
            title: field(&["title", "name"]),
            image: field(&["img", "thumbnail"]),
            price: field(&["price"]),
            link: field(&["link"]),
        })
    }
}

/// Non-empty string, or the decimal text of a number. Everything else counts as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
