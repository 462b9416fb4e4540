use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use interio_protocol::ChatReply;
use interio_protocol::HistoryEntry;
use interio_protocol::Product;
use interio_protocol::Role;

/// Text shown by an assistant placeholder while its request is in flight.
pub const THINKING_TEXT: &str = "Thinking…";

/// Text that replaces a placeholder whose request failed.
pub const REQUEST_FAILED_TEXT: &str =
    "Please try again in a moment. Check your network connection and then send your request again.";

/// Opaque message identifier. A placeholder and the message that resolves it share one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One transcript entry.
///
/// Messages are never edited in place. Updating a message means building a new one with the same
/// `id` and handing it to [`crate::MessageStore::replace_by_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Newlines are preserved; splitting into paragraphs is a display concern.
    pub text: Option<String>,
    /// Always an already-encoded data URL (or a URL returned by the backend).
    pub image_url: Option<String>,
    /// Only ever set on assistant messages.
    pub products: Option<Vec<Product>>,
    pub loading: bool,
}

impl Message {
    pub fn user(id: MessageId, text: String, image_url: Option<String>) -> Self {
        Self {
            id,
            role: Role::User,
            created_at: Utc::now(),
            text: Some(text),
            image_url,
            products: None,
            loading: false,
        }
    }

    pub fn assistant(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            created_at: Utc::now(),
            text: Some(text.into()),
            image_url: None,
            products: None,
            loading: false,
        }
    }

    pub fn placeholder(id: MessageId) -> Self {
        Self {
            loading: true,
            ..Self::assistant(id, THINKING_TEXT)
        }
    }

    /// The resolved form of a placeholder whose request succeeded. An empty product list is
    /// stored as absent.
    pub fn from_reply(id: MessageId, reply: ChatReply) -> Self {
        let ChatReply {
            text,
            image_url,
            products,
        } = reply;
        Self {
            image_url,
            products: (!products.is_empty()).then_some(products),
            ..Self::assistant(id, text)
        }
    }

    /// The resolved form of a placeholder whose request failed.
    pub fn request_failed(id: MessageId) -> Self {
        Self::assistant(id, REQUEST_FAILED_TEXT)
    }

    /// The backend-facing view of this message.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry::new(
            self.role,
            self.text.clone().unwrap_or_default(),
            self.image_url.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholder_is_loading_assistant_with_thinking_text() {
        let message = Message::placeholder(MessageId::new("p1"));
        assert_eq!(message.role, Role::Assistant);
        assert!(message.loading);
        assert_eq!(message.text.as_deref(), Some(THINKING_TEXT));
    }

    #[test]
    fn from_reply_drops_empty_product_list() {
        let message = Message::from_reply(
            MessageId::new("p1"),
            ChatReply {
                text: "hi there".to_string(),
                image_url: None,
                products: Vec::new(),
            },
        );
        assert!(!message.loading);
        assert_eq!(message.products, None);
        assert_eq!(message.text.as_deref(), Some("hi there"));
    }

    #[test]
    fn request_failed_has_no_image_or_products() {
        let message = Message::request_failed(MessageId::new("p1"));
        assert_eq!(message.text.as_deref(), Some(REQUEST_FAILED_TEXT));
        assert_eq!(message.image_url, None);
        assert_eq!(message.products, None);
        assert!(!message.loading);
    }

    #[test]
    fn history_entry_omits_products() {
        let message = Message::from_reply(
            MessageId::new("a1"),
            ChatReply {
                text: "line one\nline two".to_string(),
                image_url: Some("data:image/png;base64,AAAA".to_string()),
                products: vec![Product::default()],
            },
        );
        assert_eq!(
            message.history_entry(),
            HistoryEntry::new(
                Role::Assistant,
                "line one\nline two",
                Some("data:image/png;base64,AAAA".to_string()),
            )
        );
    }
}
