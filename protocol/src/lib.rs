//! Wire types for the backend `/chat` endpoint.
//!
//! The request side is strict (we control what we send). The reply side is decoded leniently
//! from a raw JSON value because the backend is allowed to omit or mistype optional fields.

pub mod chat;
pub mod models;

pub use chat::ChatReply;
pub use chat::ChatRequest;
pub use chat::HistoryEntry;
pub use models::Product;
pub use models::Role;
