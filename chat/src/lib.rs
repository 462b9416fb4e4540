//! Client-side state and interaction core for the interio chat assistant.
//!
//! The crate owns everything that has real state-transition logic:
//!
//! - [`MessageStore`]: the ordered, in-memory transcript.
//! - [`Composer`]: pending text plus an optional staged image.
//! - [`attachment`]: turning a file or clipboard payload into a data URL.
//! - [`ChatSession`]: the submit -> placeholder -> resolve cycle against a [`ChatBackend`].
//! - [`transcript`]: a pure projection of a transcript snapshot into display cells.
//!
//! Rendering itself lives outside this crate; renderers only ever see immutable snapshots.

// Library code must not write to the terminal directly.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod attachment;
mod backend;
pub mod clipboard_paste;
mod composer;
mod config;
mod ids;
mod message;
mod message_store;
mod session;
pub mod transcript;

pub use attachment::AttachError;
pub use attachment::FileSource;
pub use attachment::InMemoryFile;
pub use attachment::LocalFile;
pub use backend::ChatBackend;
pub use backend::HttpChatBackend;
pub use backend::RequestError;
pub use composer::Composer;
pub use composer::MAX_INPUT_ROWS;
pub use composer::StagedImage;
pub use config::ChatConfig;
pub use config::DEFAULT_BASE_URL;
pub use ids::IdGenerator;
pub use ids::SequentialIds;
pub use ids::TimeRandomIds;
pub use message::Message;
pub use message::MessageId;
pub use message::REQUEST_FAILED_TEXT;
pub use message::THINKING_TEXT;
pub use message_store::MessageStore;
pub use message_store::TranscriptSnapshot;
pub use session::ChatSession;
pub use session::PendingRequest;
pub use session::Resolution;

pub use interio_protocol::ChatReply;
pub use interio_protocol::ChatRequest;
pub use interio_protocol::HistoryEntry;
pub use interio_protocol::Product;
pub use interio_protocol::Role;

/// Version string sent in the `User-Agent` header.
pub const INTERIO_VERSION: &str = env!("CARGO_PKG_VERSION");
