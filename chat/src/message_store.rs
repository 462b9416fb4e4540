//! The ordered, in-memory transcript.
//!
//! Mutation happens only through [`MessageStore::append`] and [`MessageStore::replace_by_id`].
//! After each mutation a fresh immutable [`TranscriptSnapshot`] is published on a
//! [`tokio::sync::watch`] channel; renderers pull from there and never hold a reference back
//! into the store.

use std::sync::Arc;

use interio_protocol::HistoryEntry;
use tokio::sync::watch;

use crate::message::Message;
use crate::message::MessageId;

/// Read-only view of the whole transcript at one point in time.
pub type TranscriptSnapshot = Arc<[Message]>;

#[derive(Debug)]
pub struct MessageStore {
    messages: Vec<Message>,
    snapshot_tx: watch::Sender<TranscriptSnapshot>,
}

impl MessageStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(TranscriptSnapshot::from(Vec::new()));
        Self {
            messages: Vec::new(),
            snapshot_tx,
        }
    }

    /// Insert `message` at the end of the transcript.
    ///
    /// Returns `false` (and leaves the store untouched) if a message with the same id is already
    /// present, so the one-message-per-id invariant cannot be broken from outside.
    pub fn append(&mut self, message: Message) -> bool {
        if self.position(&message.id).is_some() {
            tracing::warn!("refusing to append duplicate message id {}", message.id);
            return false;
        }
        tracing::debug!(id = %message.id, role = %message.role, loading = message.loading, "append message");
        self.messages.push(message);
        self.publish();
        true
    }

    /// Substitute the message with `id` by `next`, keeping its position.
    ///
    /// An unknown id is not an error: the store is left unchanged and `false` is returned.
    pub fn replace_by_id(&mut self, id: &MessageId, next: Message) -> bool {
        let Some(index) = self.position(id) else {
            tracing::debug!("replace_by_id: no message with id {id}");
            return false;
        };
        tracing::debug!(%id, loading = next.loading, "replace message");
        self.messages[index] = next;
        self.publish();
        true
    }

    /// Backend-facing history: every non-loading message in transcript order, reduced to
    /// role/text/image.
    ///
    /// The iterator is lazy and can be restarted by cloning it before consumption.
    pub fn history(&self) -> impl Iterator<Item = HistoryEntry> + Clone + '_ {
        self.messages
            .iter()
            .filter(|message| !message.loading)
            .map(Message::history_entry)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> TranscriptSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshots. The receiver is marked changed after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<TranscriptSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|message| &message.id == id)
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(TranscriptSnapshot::from(self.messages.as_slice()));
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interio_protocol::ChatReply;
    use interio_protocol::Role;
    use pretty_assertions::assert_eq;

    fn user(id: &str, text: &str) -> Message {
        Message::user(MessageId::new(id), text.to_string(), None)
    }

    fn ids(store: &MessageStore) -> Vec<&str> {
        store.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn replacement_never_reorders() {
        let mut store = MessageStore::new();
        store.append(user("a", "one"));
        store.append(Message::placeholder(MessageId::new("b")));
        store.append(user("c", "three"));

        store.replace_by_id(
            &MessageId::new("b"),
            Message::assistant(MessageId::new("b"), "two"),
        );
        store.replace_by_id(&MessageId::new("a"), user("a", "one, edited"));

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.messages()[0].text.as_deref(), Some("one, edited"));
        assert_eq!(store.messages()[1].text.as_deref(), Some("two"));
    }

    #[test]
    fn replace_unknown_id_is_a_no_op() {
        let mut store = MessageStore::new();
        store.append(user("a", "one"));
        let before = store.messages().to_vec();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        assert!(!store.replace_by_id(&MessageId::new("missing"), user("missing", "x")));

        assert_eq!(store.messages(), before.as_slice());
        assert!(!rx.has_changed().expect("sender alive"));
    }

    #[test]
    fn append_rejects_duplicate_ids() {
        let mut store = MessageStore::new();
        assert!(store.append(user("a", "one")));
        assert!(!store.append(user("a", "again")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].text.as_deref(), Some("one"));
    }

    #[test]
    fn history_skips_loading_messages() {
        let mut store = MessageStore::new();
        store.append(Message::assistant(MessageId::new("g"), "welcome"));
        store.append(Message::user(
            MessageId::new("u"),
            "look at this".to_string(),
            Some("data:image/png;base64,AAAA".to_string()),
        ));
        store.append(Message::placeholder(MessageId::new("p")));

        let history: Vec<HistoryEntry> = store.history().collect();
        let non_loading = store.messages().iter().filter(|m| !m.loading).count();

        assert_eq!(history.len(), non_loading);
        assert_eq!(
            history,
            vec![
                HistoryEntry::new(Role::Assistant, "welcome", None),
                HistoryEntry::new(
                    Role::User,
                    "look at this",
                    Some("data:image/png;base64,AAAA".to_string()),
                ),
            ]
        );
    }

    #[test]
    fn history_is_restartable() {
        let mut store = MessageStore::new();
        store.append(user("a", "one"));
        store.append(user("b", "two"));

        let history = store.history();
        let first: Vec<HistoryEntry> = history.clone().collect();
        let second: Vec<HistoryEntry> = history.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn replacing_with_identical_copy_is_observably_unchanged() {
        let mut store = MessageStore::new();
        let message = Message::from_reply(
            MessageId::new("a"),
            ChatReply {
                text: "hi there".to_string(),
                image_url: None,
                products: Vec::new(),
            },
        );
        store.append(message.clone());
        let before = store.messages().to_vec();

        assert!(store.replace_by_id(&message.id, message.clone()));

        assert_eq!(store.messages(), before.as_slice());
    }

    #[test]
    fn every_mutation_publishes_a_snapshot() {
        let mut store = MessageStore::new();
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        store.append(Message::placeholder(MessageId::new("p")));
        assert!(rx.has_changed().expect("sender alive"));
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].loading);

        store.replace_by_id(
            &MessageId::new("p"),
            Message::assistant(MessageId::new("p"), "done"),
        );
        assert!(rx.has_changed().expect("sender alive"));
        assert!(!rx.borrow_and_update()[0].loading);

        // Earlier snapshots are immutable.
        assert!(snapshot[0].loading);
        assert_eq!(store.snapshot().as_ref(), store.messages());
    }
}
