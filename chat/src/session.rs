//! Request orchestration: composer -> user message -> placeholder -> backend -> resolution.
//!
//! A submission moves through these states:
//!
//! - **Composed**: the user message is appended and the composer is reset.
//! - **Pending**: an assistant placeholder (`loading = true`) with a fresh id is appended right
//!   after it.
//! - **Resolved-Success** / **Resolved-Failure**: the placeholder is replaced, in place and
//!   under the same id, by the backend's reply or by the retry-guidance message.
//!
//! The cycle is split so that the only await point ([`PendingRequest::dispatch`]) does not hold
//! a borrow of the session. Callers that want several requests in flight call
//! [`ChatSession::begin_submit`], run the dispatches however they like, and feed each
//! [`Resolution`] back through [`ChatSession::resolve`]. Resolutions may arrive in any order.

use interio_protocol::ChatReply;
use interio_protocol::ChatRequest;

use crate::backend::ChatBackend;
use crate::backend::RequestError;
use crate::composer::Composer;
use crate::ids::IdGenerator;
use crate::ids::TimeRandomIds;
use crate::message::Message;
use crate::message::MessageId;
use crate::message_store::MessageStore;

pub struct ChatSession<I = TimeRandomIds> {
    store: MessageStore,
    composer: Composer,
    ids: I,
}

impl<I: IdGenerator> ChatSession<I> {
    pub fn new(ids: I) -> Self {
        Self {
            store: MessageStore::new(),
            composer: Composer::new(),
            ids,
        }
    }

    /// Seed the transcript with an assistant greeting. It is an ordinary finalized message and
    /// is therefore part of the history sent to the backend.
    pub fn with_greeting(mut self, text: impl Into<String>) -> Self {
        let greeting = Message::assistant(self.ids.next_id(), text);
        self.store.append(greeting);
        self
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Start a submission from the current composer state.
    ///
    /// Returns `None` (and changes nothing) when there is neither text nor a staged image; the
    /// caller should return focus to the input. Otherwise the user message and the placeholder
    /// are in the store when this returns.
    ///
    /// Also returns `None` if the id generator repeats an id and the store refuses a message. A
    /// refused user message leaves the composer untouched.
    pub fn begin_submit(&mut self) -> Option<PendingRequest> {
        let draft = self.composer.draft()?;

        let user_message = Message::user(self.ids.next_id(), draft.text, draft.image_url);
        let message = user_message.text.clone().unwrap_or_default();
        let image_url = user_message.image_url.clone();
        if !self.store.append(user_message) {
            return None;
        }
        self.composer.reset();

        // History is taken before the placeholder goes in: it includes the user message we just
        // appended and never the placeholder.
        let history = self.store.history().collect();

        let placeholder_id = self.ids.next_id();
        if !self.store.append(Message::placeholder(placeholder_id.clone())) {
            tracing::warn!(%placeholder_id, "placeholder id already in use; request not sent");
            return None;
        }
        tracing::debug!(%placeholder_id, "submission pending");

        Some(PendingRequest {
            placeholder_id,
            request: ChatRequest {
                message,
                image_url,
                history,
            },
        })
    }

    /// Replace the placeholder named by `resolution` with its final message.
    ///
    /// Returns `false` if the placeholder is no longer in the store; that is not an error.
    pub fn resolve(&mut self, resolution: Resolution) -> bool {
        let Resolution {
            placeholder_id,
            outcome,
        } = resolution;
        let message = match outcome {
            Ok(reply) => Message::from_reply(placeholder_id.clone(), reply),
            Err(_) => Message::request_failed(placeholder_id.clone()),
        };
        self.store.replace_by_id(&placeholder_id, message)
    }

    /// Run one full submission cycle. Returns the placeholder id, or `None` if the composer was
    /// empty.
    pub async fn submit<B: ChatBackend + Sync>(&mut self, backend: &B) -> Option<MessageId> {
        let pending = self.begin_submit()?;
        let resolution = pending.dispatch(backend).await;
        let placeholder_id = resolution.placeholder_id.clone();
        self.resolve(resolution);
        Some(placeholder_id)
    }
}

impl Default for ChatSession<TimeRandomIds> {
    fn default() -> Self {
        Self::new(TimeRandomIds)
    }
}

/// A submission whose placeholder is in the store and whose request has not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    placeholder_id: MessageId,
    request: ChatRequest,
}

impl PendingRequest {
    pub fn placeholder_id(&self) -> &MessageId {
        &self.placeholder_id
    }

    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Send the request once. Every failure mode is folded into the returned [`Resolution`].
    pub async fn dispatch<B: ChatBackend + Sync>(self, backend: &B) -> Resolution {
        let Self {
            placeholder_id,
            request,
        } = self;
        let outcome = backend.send_chat(&request).await;
        match &outcome {
            Ok(reply) => tracing::debug!(
                %placeholder_id,
                products = reply.products.len(),
                has_image = reply.image_url.is_some(),
                "chat request succeeded"
            ),
            Err(err) => tracing::warn!(%placeholder_id, "chat request failed: {err}"),
        }
        Resolution {
            placeholder_id,
            outcome,
        }
    }
}

/// The settled outcome of a [`PendingRequest`].
#[derive(Debug)]
pub struct Resolution {
    pub placeholder_id: MessageId,
    pub outcome: Result<ChatReply, RequestError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::InMemoryFile;
    use crate::ids::SequentialIds;
    use crate::message::REQUEST_FAILED_TEXT;
    use crate::message::THINKING_TEXT;
    use interio_protocol::HistoryEntry;
    use interio_protocol::Product;
    use interio_protocol::Role;
    use pretty_assertions::assert_eq;
    use std::future::Future;
    use std::sync::Mutex;

    /// Backend that records requests and answers from a fixed script.
    struct ScriptedBackend {
        reply: Option<ChatReply>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(ChatReply {
                    text: text.to_string(),
                    ..ChatReply::default()
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().expect("lock").clone()
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn send_chat(
            &self,
            request: &ChatRequest,
        ) -> impl Future<Output = Result<ChatReply, RequestError>> + Send {
            self.seen.lock().expect("lock").push(request.clone());
            let outcome = match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(RequestError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
            };
            async move { outcome }
        }
    }

    fn session() -> ChatSession<SequentialIds> {
        ChatSession::new(SequentialIds::new("m"))
    }

    fn png() -> InMemoryFile {
        InMemoryFile::new(Some("room.png".to_string()), "image/png", vec![1, 2, 3])
    }

    #[test]
    fn empty_submit_leaves_store_unchanged() {
        let mut session = session().with_greeting("welcome");
        session.composer_mut().set_text("   ");
        let before = session.store().messages().to_vec();

        assert_eq!(session.begin_submit(), None);

        assert_eq!(session.store().messages(), before.as_slice());
        assert_eq!(session.composer().text(), "   ");
    }

    #[test]
    fn begin_submit_appends_user_message_then_placeholder() {
        let mut session = session();
        session.composer_mut().set_text("  hello  ");

        let pending = session.begin_submit().expect("accepted");

        let messages = session.store().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text.as_deref(), Some("hello"));
        assert_eq!(messages[1].id, *pending.placeholder_id());
        assert!(messages[1].loading);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text.as_deref(), Some(THINKING_TEXT));
        assert!(session.composer().is_empty());
    }

    #[test]
    fn history_payload_includes_user_message_but_not_placeholder() {
        let mut session = session().with_greeting("welcome");
        session.composer_mut().set_text("first");
        let first = session.begin_submit().expect("accepted");

        // Second submission while the first is still pending.
        session.composer_mut().set_text("second");
        let second = session.begin_submit().expect("accepted");

        assert_eq!(
            first.request().history,
            vec![
                HistoryEntry::new(Role::Assistant, "welcome", None),
                HistoryEntry::new(Role::User, "first", None),
            ]
        );
        assert_eq!(
            second.request().history,
            vec![
                HistoryEntry::new(Role::Assistant, "welcome", None),
                HistoryEntry::new(Role::User, "first", None),
                HistoryEntry::new(Role::User, "second", None),
            ]
        );
        assert_eq!(second.request().message, "second");
        assert_eq!(second.request().image_url, None);
    }

    #[tokio::test]
    async fn image_only_submission_is_accepted() {
        let mut session = session();
        session
            .composer_mut()
            .attach(&png(), None)
            .await
            .expect("attach");

        let pending = session.begin_submit().expect("image alone is enough");

        let user = &session.store().messages()[0];
        assert_eq!(user.text.as_deref(), Some(""));
        assert_eq!(user.image_url.as_deref(), Some("data:image/png;base64,AQID"));
        assert_eq!(
            pending.request().image_url.as_deref(),
            Some("data:image/png;base64,AQID")
        );
        assert_eq!(session.composer().pending_image(), None);
    }

    #[tokio::test]
    async fn rejected_attachment_does_not_touch_the_store() {
        let mut session = session().with_greeting("welcome");
        let before = session.store().messages().to_vec();
        let text_file = InMemoryFile::new(None, "text/plain", b"notes".to_vec());

        let err = session
            .composer_mut()
            .attach(&text_file, None)
            .await
            .expect_err("text/plain is rejected");

        assert!(matches!(err, crate::AttachError::UnsupportedType { .. }));
        assert_eq!(session.composer().pending_image(), None);
        assert_eq!(session.store().messages(), before.as_slice());
    }

    #[tokio::test]
    async fn successful_reply_replaces_placeholder_in_place() {
        let mut session = session();
        let backend = ScriptedBackend::replying("hi there");
        session.composer_mut().set_text("hello");

        let placeholder_id = session.submit(&backend).await.expect("submitted");

        let messages = session.store().messages();
        assert_eq!(messages.len(), 2);
        let last = messages.last().expect("assistant reply");
        assert_eq!(last.id, placeholder_id);
        assert_eq!(last.role, Role::Assistant);
        assert!(!last.loading);
        assert_eq!(last.text.as_deref(), Some("hi there"));
        assert_eq!(
            messages
                .iter()
                .filter(|m| m.role == Role::Assistant)
                .count(),
            1
        );

        assert_eq!(
            backend.requests(),
            vec![ChatRequest {
                message: "hello".to_string(),
                image_url: None,
                history: vec![HistoryEntry::new(Role::User, "hello", None)],
            }]
        );
    }

    #[tokio::test]
    async fn failed_request_resolves_to_retry_guidance() {
        let mut session = session();
        session.composer_mut().set_text("hello");

        let placeholder_id = session
            .submit(&ScriptedBackend::failing())
            .await
            .expect("submitted");

        let last = session.store().messages().last().expect("assistant reply");
        assert_eq!(last.id, placeholder_id);
        assert_eq!(last.role, Role::Assistant);
        assert!(!last.loading);
        assert_eq!(last.text.as_deref(), Some(REQUEST_FAILED_TEXT));
        assert_eq!(last.image_url, None);
        assert_eq!(last.products, None);

        // The session stays usable after a failure.
        session.composer_mut().set_text("again");
        assert!(session.begin_submit().is_some());
    }

    #[tokio::test]
    async fn reply_image_and_products_are_kept() {
        let mut session = session();
        let product = Product {
            title: Some("Walnut shelf".to_string()),
            image: None,
            price: Some("59,000".to_string()),
            link: Some("https://shop.example/shelf".to_string()),
        };
        let backend = ScriptedBackend {
            reply: Some(ChatReply {
                text: "Try this layout".to_string(),
                image_url: Some("data:image/png;base64,EDIT".to_string()),
                products: vec![product.clone()],
            }),
            seen: Mutex::new(Vec::new()),
        };
        session.composer_mut().set_text("make it cozy");

        session.submit(&backend).await.expect("submitted");

        let last = session.store().messages().last().expect("reply");
        assert_eq!(last.image_url.as_deref(), Some("data:image/png;base64,EDIT"));
        assert_eq!(last.products, Some(vec![product]));
    }

    #[tokio::test]
    async fn concurrent_submissions_resolve_in_completion_order() {
        let mut session = session();
        session.composer_mut().set_text("first");
        let first = session.begin_submit().expect("first");
        session.composer_mut().set_text("second");
        let second = session.begin_submit().expect("second");

        let second_done = second
            .dispatch(&ScriptedBackend::replying("answer two"))
            .await;
        assert!(session.resolve(second_done));
        let first_done = first.dispatch(&ScriptedBackend::failing()).await;
        assert!(session.resolve(first_done));

        let summary: Vec<(Role, Option<&str>, bool)> = session
            .store()
            .messages()
            .iter()
            .map(|m| (m.role, m.text.as_deref(), m.loading))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Role::User, Some("first"), false),
                (Role::Assistant, Some(REQUEST_FAILED_TEXT), false),
                (Role::User, Some("second"), false),
                (Role::Assistant, Some("answer two"), false),
            ]
        );
    }

    /// Hands out the same id every time.
    struct StuckIds;

    impl IdGenerator for StuckIds {
        fn next_id(&self) -> MessageId {
            MessageId::new("same")
        }
    }

    #[test]
    fn repeated_placeholder_id_does_not_start_a_request() {
        let mut session = ChatSession::new(StuckIds);
        session.composer_mut().set_text("hello");

        assert_eq!(session.begin_submit(), None);

        let messages = session.store().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert!(!messages[0].loading);
    }

    #[test]
    fn repeated_user_message_id_keeps_the_draft() {
        let mut session = ChatSession::new(StuckIds).with_greeting("welcome");
        session.composer_mut().set_text("hello");

        assert_eq!(session.begin_submit(), None);

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.composer().text(), "hello");
    }

    #[test]
    fn resolving_a_vanished_placeholder_is_a_no_op() {
        let mut session = session();
        session.composer_mut().set_text("hello");
        session.begin_submit().expect("accepted");
        let before = session.store().messages().to_vec();

        let resolved = session.resolve(Resolution {
            placeholder_id: MessageId::new("nope"),
            outcome: Ok(ChatReply::default()),
        });

        assert!(!resolved);
        assert_eq!(session.store().messages(), before.as_slice());
    }
}
