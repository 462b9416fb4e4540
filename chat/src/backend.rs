use std::future::Future;

use interio_protocol::ChatReply;
use interio_protocol::ChatRequest;

use crate::INTERIO_VERSION;
use crate::config::ChatConfig;

/// Anything that went wrong talking to the backend. All variants resolve the placeholder to the
/// retry-guidance message; none of them end the session.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat endpoint returned a malformed body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("chat endpoint returned a non-object body: {body}")]
    UnexpectedBody { body: String },
}

/// One request/response exchange with the chat backend. No retries, no timeout.
pub trait ChatBackend {
    fn send_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, RequestError>> + Send;
}

/// [`ChatBackend`] over `POST {base}/chat`.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(config: &ChatConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("interio/{INTERIO_VERSION}"))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &ChatConfig) -> Self {
        Self {
            client,
            endpoint: config.chat_endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatBackend for HttpChatBackend {
    fn send_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, RequestError>> + Send {
        let pending = self.client.post(&self.endpoint).json(request).send();
        async move {
            let response = pending.await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let body = response.bytes().await?;
            let value: serde_json::Value = serde_json::from_slice(&body)?;
            ChatReply::from_json(&value).ok_or_else(|| RequestError::UnexpectedBody {
                body: value.to_string(),
            })
        }
    }
}
