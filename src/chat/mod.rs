//! Session-scoped chat relay.
//!
//! The relay forwards the whole transcript to a completion service and hands
//! the reply back as a finite stream of text fragments. The assistant turn is
//! only recorded once that stream has finished cleanly.

mod openai;

pub use openai::{DEFAULT_BASE_URL, OpenAiClient, SseDecoder, SseEvent};

use async_trait::async_trait;
use futures::{Stream, StreamExt, stream::BoxStream};
use serde::{Deserialize, Serialize};
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no completion API key is configured")]
    MissingCredential,

    #[error("completion service unreachable: {0}")]
    Network(String),

    #[error("completion service is rate limiting requests")]
    RateLimited,

    #[error("completion service returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("could not decode completion stream: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Network(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered turns for one session. Never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }
}

pub type FragmentStream = BoxStream<'static, Result<String, ChatError>>;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Starts a streamed completion over `turns`.
    async fn stream_chat(&self, model: &str, turns: &[ChatTurn])
    -> Result<FragmentStream, ChatError>;
}

#[derive(Clone)]
pub struct ChatRelay {
    service: Arc<dyn CompletionService>,
    model: String,
}

impl ChatRelay {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Appends the user turn, then opens the reply stream. On failure the
    /// user turn stays in the transcript.
    pub async fn send(
        &self,
        transcript: &mut Transcript,
        user_text: &str,
    ) -> Result<ReplyStream, ChatError> {
        transcript.push(ChatTurn::user(user_text));
        debug!(turns = transcript.len(), model = %self.model, "relaying chat turn");
        let fragments = self
            .service
            .stream_chat(&self.model, transcript.turns())
            .await?;
        Ok(ReplyStream::new(fragments))
    }
}

/// Reply fragments as they arrive. Keeps the concatenated text so the
/// finished reply can become the assistant turn.
pub struct ReplyStream {
    inner: FragmentStream,
    text: String,
    failed: bool,
    finished: bool,
}

impl ReplyStream {
    pub fn new(inner: FragmentStream) -> Self {
        Self {
            inner,
            text: String::new(),
            failed: false,
            finished: false,
        }
    }

    /// True once the service ended the stream without an error.
    pub fn is_complete(&self) -> bool {
        self.finished && !self.failed
    }

    /// The assistant turn, available only for a cleanly completed reply.
    pub fn into_turn(self) -> Option<ChatTurn> {
        if self.is_complete() {
            Some(ChatTurn::assistant(self.text))
        } else {
            None
        }
    }

    /// Drains the stream and records the reply in `transcript`.
    pub async fn finish_into(mut self, transcript: &mut Transcript) -> Result<String, ChatError> {
        while let Some(fragment) = self.next().await {
            fragment?;
        }
        let text = self.text.clone();
        if let Some(turn) = self.into_turn() {
            transcript.push(turn);
        }
        Ok(text)
    }
}

impl Stream for ReplyStream {
    type Item = Result<String, ChatError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished || this.failed {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                this.text.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.failed = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedService;
    use super::*;

    #[tokio::test]
    async fn completed_reply_adds_user_then_assistant() {
        let service = Arc::new(ScriptedService::replying(&["Hel", "lo", "!"]));
        let relay = ChatRelay::new(service.clone(), DEFAULT_MODEL);
        let mut transcript = Transcript::default();

        let mut reply = relay.send(&mut transcript, "hi there").await.unwrap();
        let mut seen = Vec::new();
        while let Some(fragment) = reply.next().await {
            seen.push(fragment.unwrap());
        }
        assert_eq!(seen, vec!["Hel", "lo", "!"]);
        transcript.push(reply.into_turn().unwrap());

        assert_eq!(
            transcript.turns(),
            &[ChatTurn::user("hi there"), ChatTurn::assistant("Hello!")]
        );
    }

    #[tokio::test]
    async fn full_transcript_is_forwarded() {
        let service = Arc::new(ScriptedService::replying(&["ok"]));
        let relay = ChatRelay::new(service.clone(), DEFAULT_MODEL);
        let mut transcript = Transcript::default();

        let reply = relay.send(&mut transcript, "one").await.unwrap();
        reply.finish_into(&mut transcript).await.unwrap();
        let reply = relay.send(&mut transcript, "two").await.unwrap();
        reply.finish_into(&mut transcript).await.unwrap();

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            vec![ChatTurn::user("one"), ChatTurn::assistant("ok"), ChatTurn::user("two")]
        );
        assert_eq!(transcript.len(), 4);
    }

    #[tokio::test]
    async fn refused_request_keeps_only_user_turn() {
        let relay = ChatRelay::new(Arc::new(ScriptedService::refusing()), DEFAULT_MODEL);
        let mut transcript = Transcript::default();

        let err = relay.send(&mut transcript, "anyone?").await.err().unwrap();
        assert!(matches!(err, ChatError::RateLimited));
        assert_eq!(transcript.turns(), &[ChatTurn::user("anyone?")]);
    }

    #[tokio::test]
    async fn broken_stream_adds_no_assistant_turn() {
        let service = ScriptedService {
            fragments: vec![Ok("partial".to_string()), Err("bad event".to_string())],
            refuse: false,
            seen: Default::default(),
        };
        let relay = ChatRelay::new(Arc::new(service), DEFAULT_MODEL);
        let mut transcript = Transcript::default();

        let reply = relay.send(&mut transcript, "hello").await.unwrap();
        let err = reply.finish_into(&mut transcript).await.unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
        assert_eq!(transcript.turns(), &[ChatTurn::user("hello")]);
    }

    #[test]
    fn turns_serialize_as_role_content_pairs() {
        let json = serde_json::to_value(ChatTurn::assistant("hey")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "hey" }));
    }
}
