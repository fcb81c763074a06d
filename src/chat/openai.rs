use super::{ChatError, ChatTurn, CompletionService, FragmentStream};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible `/chat/completions` client using server-sent events.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn stream_chat(
        &self,
        model: &str,
        turns: &[ChatTurn],
    ) -> Result<FragmentStream, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingCredential)?;

        let response = self
            .client
            .post(self.chat_completions_url())
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&ChatRequest {
                model,
                messages: turns,
                stream: true,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ChatError::from))
            .boxed();
        Ok(fragments(bytes))
    }
}

struct Pump {
    bytes: futures::stream::BoxStream<'static, Result<Vec<u8>, ChatError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

impl Pump {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Fragment(text) => self.pending.push_back(text),
                SseEvent::Done => {
                    self.done = true;
                    break;
                }
            }
        }
    }
}

fn fragments(
    bytes: futures::stream::BoxStream<'static, Result<Vec<u8>, ChatError>>,
) -> FragmentStream {
    let pump = Pump {
        bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(Some(pump), |state| async move {
        let mut pump = state?;
        loop {
            if let Some(text) = pump.pending.pop_front() {
                return Some((Ok(text), Some(pump)));
            }
            if pump.done {
                return None;
            }

            let decoded = match pump.bytes.next().await {
                Some(Ok(chunk)) => pump.decoder.push(&chunk),
                Some(Err(err)) => Err(err),
                None => {
                    pump.done = true;
                    pump.decoder.finish()
                }
            };
            match decoded {
                Ok(events) => pump.absorb(events),
                Err(err) => return Some((Err(err), None)),
            }
        }
    })
    .boxed()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Fragment(String),
    Done,
}

/// Incremental decoder for `data:` lines of a chat completion stream.
/// Bytes may arrive split anywhere, including inside a line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, ChatError> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flushes a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Result<Vec<SseEvent>, ChatError> {
        let line = std::mem::take(&mut self.buffer);
        Ok(decode_line(&line)?.into_iter().collect())
    }
}

fn decode_line(raw: &[u8]) -> Result<Option<SseEvent>, ChatError> {
    let line = std::str::from_utf8(raw).map_err(|err| ChatError::Decode(err.to_string()))?;
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }
    if data.is_empty() {
        return Ok(None);
    }

    let chunk: ChunkResponse =
        serde_json::from_str(data).map_err(|err| ChatError::Decode(err.to_string()))?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());
    Ok(content.map(SseEvent::Fragment))
}
