//! OpenAI-compatible streaming completion source.
//!
//! Speaks the `/chat/completions` SSE protocol: one `data:` line per chunk,
//! `data: [DONE]` at the end. Every `choices[0].delta.content` fragment is
//! forwarded verbatim into the fragment channel; everything else on the wire
//! (role deltas, finish reasons, usage blocks) is ignored.

use super::{prompt, CompletionError, CompletionSource, FragmentStream};
use crate::config::CompletionConfig;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::trace;

pub struct OpenAiCompletionSource {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    system_prompt: String,
}

impl OpenAiCompletionSource {
    pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_prompt: prompt::review_prompt(),
        })
    }
}

#[async_trait]
impl CompletionSource for OpenAiCompletionSource {
    async fn review_document(&self, document: &str) -> Result<FragmentStream, CompletionError> {
        let body = json!({
            "model": self.model,
            "stream": true,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": document },
            ],
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            // SSE events can split across network chunks; buffer partial lines.
            let mut pending = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(CompletionError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                pending.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = pending.find('\n') {
                    let line: String = pending.drain(..=pos).collect();
                    match parse_sse_line(line.trim()) {
                        SseEvent::Fragment(text) => {
                            trace!(len = text.len(), "completion fragment");
                            if tx.send(Ok(text)).await.is_err() {
                                // Receiver gone — the session moved on.
                                return;
                            }
                        }
                        SseEvent::Done => return,
                        SseEvent::Ignore => {}
                    }
                }
            }
        });

        Ok(rx)
    }
}

enum SseEvent {
    Fragment(String),
    Done,
    Ignore,
}

fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Ignore;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return SseEvent::Ignore;
    };
    match value["choices"][0]["delta"]["content"].as_str() {
        Some(text) => SseEvent::Fragment(text.to_string()),
        None => SseEvent::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        match parse_sse_line(line) {
            SseEvent::Fragment(t) => assert_eq!(t, "Hel"),
            _ => panic!("expected fragment"),
        }
    }

    #[test]
    fn done_marker_ends_stream() {
        assert!(matches!(parse_sse_line("data: [DONE]"), SseEvent::Done));
    }

    #[test]
    fn non_data_lines_and_role_deltas_are_ignored() {
        assert!(matches!(parse_sse_line(""), SseEvent::Ignore));
        assert!(matches!(parse_sse_line(": keep-alive"), SseEvent::Ignore));
        let role = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert!(matches!(parse_sse_line(role), SseEvent::Ignore));
    }
}
