//! One review session per accepted WebSocket connection.
//!
//! The session loops: await a document text frame, stream fragments from the
//! completion source into a buffer, parse the buffer, send the result (or
//! nothing) back, repeat. Review failures of every kind — the provider being
//! unreachable, the stream breaking mid-response, the output not parsing —
//! are absorbed: the round is logged and dropped, and the session keeps
//! waiting for the next document. Only the channel itself breaking ends the
//! session. A failed round is client-observed silence, deliberately; the
//! channel must stay available for the next attempt.

use crate::completion::CompletionSource;
use crate::review::{self, ReviewPayload};
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ReviewSession {
    /// Short id used only for log correlation.
    id: String,
    completions: Arc<dyn CompletionSource>,
}

impl ReviewSession {
    pub fn new(completions: Arc<dyn CompletionSource>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            completions,
        }
    }

    /// Drive the session loop until the client disconnects or the channel
    /// breaks. Returns Ok on a clean close.
    pub async fn run(self, ws: WebSocketStream<TcpStream>) -> Result<()> {
        let (mut sink, mut stream) = ws.split();
        debug!(session = %self.id, "review session open");

        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(document)) => {
                    let Some(payload) = self.review_round(&document).await else {
                        // Failed round: the client hears nothing and the
                        // session is immediately ready for the next text.
                        continue;
                    };
                    // Send errors are channel failures — terminal.
                    sink.send(Message::Text(serde_json::to_string(&payload)?))
                        .await?;
                    if !payload.issues.is_empty() {
                        let notice = json!({ "issues": payload.issues });
                        sink.send(Message::Text(notice.to_string())).await?;
                    }
                }
                Ok(Message::Ping(data)) => {
                    sink.send(Message::Pong(data)).await?;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // binary/pong frames carry nothing for us
                Err(e) => {
                    warn!(session = %self.id, err = %e, "review channel error");
                    break;
                }
            }
        }

        debug!(session = %self.id, "review session closed");
        Ok(())
    }

    /// Run one document through the completion source and parse the result.
    ///
    /// Returns None for every recoverable failure; the caller sends nothing
    /// and loops. The fragment buffer lives only inside this call.
    async fn review_round(&self, document: &str) -> Option<ReviewPayload> {
        let mut fragments = match self.completions.review_document(document).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(session = %self.id, err = %e, "completion source unavailable — dropping round");
                return None;
            }
        };

        let mut buffer = String::new();
        while let Some(item) = fragments.recv().await {
            match item {
                // Empty fragments are legitimate no-ops from the provider.
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => buffer.push_str(&fragment),
                Err(e) => {
                    warn!(session = %self.id, err = %e, "fragment stream broke — dropping round");
                    return None;
                }
            }
        }

        match review::parse_completion(&buffer) {
            Ok(payload) => {
                debug!(session = %self.id, issues = payload.issues.len(), "review round complete");
                Some(payload)
            }
            Err(e) => {
                warn!(session = %self.id, err = %e, "discarding malformed completion");
                None
            }
        }
    }
}
