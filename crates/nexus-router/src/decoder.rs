//! Generic decoder for chat/completions event streams.
//!
//! The response body is a sequence of newline-terminated frames:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```
//!
//! Network chunks do not respect frame boundaries, so bytes are buffered
//! until a full line is available. Each content delta is appended to a
//! per-stream accumulator and published as a cumulative update.

use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use nexus_core::StreamUpdate;
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::error::RouterError;
use crate::stream::UpdateStream;
use crate::types::{ChatChunk, ChatRequest};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Line buffer that survives chunk boundaries.
///
/// Bytes are kept until a `\n` arrives, so a frame (or a multi-byte
/// character) split across two reads is reassembled before parsing.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]);
            lines.push(text.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// Take the unterminated remainder once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

/// Meaning of one line of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Non-empty content delta.
    Delta(String),
    /// End-of-stream sentinel.
    Done,
    /// Payload that is not valid JSON.
    Malformed(String),
    /// Blank line, comment, non-data field, or a chunk without content.
    Ignored,
}

/// Classify a single complete line.
pub fn parse_frame(line: &str) -> Frame {
    let line = line.trim();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };

    let payload = payload.trim_start();
    if payload == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => chunk.delta_content().map_or(Frame::Ignored, Frame::Delta),
        Err(e) => Frame::Malformed(e.to_string()),
    }
}

/// Outcome of feeding one line to the accumulator.
enum Step {
    Updated,
    Done,
    Nothing,
}

fn apply_line(line: &str, accumulated: &mut String) -> Step {
    match parse_frame(line) {
        Frame::Delta(delta) => {
            trace!(delta_len = delta.len(), "Content delta");
            accumulated.push_str(&delta);
            Step::Updated
        }
        Frame::Done => {
            debug!("Received [DONE] sentinel");
            Step::Done
        }
        Frame::Malformed(reason) => {
            let preview: String = line.chars().take(200).collect();
            warn!(error = %reason, preview = %preview, "Skipping malformed stream frame");
            Step::Nothing
        }
        Frame::Ignored => Step::Nothing,
    }
}

/// Terminal update for a stream that broke after it started.
fn interrupted(accumulated: &str, cause: impl Display) -> StreamUpdate {
    if accumulated.is_empty() {
        StreamUpdate::failure(format!("Network Error: {}", cause))
    } else {
        StreamUpdate::failure(format!("{}\n\nNetwork Error: {}", accumulated, cause))
    }
}

/// Decode a response body into updates on `tx`.
///
/// Publishes one partial update per non-empty delta, then exactly one
/// terminal update: complete on end-of-body or `[DONE]`, failure on a read
/// error. Returns early if the consumer goes away.
pub(crate) async fn pump<S, B, E>(body: S, tx: mpsc::Sender<StreamUpdate>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut frames = FrameBuffer::default();
    let mut accumulated = String::new();
    let mut deltas = 0u64;
    let mut done = false;

    while !done {
        let chunk = match body.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                error!(error = %e, deltas = deltas, "Stream read failed");
                tx.send(interrupted(&accumulated, e)).await.ok();
                return;
            }
            None => break,
        };

        for line in frames.push(chunk.as_ref()) {
            match apply_line(&line, &mut accumulated) {
                Step::Updated => {
                    deltas += 1;
                    if tx.send(StreamUpdate::partial(accumulated.clone())).await.is_err() {
                        warn!("Update receiver dropped, stopping stream");
                        return;
                    }
                }
                Step::Done => {
                    done = true;
                    break;
                }
                Step::Nothing => {}
            }
        }
    }

    if !done {
        if let Some(line) = frames.finish() {
            if let Step::Updated = apply_line(&line, &mut accumulated) {
                deltas += 1;
                if tx.send(StreamUpdate::partial(accumulated.clone())).await.is_err() {
                    return;
                }
            }
        }
    }

    info!(deltas = deltas, chars = accumulated.len(), "Stream complete");
    tx.send(StreamUpdate::complete(accumulated)).await.ok();
}

/// Opens streaming chat/completions requests and decodes them.
///
/// Each call gets its own task, buffer and accumulator; nothing is shared
/// between invocations except the HTTP connection pool.
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    client: reqwest::Client,
}

impl StreamDecoder {
    /// Create a decoder on top of an HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST `request` to `endpoint` and stream the decoded answer.
    pub fn open(&self, endpoint: &str, api_key: &str, request: ChatRequest) -> UpdateStream {
        let (tx, stream) = UpdateStream::channel();
        let model = request.model.clone();
        let builder = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&request);
        let endpoint = endpoint.to_string();

        tokio::spawn(async move {
            info!(endpoint = %endpoint, model = %model, "Opening completion stream");

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, endpoint = %endpoint, "Completion request failed");
                    tx.send(RouterError::Transport(e).into()).await.ok();
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!(status = status.as_u16(), "Completion endpoint returned error");
                let err = RouterError::Api {
                    status: status.as_u16(),
                    body,
                };
                tx.send(err.into()).await.ok();
                return;
            }

            pump(response.bytes_stream(), tx).await;
        });

        stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use httpmock::prelude::*;
    use std::io;

    use crate::types::{ChatRequestMessage, RequestRole};

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    async fn decode(chunks: Vec<Result<Vec<u8>, io::Error>>) -> Vec<StreamUpdate> {
        let (tx, updates) = UpdateStream::channel();
        tokio::spawn(pump(stream::iter(chunks), tx));
        updates.collect_all().await
    }

    fn ok_chunks(chunks: &[&str]) -> Vec<Result<Vec<u8>, io::Error>> {
        chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            messages: vec![ChatRequestMessage::text(RequestRole::User, "hi")],
            stream: true,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_frame_buffer_recombines_split_line() {
        let mut buffer = FrameBuffer::default();
        let first = buffer.push(br#"data: {"choices":[{"delta":{"content":"hel"#);
        assert!(first.is_empty());

        let second = buffer.push(b"lo\"}}]}\n");
        assert_eq!(second.len(), 1);
        assert_eq!(parse_frame(&second[0]), Frame::Delta("hello".to_string()));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_frame_buffer_handles_crlf_and_multiple_lines() {
        let mut buffer = FrameBuffer::default();
        let lines = buffer.push(b"data: a\r\n\r\ndata: b\npartial");
        assert_eq!(lines, vec!["data: a", "", "data: b"]);
        assert_eq!(buffer.finish().as_deref(), Some("partial"));
    }

    #[test]
    fn test_parse_frame_variants() {
        assert_eq!(parse_frame("data: [DONE]"), Frame::Done);
        assert_eq!(parse_frame("data:[DONE]"), Frame::Done);
        assert_eq!(parse_frame(""), Frame::Ignored);
        assert_eq!(parse_frame(": keep-alive"), Frame::Ignored);
        assert_eq!(parse_frame("event: message"), Frame::Ignored);
        assert_eq!(
            parse_frame(r#"data: {"choices":[{"delta":{}}]}"#),
            Frame::Ignored
        );
        assert!(matches!(parse_frame("data: {not json"), Frame::Malformed(_)));
    }

    #[tokio::test]
    async fn test_cumulative_updates_then_complete() {
        let body = format!("{}{}{}data: [DONE]\n\n", frame("a"), frame("b"), frame("c"));
        let updates = decode(ok_chunks(&[body.as_str()])).await;

        assert_eq!(
            updates,
            vec![
                StreamUpdate::partial("a"),
                StreamUpdate::partial("ab"),
                StreamUpdate::partial("abc"),
                StreamUpdate::complete("abc"),
            ]
        );
    }

    #[tokio::test]
    async fn test_done_sentinel_never_leaks_into_text() {
        let body = format!("{}data: [DONE]\n\n", frame("x"));
        let updates = decode(ok_chunks(&[body.as_str()])).await;

        assert!(updates.iter().all(|u| !u.text.contains("[DONE]")));
        assert!(updates.iter().all(|u| !u.error));
    }

    #[tokio::test]
    async fn test_frames_after_done_are_ignored() {
        let body = format!("{}data: [DONE]\n\n{}", frame("x"), frame("y"));
        let updates = decode(ok_chunks(&[body.as_str()])).await;
        assert_eq!(updates.last(), Some(&StreamUpdate::complete("x")));
        assert_eq!(updates.len(), 2);
    }

    #[tokio::test]
    async fn test_split_across_chunks_yields_single_delta() {
        let updates = decode(ok_chunks(&[
            r#"data: {"choices":[{"delta":{"content":"hel"#,
            "lo\"}}]}\n",
            "data: [DONE]\n",
        ]))
        .await;

        assert_eq!(
            updates,
            vec![StreamUpdate::partial("hello"), StreamUpdate::complete("hello")]
        );
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let body = frame("café ☕");
        let bytes = body.as_bytes();
        let cut = body.find('☕').unwrap() + 1;
        let updates = decode(vec![Ok(bytes[..cut].to_vec()), Ok(bytes[cut..].to_vec())]).await;

        assert_eq!(updates.last(), Some(&StreamUpdate::complete("café ☕")));
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let body = format!("{}data: {{oops\n\n{}data: [DONE]\n\n", frame("one "), frame("two"));
        let updates = decode(ok_chunks(&[body.as_str()])).await;

        assert_eq!(
            updates,
            vec![
                StreamUpdate::partial("one "),
                StreamUpdate::partial("one two"),
                StreamUpdate::complete("one two"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_and_missing_deltas_emit_nothing() {
        let body = format!(
            "{}{}data: {{\"choices\":[{{\"delta\":{{\"role\":\"assistant\"}}}}]}}\n\n{}",
            ": comment\n",
            frame(""),
            frame("z")
        );
        let updates = decode(ok_chunks(&[body.as_str()])).await;
        assert_eq!(
            updates,
            vec![StreamUpdate::partial("z"), StreamUpdate::complete("z")]
        );
    }

    #[tokio::test]
    async fn test_end_of_body_without_sentinel_completes() {
        let updates = decode(ok_chunks(&[
            frame("a").as_str(),
            r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
        ]))
        .await;
        assert_eq!(
            updates,
            vec![
                StreamUpdate::partial("a"),
                StreamUpdate::partial("ab"),
                StreamUpdate::complete("ab"),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_error_ends_with_failure() {
        let updates = decode(vec![
            Ok(frame("partial").into_bytes()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            Ok(frame("never").into_bytes()),
        ])
        .await;

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], StreamUpdate::partial("partial"));
        let last = &updates[1];
        assert!(last.is_complete && last.error);
        assert!(last.text.starts_with("partial"));
        assert!(last.text.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_open_streams_from_server() {
        let server = MockServer::start_async().await;
        let body = format!("{}{}data: [DONE]\n\n", frame("Hi"), frame(" there"));
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"model":"test-model","stream":true}"#);
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(body);
            })
            .await;

        let decoder = StreamDecoder::default();
        let updates = decoder
            .open(&server.url("/v1/chat/completions"), "sk-test", request())
            .collect_all()
            .await;

        mock.assert_async().await;
        assert_eq!(updates.last(), Some(&StreamUpdate::complete("Hi there")));
        assert_eq!(updates.len(), 3);
    }

    #[tokio::test]
    async fn test_open_reports_http_error_once() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(503).body("upstream overloaded");
            })
            .await;

        let updates = StreamDecoder::default()
            .open(&server.url("/v1/chat/completions"), "sk-test", request())
            .collect_all()
            .await;

        assert_eq!(
            updates,
            vec![StreamUpdate::failure("API Error 503: upstream overloaded")]
        );
    }

    #[tokio::test]
    async fn test_open_reports_connection_failure_once() {
        let updates = StreamDecoder::default()
            .open("http://127.0.0.1:1/v1/chat/completions", "sk-test", request())
            .collect_all()
            .await;

        assert_eq!(updates.len(), 1);
        assert!(updates[0].is_complete && updates[0].error);
        assert!(updates[0].text.starts_with("Network Error"));
    }
}
