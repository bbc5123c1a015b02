//! Assembly of streamed (SSE) chat completions.
//!
//! The body arrives as arbitrary byte chunks. [`StreamAssembler`] decodes
//! them incrementally, splits on `\n` and folds every `data: ` frame into the
//! running answer. [`assemble`] drives an assembler over a byte stream under
//! an inactivity timeout.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::format::Extras;

const DATA_PREFIX: &str = "data: ";
const DONE_SIGNAL: &str = "[DONE]";

/// Final state of an assembled stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledResponse {
    pub content: String,
    pub extras: Extras,
}

/// Incremental SSE frame accumulator.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    content: String,
    extras: Extras,
    /// Decoded text not yet terminated by `\n`.
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the response body.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();

        while let Some(idx) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=idx).collect();
            self.process_line(line.trim_end_matches(['\n', '\r']));
        }
    }

    /// End of stream: flush whatever is buffered and return the result.
    pub fn finish(mut self) -> AssembledResponse {
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.buffer.push_str(&tail);
            self.pending.clear();
        }

        let last = std::mem::take(&mut self.buffer);
        self.process_line(last.trim_end_matches('\r'));

        AssembledResponse {
            content: self.content,
            extras: self.extras,
        }
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));

                    match err.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn process_line(&mut self, line: &str) {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        let payload = payload.trim();
        if payload.is_empty() || payload == DONE_SIGNAL {
            return;
        }

        let event: Value = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Skipping malformed stream frame");
                return;
            }
        };

        if let Some(delta) = event
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            self.content.push_str(delta);
        }

        replace_collection(&event, "citations", &mut self.extras.citations);
        replace_collection(&event, "images", &mut self.extras.images);
        replace_collection(
            &event,
            "related_questions",
            &mut self.extras.related_questions,
        );
        replace_collection(&event, "search_results", &mut self.extras.search_results);
    }
}

/// Later frames win: a well-formed array replaces the previous collection.
fn replace_collection<T: DeserializeOwned>(event: &Value, key: &str, slot: &mut Option<Vec<T>>) {
    if let Some(raw) = event.get(key).filter(|v| v.is_array()) {
        match Vec::<T>::deserialize(raw) {
            Ok(items) => *slot = Some(items),
            Err(e) => debug!(key, error = %e, "Ignoring malformed stream collection"),
        }
    }
}

/// Drain `stream` into an [`AssembledResponse`].
///
/// Each wait for the next chunk is bounded by `inactivity`; a slow but
/// steady stream never times out. The stream is dropped on every exit path.
pub async fn assemble<S, B, E>(
    stream: S,
    inactivity: Duration,
    api: &'static str,
) -> ApiResult<AssembledResponse>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut assembler = StreamAssembler::new();

    loop {
        match tokio::time::timeout(inactivity, stream.next()).await {
            Err(_) => {
                return Err(ApiError::StreamTimeout {
                    timeout_ms: u64::try_from(inactivity.as_millis()).unwrap_or(u64::MAX),
                });
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => return Err(ApiError::network(api, e.to_string())),
            Ok(Some(Ok(chunk))) => assembler.feed(chunk.as_ref()),
        }
    }

    Ok(assembler.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::convert::Infallible;

    fn frame(json: &str) -> String {
        format!("data: {json}\n")
    }

    fn delta(text: &str) -> String {
        frame(&format!(
            "{{\"choices\":[{{\"delta\":{{\"content\":\"{text}\"}}}}]}}"
        ))
    }

    fn assemble_chunks(chunks: &[&[u8]]) -> AssembledResponse {
        let mut assembler = StreamAssembler::new();
        for chunk in chunks {
            assembler.feed(chunk);
        }
        assembler.finish()
    }

    #[test]
    fn test_deltas_concatenate() {
        let first = delta("Hel");
        let second = delta("lo");
        let done = "data: [DONE]\n";
        let result = assemble_chunks(&[first.as_bytes(), second.as_bytes(), done.as_bytes()]);
        assert_eq!(result.content, "Hello");
    }

    #[test]
    fn test_citations_are_replaced_not_merged() {
        let first = frame(r#"{"citations":["a"]}"#);
        let second = frame(r#"{"citations":["b","c"]}"#);
        let result = assemble_chunks(&[first.as_bytes(), second.as_bytes()]);
        assert_eq!(
            result.extras.citations,
            Some(vec!["b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_collections_from_frames() {
        let text = concat!(
            "data: {\"images\":[{\"url\":\"https://i\",\"origin_url\":\"https://o\",\"height\":1,\"width\":2}]}\n",
            "data: {\"related_questions\":[\"next?\"]}\n",
            "data: {\"search_results\":[{\"title\":\"T\",\"url\":\"https://t\"}]}\n",
        );
        let result = assemble_chunks(&[text.as_bytes()]);
        assert_eq!(result.extras.images.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            result.extras.related_questions,
            Some(vec!["next?".to_string()])
        );
        assert_eq!(result.extras.search_results.unwrap()[0].title, "T");
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let good = delta("ok");
        let text = format!("data: {{not json\n{good}: keep-alive\nevent: ping\n");
        let result = assemble_chunks(&[text.as_bytes()]);
        assert_eq!(result.content, "ok");
    }

    #[test]
    fn test_line_split_across_chunks() {
        let line = delta("split");
        let (a, b) = line.as_bytes().split_at(10);
        let result = assemble_chunks(&[a, b]);
        assert_eq!(result.content, "split");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let line = delta("caf\u{e9} \u{1f980}");
        let bytes = line.as_bytes();
        let crab = bytes
            .windows(4)
            .position(|w| w == "\u{1f980}".as_bytes())
            .unwrap();
        let (a, b) = bytes.split_at(crab + 2);
        let result = assemble_chunks(&[a, b]);
        assert_eq!(result.content, "caf\u{e9} \u{1f980}");
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement() {
        let mut bytes = b"data: {\"choices\":[{\"delta\":{\"content\":\"a".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b"b\"}}]}\n");
        let result = assemble_chunks(&[&bytes]);
        assert_eq!(result.content, "a\u{fffd}b");
    }

    #[test]
    fn test_unterminated_last_line_is_flushed() {
        let line = delta("tail");
        let result = assemble_chunks(&[line.trim_end().as_bytes()]);
        assert_eq!(result.content, "tail");
    }

    #[test]
    fn test_crlf_lines() {
        let text = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n";
        assert_eq!(assemble_chunks(&[text.as_bytes()]).content, "x");
    }

    #[tokio::test]
    async fn test_assemble_over_stream() {
        let chunks: Vec<Result<Vec<u8>, Infallible>> = vec![
            Ok(delta("Hel").into_bytes()),
            Ok(delta("lo").into_bytes()),
            Ok(b"data: [DONE]\n".to_vec()),
        ];
        let result = assemble(stream::iter(chunks), Duration::from_secs(1), "Perplexity API")
            .await
            .unwrap();
        assert_eq!(result.content, "Hello");
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let first: Vec<Result<Vec<u8>, Infallible>> = vec![Ok(delta("partial").into_bytes())];
        let stalled = stream::iter(first).chain(stream::pending());

        let err = assemble(stalled, Duration::from_millis(50), "Perplexity API")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::StreamTimeout { timeout_ms: 50 }));
        assert!(err.to_string().starts_with("Stream timeout: No data received within 50ms"));
    }

    #[tokio::test]
    async fn test_slow_but_steady_stream_completes() {
        let slow = stream::unfold(0u8, |n| async move {
            if n == 4 {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(30)).await;
            Some((Ok::<_, Infallible>(delta("x").into_bytes()), n + 1))
        });

        // Total duration exceeds the window, each gap does not.
        let result = assemble(slow, Duration::from_millis(100), "Perplexity API")
            .await
            .unwrap();
        assert_eq!(result.content, "xxxx");
    }

    #[tokio::test]
    async fn test_stream_error_is_network_error() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(delta("a").into_bytes()),
            Err("connection reset".to_string()),
        ];
        let err = assemble(stream::iter(chunks), Duration::from_secs(1), "Perplexity API")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Network error while calling Perplexity API: connection reset"
        );
    }
}
