//! Minimal server-sent-events decoding for snapshot subscriptions.
//!
//! Only the subset the poca server emits is handled: `data:` fields,
//! events separated by a blank line. Comments and other fields are ignored.

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::debug;

use crate::api::ApiClient;

/// Incremental decoder: feed raw bytes, get complete event payloads back.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a transport chunk and return the data payload of every event
    /// completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer
            .push_str(&String::from_utf8_lossy(chunk).replace("\r\n", "\n"));

        let mut payloads = Vec::new();
        while let Some(boundary) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..boundary + 2).collect();

            let data: Vec<&str> = block
                .lines()
                .filter_map(|line| {
                    line.strip_prefix("data:")
                        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
                })
                .collect();

            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        payloads
    }
}

/// Follow an SSE endpoint, pushing each decoded snapshot into `tx`.
///
/// Runs until the transport drops, the payload stream ends, or every
/// receiver is gone. Transport failures are logged and otherwise silent;
/// the last delivered snapshot simply goes stale.
pub(crate) async fn follow_snapshots<T>(api: ApiClient, path: String, tx: watch::Sender<T>)
where
    T: DeserializeOwned,
{
    let response = match api.open_event_stream(&path).await {
        Ok(response) => response,
        Err(e) => {
            debug!(path, error = %e, "could not open snapshot stream");
            return;
        }
    };

    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(path, error = %e, "snapshot stream transport dropped");
                return;
            }
        };

        for payload in decoder.feed(&chunk) {
            match serde_json::from_str::<T>(&payload) {
                Ok(snapshot) => {
                    if tx.send(snapshot).is_err() {
                        // Every subscription handle is gone.
                        return;
                    }
                }
                Err(e) => debug!(path, error = %e, "ignoring undecodable snapshot"),
            }
        }
    }

    debug!(path, "snapshot stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_single_event() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: [1,2,3]\n\n");
        assert_eq!(payloads, vec!["[1,2,3]"]);
    }

    #[test]
    fn reassembles_split_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\"").is_empty());
        assert!(decoder.feed(b": 1}").is_empty());
        let payloads = decoder.feed(b"\n\n");
        assert_eq!(payloads, vec!["{\"a\": 1}"]);
    }

    #[test]
    fn handles_multiple_events_per_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: 1\n\ndata: 2\n\n");
        assert_eq!(payloads, vec!["1", "2"]);
    }

    #[test]
    fn joins_multi_line_data_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: line one\ndata: line two\n\n");
        assert_eq!(payloads, vec!["line one\nline two"]);
    }

    #[test]
    fn ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b": keep-alive\nevent: snapshot\ndata: 7\n\n");
        assert_eq!(payloads, vec!["7"]);
    }

    #[test]
    fn normalizes_crlf() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: 42\r\n\r\n");
        assert_eq!(payloads, vec!["42"]);
    }
}
