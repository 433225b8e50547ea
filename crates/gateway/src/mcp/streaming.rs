//! NDJSON streaming events
//!
//! Line shapes for streamed tool results over HTTP. A well-formed stream is
//! zero or more `chunk` lines followed by exactly one terminal line, either
//! `done` or `error`.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use lightrag_mcp_shared::ErrorEnvelope;

use crate::lightrag::QueryStream;

/// Media type of streamed responses
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// One line of a streamed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text fragment from the backend
    Chunk { data: String },

    /// Stream completed normally
    Done { status: String },

    /// Stream aborted; no further lines follow
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<ErrorEnvelope>,
    },
}

impl StreamEvent {
    pub fn chunk(data: impl Into<String>) -> Self {
        StreamEvent::Chunk { data: data.into() }
    }

    pub fn done() -> Self {
        StreamEvent::Done {
            status: "completed".to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk { .. })
    }

    /// Serialize as one NDJSON line, newline included
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","error":"failed to encode stream event"}"#.to_string()
        });
        line.push('\n');
        line
    }
}

/// Turn a fragment stream into NDJSON lines.
///
/// Each fragment becomes a `chunk` line. The first error ends the output
/// with an `error` line; exhaustion ends it with `done`.
pub fn ndjson_events(fragments: QueryStream, tool: String) -> impl Stream<Item = StreamEvent> + Send {
    stream::unfold(Some(fragments), move |state| {
        let tool = tool.clone();
        async move {
            let mut fragments = state?;
            match fragments.next().await {
                Some(Ok(text)) => Some((StreamEvent::chunk(text), Some(fragments))),
                Some(Err(err)) => {
                    crate::tools::log_tool_failure(&tool, &err);
                    let event = StreamEvent::Error {
                        error: err.message.clone(),
                        details: Some(err.to_envelope().with_tool(tool)),
                    };
                    Some((event, None))
                }
                None => {
                    tracing::debug!(tool = %tool, "Stream completed");
                    Some((StreamEvent::done(), None))
                }
            }
        }
    })
}

/// NDJSON body bytes for an HTTP response
pub fn ndjson_body(
    fragments: QueryStream,
    tool: String,
) -> impl Stream<Item = Result<Bytes, std::convert::Infallible>> + Send {
    ndjson_events(fragments, tool).map(|event| Ok(Bytes::from(event.to_line())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lightrag::LightRagError;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn fragments(items: Vec<Result<&'static str, LightRagError>>) -> QueryStream {
        QueryStream::from_stream(stream::iter(
            items.into_iter().map(|item| item.map(str::to_string)),
        ))
    }

    #[test]
    fn test_event_wire_shapes() {
        assert_eq!(
            serde_json::to_value(StreamEvent::chunk("a")).unwrap(),
            json!({"type": "chunk", "data": "a"})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::done()).unwrap(),
            json!({"type": "done", "status": "completed"})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::Error {
                error: "boom".to_string(),
                details: None
            })
            .unwrap(),
            json!({"type": "error", "error": "boom"})
        );
        assert!(StreamEvent::chunk("x").to_line().ends_with('\n'));
    }

    #[tokio::test]
    async fn test_chunks_then_done() {
        let events: Vec<StreamEvent> = ndjson_events(fragments(vec![Ok("a"), Ok("b"), Ok("c")]), "query_text_stream".into())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::chunk("a"),
                StreamEvent::chunk("b"),
                StreamEvent::chunk("c"),
                StreamEvent::done(),
            ]
        );
    }

    #[tokio::test]
    async fn test_mid_stream_error_is_terminal() {
        let events: Vec<StreamEvent> = ndjson_events(
            fragments(vec![Ok("a"), Ok("b"), Err(LightRagError::connection("reset by peer")), Ok("c")]),
            "query_text_stream".into(),
        )
        .collect()
        .await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StreamEvent::chunk("a"));
        assert_eq!(events[1], StreamEvent::chunk("b"));
        match &events[2] {
            StreamEvent::Error { error, details } => {
                assert_eq!(error, "reset by peer");
                let details = details.as_ref().unwrap();
                assert!(details.retryable);
                assert_eq!(details.tool.as_deref(), Some("query_text_stream"));
            }
            other => panic!("expected error line, got {:?}", other),
        }
        assert!(!events.contains(&StreamEvent::done()));
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_abandoned_events_release_fragments() {
        let released = Arc::new(AtomicBool::new(false));
        let endless = stream::unfold(DropFlag(released.clone()), |flag| async move {
            Some((Ok::<_, LightRagError>("x".to_string()), flag))
        });

        let mut events = Box::pin(ndjson_events(QueryStream::from_stream(endless), "query_text_stream".into()));
        assert_eq!(events.next().await, Some(StreamEvent::chunk("x")));
        assert!(!released.load(Ordering::SeqCst));

        drop(events);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_stream_is_just_done() {
        let events: Vec<StreamEvent> = ndjson_events(fragments(vec![]), "t".into()).collect().await;
        assert_eq!(events, vec![StreamEvent::done()]);
    }
}
