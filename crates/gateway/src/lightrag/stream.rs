//! Streaming query responses
//!
//! `QueryStream` turns a chunked HTTP body into text fragments as they
//! arrive. It is single-pass: fragments are yielded once, in order, and
//! dropping the stream drops the underlying response, which closes the
//! backend connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use super::error::{LightRagError, LightRagResult};

/// Lazy sequence of text fragments from a streaming query
pub struct QueryStream {
    inner: BoxStream<'static, LightRagResult<String>>,
}

impl QueryStream {
    /// Wrap a live backend response
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::from_bytes(response.bytes_stream().map(|chunk| chunk.map_err(LightRagError::from)))
    }

    /// Decode a raw byte stream into text fragments
    pub fn from_bytes<S>(bytes: S) -> Self
    where
        S: Stream<Item = LightRagResult<Bytes>> + Send + 'static,
    {
        let state = DecodeState {
            bytes: bytes.boxed(),
            decoder: Utf8Decoder::default(),
            finished: false,
        };

        let fragments = stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            loop {
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = state.decoder.decode(&chunk);
                        if text.trim().is_empty() {
                            continue;
                        }
                        return Some((Ok(text), state));
                    }
                    Some(Err(err)) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                    None => {
                        state.finished = true;
                        let rest = state.decoder.finish();
                        if rest.trim().is_empty() {
                            return None;
                        }
                        return Some((Ok(rest), state));
                    }
                }
            }
        });

        Self {
            inner: fragments.boxed(),
        }
    }

    /// Wrap an already-decoded fragment stream
    pub fn from_stream<S>(fragments: S) -> Self
    where
        S: Stream<Item = LightRagResult<String>> + Send + 'static,
    {
        Self {
            inner: fragments.boxed(),
        }
    }

    /// Drain the stream, concatenating every fragment
    pub async fn collect_text(mut self) -> LightRagResult<String> {
        let mut out = String::new();
        while let Some(fragment) = self.inner.next().await {
            out.push_str(&fragment?);
        }
        Ok(out)
    }
}

impl Stream for QueryStream {
    type Item = LightRagResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for QueryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStream").finish_non_exhaustive()
    }
}

struct DecodeState {
    bytes: BoxStream<'static, LightRagResult<Bytes>>,
    decoder: Utf8Decoder,
    finished: bool,
}

/// Incremental UTF-8 decoder holding back incomplete trailing sequences
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        // Incomplete sequence at the end: wait for the next chunk
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn byte_stream(chunks: Vec<&'static [u8]>) -> impl Stream<Item = LightRagResult<Bytes>> {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_source() {
        let released = Arc::new(AtomicBool::new(false));
        let endless = stream::unfold(DropFlag(released.clone()), |flag| async move {
            Some((Ok::<_, LightRagError>(Bytes::from_static(b"tick")), flag))
        });

        let mut stream = QueryStream::from_bytes(endless);
        assert_eq!(stream.next().await.unwrap().unwrap(), "tick");
        assert!(!released.load(Ordering::SeqCst));

        drop(stream);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fragments_in_order() {
        let stream = QueryStream::from_bytes(byte_stream(vec![b"a", b"b", b"c"]));
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_split_multibyte_sequence() {
        // "é" is 0xC3 0xA9
        let stream = QueryStream::from_bytes(byte_stream(vec![b"caf\xC3", b"\xA9 ok"]));
        assert_eq!(stream.collect_text().await.unwrap(), "café ok");
    }

    #[tokio::test]
    async fn test_blank_fragments_skipped() {
        let stream = QueryStream::from_bytes(byte_stream(vec![b"one", b"\n", b"  ", b"two"]));
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_invalid_bytes_replaced() {
        let stream = QueryStream::from_bytes(byte_stream(vec![b"x\xFFy"]));
        assert_eq!(stream.collect_text().await.unwrap(), "x\u{FFFD}y");
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(LightRagError::connection("reset")),
            Ok(Bytes::from_static(b"never")),
        ]);
        let mut stream = QueryStream::from_bytes(chunks);

        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_collect_text_propagates_error() {
        let fragments = stream::iter(vec![
            Ok("a".to_string()),
            Err(LightRagError::timeout("slow")),
        ]);
        let err = QueryStream::from_stream(fragments).collect_text().await.unwrap_err();
        assert_eq!(err.kind, lightrag_mcp_shared::ErrorKind::Timeout);
    }
}
