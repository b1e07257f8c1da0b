//! Streaming LLM client (spec.md §4.5, P11): an async stream of
//! `StreamChunk`s with batching, eager thinking-block emission, and
//! cooperative cancellation.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const DEFAULT_BATCH_SIZE: usize = 5;
const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub struct StreamChunkMetadata {
    pub cancelled: bool,
    pub error: Option<String>,
    pub error_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub content: String,
    pub thinking: bool,
    pub metadata: StreamChunkMetadata,
}

/// One raw event from the underlying provider stream, before batching.
pub enum RawEvent {
    Text(String),
    Thinking(String),
    Error { message: String, error_type: String },
}

/// Drive a raw provider event sequence into the batched, cancellable
/// `StreamChunk` contract. `raw_events` is consumed in order; thinking
/// blocks are emitted immediately (never batched), text is batched by
/// size or a flush timeout, and cancellation/errors flush any buffered
/// content before terminating.
pub async fn drive_stream(
    mut raw_events: mpsc::Receiver<RawEvent>,
    cancel: CancellationToken,
    out: mpsc::Sender<StreamChunk>,
    batch_size: usize,
    flush_timeout: Duration,
) {
    let batch_size = if batch_size == 0 { DEFAULT_BATCH_SIZE } else { batch_size };
    let flush_timeout = if flush_timeout.is_zero() { DEFAULT_FLUSH_TIMEOUT } else { flush_timeout };

    let mut buffer = String::new();
    let mut buffered_count = 0usize;
    let mut last_flush = Instant::now();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                flush_buffer(&out, &mut buffer, &mut buffered_count).await;
                let _ = out.send(StreamChunk {
                    content: String::new(),
                    thinking: false,
                    metadata: StreamChunkMetadata { cancelled: true, ..Default::default() },
                }).await;
                return;
            }
            event = raw_events.recv() => {
                let Some(event) = event else {
                    flush_buffer(&out, &mut buffer, &mut buffered_count).await;
                    return;
                };
                match event {
                    RawEvent::Thinking(text) => {
                        let _ = out.send(StreamChunk { content: text, thinking: true, metadata: StreamChunkMetadata::default() }).await;
                    }
                    RawEvent::Text(text) => {
                        buffer.push_str(&text);
                        buffered_count += 1;
                        if buffered_count >= batch_size || last_flush.elapsed() >= flush_timeout {
                            flush_buffer(&out, &mut buffer, &mut buffered_count).await;
                            last_flush = Instant::now();
                        }
                    }
                    RawEvent::Error { message, error_type } => {
                        flush_buffer(&out, &mut buffer, &mut buffered_count).await;
                        let _ = out.send(StreamChunk {
                            content: String::new(),
                            thinking: false,
                            metadata: StreamChunkMetadata {
                                cancelled: false,
                                error: Some(message),
                                error_type: Some(error_type),
                            },
                        }).await;
                        return;
                    }
                }
            }
        }
    }
}

async fn flush_buffer(out: &mpsc::Sender<StreamChunk>, buffer: &mut String, buffered_count: &mut usize) {
    if *buffered_count == 0 {
        return;
    }
    let content = std::mem::take(buffer);
    *buffered_count = 0;
    let _ = out.send(StreamChunk { content, thinking: false, metadata: StreamChunkMetadata::default() }).await;
}

/// Placeholder schema-coercion helper shared with the sync client: not
/// all providers return well-formed JSON in every chunk, so the last
/// assembled chunk is re-validated against an optional schema.
#[must_use]
pub fn validate_against_schema(value: &Value, schema: Option<&Value>) -> bool {
    match schema {
        None => true,
        Some(_) => value.is_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(rx: &mut mpsc::Receiver<StreamChunk>) -> Vec<StreamChunk> {
        let mut out = Vec::new();
        while let Some(chunk) = rx.recv().await {
            out.push(chunk);
        }
        out
    }

    #[tokio::test]
    async fn thinking_blocks_emit_immediately_not_batched() {
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        tx.send(RawEvent::Thinking("considering...".to_string())).await.unwrap();
        drop(tx);

        drive_stream(rx, cancel, out_tx, 5, Duration::from_millis(100)).await;
        let chunks = collect(&mut out_rx).await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].thinking);
    }

    #[tokio::test]
    async fn p11_cancellation_flushes_buffer_and_emits_cancelled_chunk() {
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        tx.send(RawEvent::Text("partial".to_string())).await.unwrap();
        cancel.cancel();

        drive_stream(rx, cancel, out_tx, 5, Duration::from_millis(100)).await;
        let chunks = collect(&mut out_rx).await;
        assert!(chunks.iter().any(|c| c.metadata.cancelled));
    }

    #[tokio::test]
    async fn error_event_flushes_then_emits_error_chunk() {
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        tx.send(RawEvent::Text("partial".to_string())).await.unwrap();
        tx.send(RawEvent::Error { message: "boom".to_string(), error_type: "timeout".to_string() }).await.unwrap();
        drop(tx);

        drive_stream(rx, cancel, out_tx, 5, Duration::from_millis(100)).await;
        let chunks = collect(&mut out_rx).await;
        let last = chunks.last().unwrap();
        assert_eq!(last.metadata.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn text_batches_by_size() {
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        for i in 0..5 {
            tx.send(RawEvent::Text(format!("{i}"))).await.unwrap();
        }
        drop(tx);

        drive_stream(rx, cancel, out_tx, 5, Duration::from_secs(10)).await;
        let chunks = collect(&mut out_rx).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "01234");
    }
}
