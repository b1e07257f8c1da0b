//! Provider-agnostic LLM client (spec.md §4.5): sync JSON-structured
//! generation plus an async streaming variant, both fronting Anthropic
//! or Vertex AI behind the same contract.

pub mod client;
pub mod error;
pub mod streaming;

pub use client::{parse_best_effort_json, HttpLlmClient, LlmClient};
pub use error::classify;
pub use streaming::{drive_stream, RawEvent, StreamChunk, StreamChunkMetadata};
