pub mod client;
pub mod sse;
pub mod types;

pub use client::BackendClient;
pub use sse::{SseLineDecoder, SseStream};
pub use types::{ContextChunk, ModelsResponse, QueryRequest, SingleShotResponse, StreamRecord};
