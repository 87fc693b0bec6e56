//! The request/response cycle of one query.
//!
//! Both backend protocols are exposed through [`submit_query`], which yields a
//! finite sequence of [`QueryDelta`]s ending in exactly one terminal delta.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::api::sse::SseStream;
use crate::api::types::{QueryRequest, StreamRecord};
use crate::api::BackendClient;
use crate::state::Citation;

/// Text written into the assistant turn when a query fails.
pub const QUERY_ERROR_TEXT: &str = "Error: Failed to get response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryProtocol {
    /// `data: {partial, done}` records, rendered as they arrive.
    #[default]
    Streaming,
    /// One `{response, context_chunks, error?}` object after full processing.
    SingleShot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryDelta {
    /// Everything received so far, not just the newest fragment.
    Partial(String),
    Complete {
        text: String,
        citations: Vec<Citation>,
    },
    Failed,
}

impl QueryDelta {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueryDelta::Partial(_))
    }
}

/// Running buffer for the streaming protocol.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    done: bool,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `data:` payload and return the partial delta to emit.
    pub fn record(&mut self, payload: &str) -> Result<QueryDelta, serde_json::Error> {
        let record: StreamRecord = serde_json::from_str(payload)?;
        self.text.push_str(&record.partial);
        if record.done {
            self.done = true;
        }
        Ok(QueryDelta::Partial(self.text.clone()))
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Terminal delta: success as long as any content arrived.
    pub fn finish(self) -> QueryDelta {
        if self.text.trim().is_empty() {
            QueryDelta::Failed
        } else {
            QueryDelta::Complete {
                text: self.text,
                citations: Vec::new(),
            }
        }
    }
}

/// Spawn the query and hand back its delta sequence.
pub fn submit_query(
    client: BackendClient,
    request: QueryRequest,
    protocol: QueryProtocol,
) -> mpsc::UnboundedReceiver<QueryDelta> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        run_query(&client, &request, protocol, &tx).await;
    });
    rx
}

/// Run one query to completion, sending partial deltas and then exactly one
/// terminal delta on `tx`.
pub async fn run_query(
    client: &BackendClient,
    request: &QueryRequest,
    protocol: QueryProtocol,
    tx: &mpsc::UnboundedSender<QueryDelta>,
) {
    log::info!(
        "Sending query over {} documents ({:?})",
        request.pdfs.len(),
        protocol
    );

    let terminal = match protocol {
        QueryProtocol::Streaming => stream_query(client, request, tx).await,
        QueryProtocol::SingleShot => single_shot_query(client, request).await,
    };

    if terminal == QueryDelta::Failed {
        log::warn!("Query settled with an error");
    }
    let _ = tx.send(terminal);
}

async fn stream_query(
    client: &BackendClient,
    request: &QueryRequest,
    tx: &mpsc::UnboundedSender<QueryDelta>,
) -> QueryDelta {
    let response = match client.query_stream(request).await {
        Ok(response) => response,
        Err(err) => {
            log::error!("Query request failed: {}", err);
            return QueryDelta::Failed;
        }
    };

    let mut records = SseStream::new(response.bytes_stream());
    let mut accumulator = StreamAccumulator::new();

    while let Some(item) = records.next_data().await {
        let payload = match item {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Read error on query stream: {}", err);
                break;
            }
        };
        match accumulator.record(&payload) {
            Ok(delta) => {
                let _ = tx.send(delta);
                if accumulator.is_done() {
                    break;
                }
            }
            Err(err) => {
                log::warn!("Malformed query record {:?}: {}", payload, err);
                break;
            }
        }
    }

    accumulator.finish()
}

async fn single_shot_query(client: &BackendClient, request: &QueryRequest) -> QueryDelta {
    match client.query_single_shot(request).await {
        Ok(body) if body.is_error() => {
            log::warn!("Backend flagged the query as failed");
            QueryDelta::Failed
        }
        Ok(body) => QueryDelta::Complete {
            text: body.response,
            citations: body.context_chunks.into_iter().map(Citation::from).collect(),
        },
        Err(err) => {
            log::error!("Query request failed: {}", err);
            QueryDelta::Failed
        }
    }
}
