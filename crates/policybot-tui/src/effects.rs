//! Backend calls spawned off the UI task.
//!
//! Every call runs on its own tokio task and reports back through the event
//! loop's sender as an [`AppEvent::Backend`].

use std::path::PathBuf;

use policybot_core::api::{ModelsResponse, QueryRequest};
use policybot_core::upload::{start_upload, UploadEvent, UploadFile};
use policybot_core::{submit_query, ApiError, BackendClient, QueryDelta, QueryProtocol, SessionId, TurnId};
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

#[derive(Debug)]
pub enum BackendEvent {
    DocumentsLoaded(Result<Vec<String>, String>),
    Query { turn: TurnId, delta: QueryDelta },
    Suggestions(Vec<String>),
    Upload(UploadEvent),
    Deleted { name: String, result: Result<(), String> },
    Summary { filename: String, result: Result<String, String> },
    SourcesSummary(Result<String, String>),
    Models(Result<ModelsResponse, String>),
    ModelSet { name: String, result: Result<(), String> },
}

pub const LOAD_DOCUMENTS_FAILED: &str = "Failed to load documents.";

fn send(tx: &UnboundedSender<AppEvent>, event: BackendEvent) {
    // The loop is gone once the app quits; late results are dropped.
    let _ = tx.send(AppEvent::Backend(event));
}

pub fn delete_error_message(name: &str, err: &ApiError) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Failed to delete {}.", name))
}

pub fn load_documents(client: &BackendClient, tx: &UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.list_documents().await.map_err(|err| {
            log::error!("Listing documents failed: {}", err);
            LOAD_DOCUMENTS_FAILED.to_string()
        });
        send(&tx, BackendEvent::DocumentsLoaded(result));
    });
}

/// Forward the delta sequence of one query, tagged with its placeholder turn.
pub fn run_query(
    client: &BackendClient,
    tx: &UnboundedSender<AppEvent>,
    turn: TurnId,
    request: QueryRequest,
    protocol: QueryProtocol,
) {
    let mut deltas = submit_query(client.clone(), request, protocol);
    let tx = tx.clone();
    tokio::spawn(async move {
        while let Some(delta) = deltas.recv().await {
            send(&tx, BackendEvent::Query { turn, delta });
        }
    });
}

pub fn fetch_suggestions(client: &BackendClient, tx: &UnboundedSender<AppEvent>, session: &SessionId) {
    let client = client.clone();
    let tx = tx.clone();
    let session = session.clone();
    tokio::spawn(async move {
        let suggestions = client.suggested_queries(&session).await.unwrap_or_else(|err| {
            log::warn!("Suggested queries unavailable: {}", err);
            Vec::new()
        });
        send(&tx, BackendEvent::Suggestions(suggestions));
    });
}

/// Read the file at `path`, then run the upload-and-process cycle.
pub fn upload(client: &BackendClient, tx: &UnboundedSender<AppEvent>, path: PathBuf) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let file = match UploadFile::read(&path).await {
            Ok(file) => file,
            Err(err) => {
                log::warn!("Could not read {}: {}", path.display(), err);
                let message = format!("Could not read {}.", path.display());
                send(&tx, BackendEvent::Upload(UploadEvent::Failed(message)));
                return;
            }
        };
        let mut events = start_upload(client, file);
        while let Some(event) = events.recv().await {
            send(&tx, BackendEvent::Upload(event));
        }
    });
}

pub fn delete_document(client: &BackendClient, tx: &UnboundedSender<AppEvent>, name: String) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.delete_document(&name).await.map_err(|err| {
            log::warn!("Deleting {} failed: {}", name, err);
            delete_error_message(&name, &err)
        });
        send(&tx, BackendEvent::Deleted { name, result });
    });
}

pub fn fetch_summary(client: &BackendClient, tx: &UnboundedSender<AppEvent>, filename: String) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client
            .document_summary(&filename)
            .await
            .map_err(|err| err.to_string());
        send(&tx, BackendEvent::Summary { filename, result });
    });
}

pub fn fetch_sources_summary(client: &BackendClient, tx: &UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.sources_summary().await.map_err(|err| {
            log::warn!("Sources summary unavailable: {}", err);
            err.to_string()
        });
        send(&tx, BackendEvent::SourcesSummary(result));
    });
}

pub fn fetch_models(client: &BackendClient, tx: &UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.models().await.map_err(|err| {
            log::warn!("Model list unavailable: {}", err);
            "Failed to load models.".to_string()
        });
        send(&tx, BackendEvent::Models(result));
    });
}

pub fn set_model(client: &BackendClient, tx: &UnboundedSender<AppEvent>, name: String) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.set_model(&name).await.map_err(|err| {
            log::error!("Switching model to {} failed: {}", name, err);
            format!("Failed to switch model to {}.", name)
        });
        send(&tx, BackendEvent::ModelSet { name, result });
    });
}
