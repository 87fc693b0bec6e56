//! Upload-then-process flow for new documents.
//!
//! The upload request must finish before the processing channel is opened;
//! progress strings are relayed until `"done"` or an `"Error:"` message.

use std::path::Path;
use tokio::sync::mpsc;

use crate::api::sse::SseStream;
use crate::api::BackendClient;
use crate::error::ApiError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub const NOT_A_PDF: &str = "Please select a PDF file.";
pub const UPLOADING: &str = "Uploading...";
pub const UPLOADED_PROCESSING: &str = "File uploaded! Processing...";
pub const PROCESSING_COMPLETE: &str = "Processing complete!";
pub const PROCESSING_FAILED: &str = "Processing failed.";
pub const INVALID_FORMAT: &str = "Invalid file format. Please upload a PDF.";
pub const ALREADY_EXISTS: &str = "File already exists.";
pub const UPLOAD_FAILED: &str = "Failed to upload file.";
pub const UPLOAD_ERROR: &str = "An error occurred while uploading.";

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    /// Content type follows the file extension.
    pub fn from_path(path: &Path, bytes: Vec<u8>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        let content_type = if is_pdf {
            PDF_CONTENT_TYPE
        } else {
            "application/octet-stream"
        };
        Self::new(&name, content_type, bytes)
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_path(path, bytes))
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
    }
}

/// Client-side check run before any network call.
pub fn validate(file: &UploadFile) -> Result<(), &'static str> {
    if file.is_pdf() {
        Ok(())
    } else {
        Err(NOT_A_PDF)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// 201: a brand new document.
    Created,
    /// 200: the backend already has part of it and resumes processing.
    Resumed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAccepted {
    pub filename: String,
    pub kind: UploadKind,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Accepted(UploadAccepted),
    Progress(String),
    Completed { filename: String, add_to_list: bool },
    Failed(String),
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Completed { .. } | UploadEvent::Failed(_))
    }
}

/// User-facing text for a rejected upload request.
pub fn upload_error_message(err: &ApiError) -> String {
    match err.status() {
        Some(400) => err.detail().unwrap_or(INVALID_FORMAT).to_string(),
        Some(409) => err.detail().unwrap_or(ALREADY_EXISTS).to_string(),
        Some(_) => UPLOAD_FAILED.to_string(),
        None => UPLOAD_ERROR.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingMessage {
    Done,
    Error(String),
    Progress(String),
}

impl ProcessingMessage {
    pub fn classify(payload: &str) -> Self {
        if payload == "done" {
            ProcessingMessage::Done
        } else if payload.starts_with("Error:") {
            ProcessingMessage::Error(payload.to_string())
        } else {
            ProcessingMessage::Progress(payload.to_string())
        }
    }
}

/// Spawn an upload and hand back its event sequence.
pub fn start_upload(client: BackendClient, file: UploadFile) -> mpsc::UnboundedReceiver<UploadEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        run_upload(&client, &file, &tx).await;
    });
    rx
}

/// Validate, upload, then relay processing progress. Always ends with one
/// terminal event.
pub async fn run_upload(
    client: &BackendClient,
    file: &UploadFile,
    tx: &mpsc::UnboundedSender<UploadEvent>,
) {
    if let Err(message) = validate(file) {
        let _ = tx.send(UploadEvent::Failed(message.to_string()));
        return;
    }

    log::info!("Uploading {} ({} bytes)", file.name, file.bytes.len());
    let accepted = match client.upload_document(file).await {
        Ok(accepted) => accepted,
        Err(err) => {
            log::warn!("Upload of {} rejected: {}", file.name, err);
            let _ = tx.send(UploadEvent::Failed(upload_error_message(&err)));
            return;
        }
    };

    let _ = tx.send(UploadEvent::Accepted(accepted.clone()));
    let terminal = follow_processing(client, &accepted, tx).await;
    let _ = tx.send(terminal);
}

async fn follow_processing(
    client: &BackendClient,
    accepted: &UploadAccepted,
    tx: &mpsc::UnboundedSender<UploadEvent>,
) -> UploadEvent {
    let response = match client.processing_events(&accepted.filename).await {
        Ok(response) => response,
        Err(err) => {
            log::error!("Could not open processing stream for {}: {}", accepted.filename, err);
            return UploadEvent::Failed(PROCESSING_FAILED.to_string());
        }
    };

    let mut events = SseStream::new(response.bytes_stream());
    while let Some(item) = events.next_data().await {
        let payload = match item {
            Ok(payload) => payload,
            Err(err) => {
                log::error!("Processing stream for {} broke: {}", accepted.filename, err);
                return UploadEvent::Failed(PROCESSING_FAILED.to_string());
            }
        };
        match ProcessingMessage::classify(&payload) {
            ProcessingMessage::Done => {
                log::info!("Processing of {} finished", accepted.filename);
                return UploadEvent::Completed {
                    filename: accepted.filename.clone(),
                    add_to_list: accepted.kind == UploadKind::Created,
                };
            }
            ProcessingMessage::Error(message) => {
                log::warn!("Processing of {} failed: {}", accepted.filename, message);
                return UploadEvent::Failed(message);
            }
            ProcessingMessage::Progress(message) => {
                log::debug!("Processing {}: {}", accepted.filename, message);
                let _ = tx.send(UploadEvent::Progress(message));
            }
        }
    }

    log::warn!("Processing stream for {} ended without a result", accepted.filename);
    UploadEvent::Failed(PROCESSING_FAILED.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Processing(String),
    Succeeded(String),
    Failed(String),
}

impl UploadStatus {
    pub fn message(&self) -> &str {
        match self {
            UploadStatus::Idle => "",
            UploadStatus::Uploading => UPLOADING,
            UploadStatus::Processing(message)
            | UploadStatus::Succeeded(message)
            | UploadStatus::Failed(message) => message,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, UploadStatus::Uploading | UploadStatus::Processing(_))
    }
}

/// Folds upload events into the status line shown to the user.
#[derive(Debug, Default)]
pub struct UploadTracker {
    status: UploadStatus,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    /// Returns false while another upload is still running.
    pub fn begin(&mut self) -> bool {
        if self.status.is_busy() {
            return false;
        }
        self.status = UploadStatus::Uploading;
        true
    }

    pub fn reject(&mut self, message: &str) {
        self.status = UploadStatus::Failed(message.to_string());
    }

    pub fn reset(&mut self) {
        if !self.status.is_busy() {
            self.status = UploadStatus::Idle;
        }
    }

    /// Apply one event; returns the document name to add to the list once
    /// a new document finished processing.
    pub fn apply(&mut self, event: UploadEvent) -> Option<String> {
        match event {
            UploadEvent::Accepted(accepted) => {
                // A resumed upload carries the backend's own wording
                let message = accepted
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UPLOADED_PROCESSING.to_string());
                self.status = UploadStatus::Processing(message);
                None
            }
            UploadEvent::Progress(message) => {
                self.status = UploadStatus::Processing(message);
                None
            }
            UploadEvent::Completed {
                filename,
                add_to_list,
            } => {
                self.status = UploadStatus::Succeeded(PROCESSING_COMPLETE.to_string());
                add_to_list.then_some(filename)
            }
            UploadEvent::Failed(message) => {
                self.status = UploadStatus::Failed(message);
                None
            }
        }
    }
}
