use policybot_core::upload::{
    run_upload, UploadKind, NOT_A_PDF, PROCESSING_COMPLETE, PROCESSING_FAILED,
    UPLOADED_PROCESSING,
};
use policybot_core::{
    start_upload, BackendClient, DocumentStore, UploadEvent, UploadFile, UploadTracker,
};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Ignores the error if another test already installed a logger.
fn init_logging() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
    let _ = TermLogger::init(
        log::LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, "application/pdf", b"%PDF-1.4".to_vec())
}

async fn collect(client: BackendClient, file: UploadFile) -> Vec<UploadEvent> {
    let mut rx = start_upload(client, file);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

async fn mount_upload(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/pdf/upload"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_processing(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/pdf/process/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn new_upload_is_processed_and_listed() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(201).set_body_json(json!({"filename": "a.pdf"})),
    )
    .await;
    mount_processing(&server, "a.pdf", "data: Extracting text\n\ndata: done\n\n").await;

    let events = collect(BackendClient::new(&server.uri()), pdf("a.pdf")).await;
    assert!(matches!(
        &events[0],
        UploadEvent::Accepted(accepted) if accepted.kind == UploadKind::Created
    ));
    assert_eq!(events[1], UploadEvent::Progress("Extracting text".to_string()));
    assert_eq!(
        events[2],
        UploadEvent::Completed {
            filename: "a.pdf".to_string(),
            add_to_list: true
        }
    );
    assert_eq!(events.len(), 3);

    let mut store = DocumentStore::new(false);
    store.apply_listing(vec!["old.pdf".to_string()]);
    let mut tracker = UploadTracker::new();
    tracker.begin();
    for event in events {
        if let Some(name) = tracker.apply(event) {
            store.add_uploaded(&name);
        }
    }
    assert_eq!(tracker.status().message(), PROCESSING_COMPLETE);
    assert_eq!(store.checked_names(), vec!["a.pdf"]);
}

#[tokio::test]
async fn resumed_upload_is_not_added_again() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"filename": "a.pdf", "message": "Resuming processing"})),
    )
    .await;
    mount_processing(&server, "a.pdf", "data: done\n").await;

    let events = collect(BackendClient::new(&server.uri()), pdf("a.pdf")).await;
    match &events[0] {
        UploadEvent::Accepted(accepted) => {
            assert_eq!(accepted.kind, UploadKind::Resumed);
            assert_eq!(accepted.message.as_deref(), Some("Resuming processing"));
        }
        other => panic!("unexpected first event {other:?}"),
    }

    let mut tracker = UploadTracker::new();
    tracker.begin();
    tracker.apply(events[0].clone());
    assert_eq!(tracker.status().message(), "Resuming processing");
    assert_eq!(
        events.last(),
        Some(&UploadEvent::Completed {
            filename: "a.pdf".to_string(),
            add_to_list: false
        })
    );
}

#[tokio::test]
async fn conflict_shows_server_detail_verbatim() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(409).set_body_json(json!({"detail": "File X exists"})),
    )
    .await;

    let events = collect(BackendClient::new(&server.uri()), pdf("x.pdf")).await;
    assert_eq!(events, vec![UploadEvent::Failed("File X exists".to_string())]);
}

#[tokio::test]
async fn bad_request_without_detail_uses_fallback() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(400)).await;

    let events = collect(BackendClient::new(&server.uri()), pdf("x.pdf")).await;
    assert_eq!(
        events,
        vec![UploadEvent::Failed(
            "Invalid file format. Please upload a PDF.".to_string()
        )]
    );
}

#[tokio::test]
async fn non_pdf_never_calls_the_endpoint() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pdf/upload"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let file = UploadFile::new("notes.txt", "text/plain", b"hi".to_vec());
    let (tx, mut rx) = mpsc::unbounded_channel();
    run_upload(&BackendClient::new(&server.uri()), &file, &tx).await;
    drop(tx);

    assert_eq!(rx.recv().await, Some(UploadEvent::Failed(NOT_A_PDF.to_string())));
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn processing_error_message_is_terminal() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(201).set_body_json(json!({"filename": "a.pdf"})),
    )
    .await;
    mount_processing(
        &server,
        "a.pdf",
        "data: Chunking\n\ndata: Error: could not parse page 2\n\ndata: done\n\n",
    )
    .await;

    let events = collect(BackendClient::new(&server.uri()), pdf("a.pdf")).await;
    assert_eq!(
        events.last(),
        Some(&UploadEvent::Failed("Error: could not parse page 2".to_string()))
    );
    assert!(!events.iter().any(|e| matches!(e, UploadEvent::Completed { .. })));
}

#[tokio::test]
async fn processing_stream_ending_early_fails() {
    init_logging();
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(201).set_body_json(json!({"filename": "a.pdf"})),
    )
    .await;
    mount_processing(&server, "a.pdf", "data: Chunking\n\n").await;

    let mut tracker = UploadTracker::new();
    tracker.begin();
    let mut messages = Vec::new();
    for event in collect(BackendClient::new(&server.uri()), pdf("a.pdf")).await {
        tracker.apply(event);
        messages.push(tracker.status().message().to_string());
    }
    assert_eq!(messages, vec![UPLOADED_PROCESSING, "Chunking", PROCESSING_FAILED]);
}
