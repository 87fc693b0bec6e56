use std::path::PathBuf;

use policybot_core::layout::SOURCES_PANE;
use policybot_core::upload::{validate, UploadFile};
use policybot_core::{
    AccessContext, Applied, BackendClient, Config, Conversation, DocumentStore, DragOutcome,
    ModelCatalog, PanelController, QueryProtocol, ResizablePane, ResizeEdge, SessionId,
    SubmitRejected, SummaryState, UploadTracker,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use crate::effects::{self, BackendEvent};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sources,
    Chat,
    Panel,
}

/// Border currently grabbed with the mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Sources,
    Panel,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub access: AccessContext,
    pub protocol: QueryProtocol,
    pub config_path: Option<PathBuf>,
    client: BackendClient,
    events: UnboundedSender<AppEvent>,

    // Sources pane
    pub documents: DocumentStore,
    pub documents_state: ListState,
    pub sources_pane: ResizablePane,

    // Conversation
    pub conversation: Conversation,
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub pinned_revision: Option<u64>,
    pub sources_summary: Option<SummaryState>,

    // Auxiliary panel
    pub panel: PanelController,

    // Upload popup
    pub upload: UploadTracker,
    pub show_upload_input: bool,
    pub upload_input: String,

    // Delete confirmation
    pub pending_delete: Option<String>,

    // Model picker (admin only)
    pub models: ModelCatalog,
    pub show_model_picker: bool,
    pub model_picker_state: ListState,

    pub status: Option<String>,
    pub animation_frame: u8,

    // Pane areas for mouse hit-testing (updated during render)
    pub sources_area: Option<Rect>,
    pub chat_area: Option<Rect>,
    pub panel_area: Option<Rect>,
    pub terminal_width: u16,
    pub dragging: Option<DragTarget>,
}

impl App {
    pub fn new(config: &Config, access: AccessContext, events: UnboundedSender<AppEvent>) -> Self {
        let client = BackendClient::new(&config.backend_url);
        log::info!(
            "Starting session against {} (admin: {})",
            client.base_url(),
            access.is_admin
        );

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Sources,
            access,
            protocol: config.query_protocol,
            config_path: Config::get_config_path().ok(),
            client,
            events,

            documents: DocumentStore::new(config.auto_select_documents),
            documents_state: ListState::default(),
            sources_pane: ResizablePane::new(SOURCES_PANE, ResizeEdge::Right),

            conversation: Conversation::new(SessionId::new()),
            query_input: String::new(),
            query_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            pinned_revision: None,
            sources_summary: None,

            panel: PanelController::new(),

            upload: UploadTracker::new(),
            show_upload_input: false,
            upload_input: String::new(),

            pending_delete: None,

            models: ModelCatalog::new(),
            show_model_picker: false,
            model_picker_state: ListState::default(),

            status: None,
            animation_frame: 0,

            sources_area: None,
            chat_area: None,
            panel_area: None,
            terminal_width: 0,
            dragging: None,
        }
    }

    /// Kick off the start-up fetches.
    pub fn start(&mut self) {
        effects::load_documents(&self.client, &self.events);
        if self.conversation.is_empty() {
            self.sources_summary = Some(SummaryState::Loading);
            effects::fetch_sources_summary(&self.client, &self.events);
        }
        if self.access.can_pick_model() {
            effects::fetch_models(&self.client, &self.events);
        }
    }

    // Sources navigation
    pub fn selected_document(&self) -> Option<&str> {
        self.documents_state
            .selected()
            .and_then(|i| self.documents.documents().get(i))
            .map(|doc| doc.name.as_str())
    }

    pub fn sources_nav_down(&mut self) {
        let len = self.documents.len();
        if len > 0 {
            let i = self.documents_state.selected().unwrap_or(0);
            self.documents_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn sources_nav_up(&mut self) {
        let i = self.documents_state.selected().unwrap_or(0);
        self.documents_state.select(Some(i.saturating_sub(1)));
    }

    fn clamp_document_selection(&mut self) {
        let len = self.documents.len();
        if len == 0 {
            self.documents_state.select(None);
        } else {
            let i = self.documents_state.selected().unwrap_or(0);
            self.documents_state.select(Some(i.min(len - 1)));
        }
    }

    pub fn toggle_selected_document(&mut self) {
        if let Some(name) = self.selected_document().map(str::to_string) {
            self.documents.toggle(&name);
        }
    }

    /// Open the highlighted document in the auxiliary panel.
    pub fn open_selected_document(&mut self) {
        let Some(name) = self.selected_document().map(str::to_string) else {
            return;
        };
        if self.panel.select_document(&name) {
            effects::fetch_summary(&self.client, &self.events, name);
        }
        self.focus = FocusPane::Panel;
    }

    pub fn close_panel(&mut self) {
        self.panel.close();
        if self.focus == FocusPane::Panel {
            self.focus = FocusPane::Sources;
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Sources => FocusPane::Chat,
            FocusPane::Chat if self.panel.is_open() => FocusPane::Panel,
            FocusPane::Chat | FocusPane::Panel => FocusPane::Sources,
        };
    }

    // Query
    pub fn submit_query(&mut self) {
        let checked = self.documents.checked_names();
        let model = self.models.override_for_query(self.access);
        match self.conversation.begin_query(&self.query_input, &checked, model) {
            Ok(pending) => {
                self.query_input.clear();
                self.query_cursor = 0;
                self.input_mode = InputMode::Normal;
                effects::run_query(
                    &self.client,
                    &self.events,
                    pending.assistant_turn,
                    pending.request,
                    self.protocol,
                );
            }
            Err(SubmitRejected::QueryInFlight) => {
                log::debug!("Ignoring submit while a query is in flight");
            }
            Err(reason) => {
                log::debug!("Submit rejected: {:?}", reason);
            }
        }
    }

    /// Switch between streamed and single-shot answers and remember the
    /// choice for the next run.
    pub fn toggle_protocol(&mut self) {
        self.protocol = match self.protocol {
            QueryProtocol::Streaming => QueryProtocol::SingleShot,
            QueryProtocol::SingleShot => QueryProtocol::Streaming,
        };
        if let Some(path) = &self.config_path {
            if let Err(err) = Config::save_query_protocol(path, self.protocol) {
                log::warn!("Could not save query protocol: {}", err);
            }
        }
        self.status = Some(
            match self.protocol {
                QueryProtocol::Streaming => "Answers will stream as they arrive.",
                QueryProtocol::SingleShot => "Answers will arrive in one piece.",
            }
            .to_string(),
        );
    }

    /// Copy the n-th suggested query into the input box.
    pub fn use_suggestion(&mut self, index: usize) {
        if let Some(suggestion) = self.conversation.suggestions().get(index) {
            self.query_input = suggestion.clone();
            self.query_cursor = self.query_input.chars().count();
            self.input_mode = InputMode::Editing;
            self.focus = FocusPane::Chat;
        }
    }

    // Upload
    pub fn open_upload_input(&mut self) {
        if self.upload.status().is_busy() {
            return;
        }
        self.upload.reset();
        self.show_upload_input = true;
        self.upload_input.clear();
    }

    pub fn begin_upload(&mut self) {
        let raw = self.upload_input.trim().to_string();
        self.show_upload_input = false;
        self.upload_input.clear();
        if raw.is_empty() {
            return;
        }

        let path = PathBuf::from(raw);
        let probe = UploadFile::from_path(&path, Vec::new());
        if let Err(message) = validate(&probe) {
            self.upload.reject(message);
            return;
        }
        if self.upload.begin() {
            effects::upload(&self.client, &self.events, path);
        }
    }

    // Delete
    pub fn request_delete(&mut self) {
        self.pending_delete = self.selected_document().map(str::to_string);
    }

    pub fn confirm_delete(&mut self) {
        if let Some(name) = self.pending_delete.take() {
            effects::delete_document(&self.client, &self.events, name);
        }
    }

    // Models
    pub fn open_model_picker(&mut self) {
        if !self.access.can_pick_model() {
            return;
        }
        self.show_model_picker = true;
        self.model_picker_state.select(self.models.selected_index().or(Some(0)));
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.models.supported().len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        let Some(name) = self
            .model_picker_state
            .selected()
            .and_then(|i| self.models.supported().get(i))
            .cloned()
        else {
            return;
        };
        self.show_model_picker = false;
        if self.models.select(&name) {
            effects::set_model(&self.client, &self.events, name);
        }
    }

    // Pane geometry
    pub fn end_drag(&mut self) {
        match self.dragging.take() {
            Some(DragTarget::Sources) => {
                if self.sources_pane.end_drag() == DragOutcome::Collapsed {
                    log::debug!("Sources pane collapsed");
                }
            }
            Some(DragTarget::Panel) => {
                if self.panel.end_drag() == DragOutcome::Collapsed && self.focus == FocusPane::Panel {
                    self.focus = FocusPane::Sources;
                }
            }
            None => {}
        }
    }

    // Chat scrolling
    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Re-pin the transcript to its newest turn on the next render.
    pub fn follow_transcript(&mut self) {
        self.pinned_revision = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Text for the footer status slot: upload progress wins over other
    /// messages.
    pub fn status_line(&self) -> Option<&str> {
        let upload = self.upload.status().message();
        if !upload.is_empty() {
            Some(upload)
        } else {
            self.status.as_deref()
        }
    }

    pub fn apply_backend(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::DocumentsLoaded(Ok(names)) => {
                self.documents.apply_listing(names);
                self.clamp_document_selection();
            }
            BackendEvent::DocumentsLoaded(Err(message)) => {
                self.status = Some(message);
            }
            BackendEvent::Query { turn, delta } => {
                if let Applied::Settled(outcome) = self.conversation.apply(turn, delta) {
                    log::info!("Query settled: {:?}", outcome);
                    effects::fetch_suggestions(&self.client, &self.events, self.conversation.session_id());
                }
            }
            BackendEvent::Suggestions(suggestions) => {
                if !self.conversation.is_in_flight() {
                    self.conversation.set_suggestions(suggestions);
                    self.follow_transcript();
                }
            }
            BackendEvent::Upload(event) => {
                if let Some(name) = self.upload.apply(event) {
                    self.documents.add_uploaded(&name);
                    self.clamp_document_selection();
                }
            }
            BackendEvent::Deleted { name, result: Ok(()) } => {
                self.documents.remove(&name);
                self.panel.forget(&name);
                if self.focus == FocusPane::Panel && !self.panel.is_open() {
                    self.focus = FocusPane::Sources;
                }
                self.clamp_document_selection();
                self.status = Some(format!("Deleted {}.", name));
            }
            BackendEvent::Deleted { result: Err(message), .. } => {
                self.status = Some(message);
            }
            BackendEvent::Summary { filename, result } => {
                self.panel.apply_summary(&filename, result);
            }
            BackendEvent::SourcesSummary(result) => {
                self.sources_summary = Some(match result {
                    Ok(explanation) => SummaryState::Loaded(explanation),
                    Err(_) => SummaryState::Unavailable,
                });
            }
            BackendEvent::Models(Ok(response)) => {
                self.models.apply(response);
            }
            BackendEvent::Models(Err(message)) => {
                self.status = Some(message);
            }
            BackendEvent::ModelSet { name, result } => {
                self.status = Some(match result {
                    Ok(()) => format!("Model set to {}.", name),
                    Err(message) => message,
                });
            }
        }
    }
}
