//! Right-hand panel showing the active document's summary.

use crate::layout::{DragOutcome, ResizablePane, ResizeEdge, AUX_PANEL};

pub const NO_SUMMARY: &str = "No summary available.";
pub const LOADING_SUMMARY: &str = "Loading summary...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryState {
    Loading,
    Loaded(String),
    Unavailable,
}

impl SummaryState {
    pub fn text(&self) -> &str {
        match self {
            SummaryState::Loading => LOADING_SUMMARY,
            SummaryState::Loaded(summary) => summary,
            SummaryState::Unavailable => NO_SUMMARY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub state: SummaryState,
    pub collapsed: bool,
}

impl SummaryView {
    fn loading() -> Self {
        Self {
            state: SummaryState::Loading,
            collapsed: false,
        }
    }
}

#[derive(Debug)]
pub struct PanelController {
    open: bool,
    active: Option<String>,
    pane: ResizablePane,
    summary: Option<SummaryView>,
}

impl Default for PanelController {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelController {
    pub fn new() -> Self {
        Self {
            open: false,
            active: None,
            pane: ResizablePane::new(AUX_PANEL, ResizeEdge::Left),
            summary: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn summary(&self) -> Option<&SummaryView> {
        self.summary.as_ref()
    }

    pub fn pane(&self) -> &ResizablePane {
        &self.pane
    }

    pub fn pane_mut(&mut self) -> &mut ResizablePane {
        &mut self.pane
    }

    /// Open the panel on `name`. Returns true when the active document
    /// changed and its summary needs fetching.
    pub fn select_document(&mut self, name: &str) -> bool {
        if !self.open {
            self.pane.reset();
            self.open = true;
        }
        if self.active.as_deref() == Some(name) {
            return false;
        }
        self.active = Some(name.to_string());
        self.summary = Some(SummaryView::loading());
        true
    }

    /// Hide the panel; the active document is remembered.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Finish a border drag; collapsing the panel closes it.
    pub fn end_drag(&mut self) -> DragOutcome {
        let outcome = self.pane.end_drag();
        if outcome == DragOutcome::Collapsed {
            self.close();
        }
        outcome
    }

    /// Store a summary fetch result. Results for a document that is no
    /// longer active are dropped.
    pub fn apply_summary(&mut self, filename: &str, result: Result<String, String>) -> bool {
        if self.active.as_deref() != Some(filename) {
            log::debug!("Dropping stale summary for {}", filename);
            return false;
        }
        let Some(view) = self.summary.as_mut() else {
            return false;
        };
        view.state = match result {
            Ok(summary) => SummaryState::Loaded(summary),
            Err(err) => {
                log::warn!("Summary for {} unavailable: {}", filename, err);
                SummaryState::Unavailable
            }
        };
        true
    }

    pub fn toggle_collapsed(&mut self) {
        if let Some(view) = self.summary.as_mut() {
            view.collapsed = !view.collapsed;
        }
    }

    /// A deleted document must not stay on display.
    pub fn forget(&mut self, name: &str) {
        if self.active.as_deref() == Some(name) {
            self.active = None;
            self.summary = None;
            self.open = false;
        }
    }
}
