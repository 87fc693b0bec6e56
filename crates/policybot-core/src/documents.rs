//! Known documents and the subset checked as query context.

use std::collections::HashSet;

/// An uploaded, processed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
}

/// Whether the first listing has been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    Initialized,
}

/// Tri-state of the select-all affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    All,
    None,
    Partial,
}

impl SelectionState {
    pub fn marker(&self) -> &'static str {
        match self {
            SelectionState::All => "[x]",
            SelectionState::None => "[ ]",
            SelectionState::Partial => "[-]",
        }
    }
}

#[derive(Debug)]
pub struct DocumentStore {
    documents: Vec<Document>,
    checked: HashSet<String>,
    phase: LoadPhase,
    auto_select_on_first_load: bool,
}

impl DocumentStore {
    pub fn new(auto_select_on_first_load: bool) -> Self {
        Self {
            documents: Vec::new(),
            checked: HashSet::new(),
            phase: LoadPhase::Uninitialized,
            auto_select_on_first_load,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.iter().any(|doc| doc.name == name)
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.checked.contains(name)
    }

    /// Checked names in document-list order.
    pub fn checked_names(&self) -> Vec<String> {
        self.documents
            .iter()
            .filter(|doc| self.checked.contains(&doc.name))
            .map(|doc| doc.name.clone())
            .collect()
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Replace the list with a backend listing.
    ///
    /// Only the first listing may auto-check everything; later refreshes keep
    /// the current selection, minus names that disappeared.
    pub fn apply_listing(&mut self, names: Vec<String>) {
        let mut seen = HashSet::new();
        self.documents = names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| Document { name })
            .collect();

        let known: HashSet<&str> = self.documents.iter().map(|doc| doc.name.as_str()).collect();
        self.checked.retain(|name| known.contains(name.as_str()));

        if self.phase == LoadPhase::Uninitialized {
            if self.auto_select_on_first_load {
                self.checked = self.documents.iter().map(|doc| doc.name.clone()).collect();
            }
            self.phase = LoadPhase::Initialized;
        }
        log::info!(
            "Loaded {} documents ({} checked)",
            self.documents.len(),
            self.checked.len()
        );
    }

    /// Flip membership of `name`. Unknown names are ignored.
    pub fn toggle(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        if !self.checked.remove(name) {
            self.checked.insert(name.to_string());
        }
        true
    }

    pub fn selection_state(&self) -> SelectionState {
        if self.documents.is_empty() || self.checked.is_empty() {
            SelectionState::None
        } else if self.documents.iter().all(|doc| self.checked.contains(&doc.name)) {
            SelectionState::All
        } else {
            SelectionState::Partial
        }
    }

    /// Clear when everything is checked, otherwise check everything.
    pub fn select_all_toggle(&mut self) {
        if self.selection_state() == SelectionState::All {
            self.checked.clear();
        } else {
            self.checked = self.documents.iter().map(|doc| doc.name.clone()).collect();
        }
    }

    /// A freshly uploaded document joins the list and the checked set.
    pub fn add_uploaded(&mut self, name: &str) {
        if !self.contains(name) {
            self.documents.push(Document {
                name: name.to_string(),
            });
        }
        self.checked.insert(name.to_string());
    }

    /// Drop a deleted document from both the list and the checked set.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.name != name);
        self.checked.remove(name);
        before != self.documents.len()
    }
}
