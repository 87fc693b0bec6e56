//! Transcript state and the per-query state machine.
//!
//! `Idle -> Sending -> (Streaming)* -> Settled(Success | Error)`. Only one
//! query is ever in flight; a settled conversation accepts the next submit.

use crate::api::types::QueryRequest;
use crate::query::{QueryDelta, QUERY_ERROR_TEXT};
use crate::state::{Role, SessionId, Turn, TurnId};

pub const NO_DOCUMENTS_WARNING: &str = "Please select at least one PDF before sending a query.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Sending,
    Streaming,
    Settled(Outcome),
}

impl QueryPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, QueryPhase::Sending | QueryPhase::Streaming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    NoDocumentsSelected,
    QueryInFlight,
    EmptyInput,
}

/// A query that passed the submit guards; the caller sends `request` and
/// feeds the deltas back through [`Conversation::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuery {
    pub assistant_turn: TurnId,
    pub request: QueryRequest,
}

/// What [`Conversation::apply`] did with a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Ignored,
    Updated,
    Settled(Outcome),
}

#[derive(Debug)]
pub struct Conversation {
    session_id: SessionId,
    turns: Vec<Turn>,
    phase: QueryPhase,
    active_turn: Option<TurnId>,
    next_id: u64,
    warning: Option<String>,
    suggestions: Vec<String>,
    revision: u64,
}

impl Conversation {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            turns: Vec::new(),
            phase: QueryPhase::Idle,
            active_turn: None,
            next_id: 0,
            warning: None,
            suggestions: Vec::new(),
            revision: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase.is_in_flight()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<String>) {
        self.suggestions = suggestions;
    }

    /// Bumped on every transcript mutation; views pin scroll to the latest
    /// turn whenever it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Guard and start a query.
    ///
    /// On success the user turn and an empty assistant placeholder have been
    /// appended and the phase is `Sending`.
    pub fn begin_query(
        &mut self,
        input: &str,
        checked: &[String],
        model_name: Option<String>,
    ) -> Result<PendingQuery, SubmitRejected> {
        if checked.is_empty() {
            self.warning = Some(NO_DOCUMENTS_WARNING.to_string());
            return Err(SubmitRejected::NoDocumentsSelected);
        }
        if self.phase.is_in_flight() {
            return Err(SubmitRejected::QueryInFlight);
        }
        self.warning = None;

        let query = input.trim();
        if query.is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }

        self.push_turn(Role::User, query.to_string());
        let assistant_turn = self.push_turn(Role::Assistant, String::new());
        self.active_turn = Some(assistant_turn);
        self.phase = QueryPhase::Sending;
        self.suggestions.clear();

        Ok(PendingQuery {
            assistant_turn,
            request: QueryRequest {
                query: query.to_string(),
                pdfs: checked.to_vec(),
                session_id: self.session_id.clone(),
                model_name,
            },
        })
    }

    /// Apply one delta to the placeholder turn identified by `turn_id`.
    ///
    /// Deltas for any other turn, or arriving after the query settled, are
    /// ignored.
    pub fn apply(&mut self, turn_id: TurnId, delta: QueryDelta) -> Applied {
        if self.active_turn != Some(turn_id) || !self.phase.is_in_flight() {
            log::debug!("Ignoring delta for inactive turn {:?}", turn_id);
            return Applied::Ignored;
        }
        let Some(turn) = self.turns.iter_mut().find(|turn| turn.id == turn_id) else {
            return Applied::Ignored;
        };

        let applied = match delta {
            QueryDelta::Partial(text) => {
                turn.text = text;
                self.phase = QueryPhase::Streaming;
                Applied::Updated
            }
            QueryDelta::Complete { text, citations } => {
                turn.text = text;
                turn.citations = citations;
                self.settle(Outcome::Success)
            }
            QueryDelta::Failed => {
                turn.text = QUERY_ERROR_TEXT.to_string();
                turn.citations.clear();
                self.settle(Outcome::Error)
            }
        };
        self.revision += 1;
        applied
    }

    fn settle(&mut self, outcome: Outcome) -> Applied {
        self.phase = QueryPhase::Settled(outcome);
        self.active_turn = None;
        Applied::Settled(outcome)
    }

    fn push_turn(&mut self, role: Role, text: String) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        self.turns.push(Turn {
            id,
            role,
            text,
            citations: Vec::new(),
        });
        self.revision += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Citation;

    fn docs() -> Vec<String> {
        vec!["doc.pdf".to_string()]
    }

    fn conversation() -> Conversation {
        Conversation::new(SessionId::from("session-1"))
    }

    #[test]
    fn test_empty_selection_warns_and_appends_nothing() {
        let mut conv = conversation();
        let result = conv.begin_query("hello", &[], None);
        assert_eq!(result, Err(SubmitRejected::NoDocumentsSelected));
        assert_eq!(conv.warning(), Some(NO_DOCUMENTS_WARNING));
        assert!(conv.is_empty());
        assert_eq!(conv.phase(), QueryPhase::Idle);
    }

    #[test]
    fn test_begin_query_appends_user_and_placeholder() {
        let mut conv = conversation();
        let pending = conv.begin_query("  What is the policy?  ", &docs(), None).unwrap();

        assert_eq!(conv.turns().len(), 2);
        assert_eq!(conv.turns()[0].role, Role::User);
        assert_eq!(conv.turns()[0].text, "What is the policy?");
        assert_eq!(conv.turns()[1].role, Role::Assistant);
        assert_eq!(conv.turns()[1].text, "");
        assert_eq!(conv.turns()[1].id, pending.assistant_turn);
        assert_eq!(conv.phase(), QueryPhase::Sending);

        assert_eq!(pending.request.query, "What is the policy?");
        assert_eq!(pending.request.pdfs, docs());
        assert_eq!(pending.request.session_id.as_str(), "session-1");
        assert_eq!(pending.request.model_name, None);
    }

    #[test]
    fn test_second_submit_while_in_flight_is_noop() {
        let mut conv = conversation();
        conv.begin_query("first", &docs(), None).unwrap();
        let before = conv.turns().len();

        assert_eq!(
            conv.begin_query("second", &docs(), None),
            Err(SubmitRejected::QueryInFlight)
        );
        assert_eq!(conv.turns().len(), before);
    }

    #[test]
    fn test_blank_input_is_rejected_and_clears_warning() {
        let mut conv = conversation();
        let _ = conv.begin_query("x", &[], None);
        assert!(conv.warning().is_some());

        assert_eq!(conv.begin_query("   ", &docs(), None), Err(SubmitRejected::EmptyInput));
        assert_eq!(conv.warning(), None);
        assert!(conv.is_empty());
    }

    #[test]
    fn test_streaming_deltas_update_placeholder_in_place() {
        let mut conv = conversation();
        let pending = conv.begin_query("hi", &docs(), None).unwrap();
        let id = pending.assistant_turn;

        assert_eq!(conv.turn(id).unwrap().text, "");
        assert_eq!(conv.apply(id, QueryDelta::Partial("Hel".into())), Applied::Updated);
        assert_eq!(conv.turn(id).unwrap().text, "Hel");
        assert_eq!(conv.phase(), QueryPhase::Streaming);
        assert_eq!(conv.apply(id, QueryDelta::Partial("Hello".into())), Applied::Updated);
        assert_eq!(conv.turn(id).unwrap().text, "Hello");

        let settled = conv.apply(
            id,
            QueryDelta::Complete {
                text: "Hello".into(),
                citations: vec![],
            },
        );
        assert_eq!(settled, Applied::Settled(Outcome::Success));

        // nothing mutates the turn after settle
        assert_eq!(conv.apply(id, QueryDelta::Partial("Hello!!".into())), Applied::Ignored);
        assert_eq!(conv.turn(id).unwrap().text, "Hello");
    }

    #[test]
    fn test_single_shot_success_attaches_citations() {
        let mut conv = conversation();
        let pending = conv.begin_query("capital?", &docs(), None).unwrap();
        let citation = Citation {
            text: "...".into(),
            source_document: "doc.pdf".into(),
            page_number: Some(3),
        };

        conv.apply(
            pending.assistant_turn,
            QueryDelta::Complete {
                text: "Paris is the capital.".into(),
                citations: vec![citation.clone()],
            },
        );

        let last = conv.last_turn().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, "Paris is the capital.");
        assert_eq!(last.citations, vec![citation]);
        assert_eq!(conv.phase(), QueryPhase::Settled(Outcome::Success));
    }

    #[test]
    fn test_failure_writes_sentinel_and_allows_next_query() {
        let mut conv = conversation();
        let pending = conv.begin_query("q1", &docs(), None).unwrap();
        conv.apply(pending.assistant_turn, QueryDelta::Partial("partial".into()));

        assert_eq!(
            conv.apply(pending.assistant_turn, QueryDelta::Failed),
            Applied::Settled(Outcome::Error)
        );
        let last = conv.last_turn().unwrap();
        assert_eq!(last.text, QUERY_ERROR_TEXT);
        assert!(last.citations.is_empty());

        assert!(conv.begin_query("q2", &docs(), None).is_ok());
        assert_eq!(conv.turns().len(), 4);
    }

    #[test]
    fn test_delta_for_unknown_turn_is_ignored() {
        let mut conv = conversation();
        conv.begin_query("q", &docs(), None).unwrap();
        assert_eq!(conv.apply(TurnId(99), QueryDelta::Failed), Applied::Ignored);
        assert!(conv.is_in_flight());
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut conv = conversation();
        let start = conv.revision();
        let pending = conv.begin_query("q", &docs(), None).unwrap();
        let after_submit = conv.revision();
        assert!(after_submit > start);

        conv.apply(pending.assistant_turn, QueryDelta::Partial("a".into()));
        assert!(conv.revision() > after_submit);
    }

    #[test]
    fn test_model_override_is_forwarded() {
        let mut conv = conversation();
        let pending = conv
            .begin_query("q", &docs(), Some("gpt-4o".to_string()))
            .unwrap();
        assert_eq!(pending.request.model_name.as_deref(), Some("gpt-4o"));
    }
}
