//! Wire types for the PolicyBot backend.

use serde::{Deserialize, Serialize};

use crate::state::{Citation, SessionId};

#[derive(Deserialize)]
pub(crate) struct DocumentList {
    #[serde(default)]
    pub pdfs: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct UploadResponse {
    pub filename: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// FastAPI-style error body. `detail` is usually a string but may be a
/// validation list; only string details are surfaced.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_text(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Body of `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub pdfs: Vec<String>,
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// One `data:` record of the streaming query protocol.
#[derive(Debug, Deserialize)]
pub struct StreamRecord {
    #[serde(default)]
    pub partial: String,
    #[serde(default)]
    pub done: bool,
}

/// Body of the single-shot query protocol.
#[derive(Debug, Deserialize)]
pub struct SingleShotResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub context_chunks: Vec<ContextChunk>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl SingleShotResponse {
    /// `error` counts when it is `true`, a non-empty string, or any object.
    pub fn is_error(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextChunk {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub page_number: Option<u32>,
}

impl From<ContextChunk> for Citation {
    fn from(chunk: ContextChunk) -> Self {
        Citation {
            text: chunk.text,
            source_document: chunk.source,
            page_number: chunk.page_number,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct SessionRequest<'a> {
    pub session_id: &'a SessionId,
}

#[derive(Deserialize)]
pub(crate) struct SuggestedQueries {
    #[serde(default)]
    pub suggested_queries: Vec<String>,
}

/// Entries of `supported_models` come either as plain ids or as `{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ModelEntry {
    Name(String),
    Object { name: String },
}

impl ModelEntry {
    fn into_name(self) -> String {
        match self {
            ModelEntry::Name(name) | ModelEntry::Object { name } => name,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct RawModelsResponse {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub supported_models: Vec<ModelEntry>,
}

/// Response of `/api/default-model` and `/api/get-models`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelsResponse {
    pub model_name: Option<String>,
    pub supported_models: Vec<String>,
}

impl From<RawModelsResponse> for ModelsResponse {
    fn from(raw: RawModelsResponse) -> Self {
        Self {
            model_name: raw.model_name,
            supported_models: raw
                .supported_models
                .into_iter()
                .map(ModelEntry::into_name)
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct SetModelRequest<'a> {
    pub model_name: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct SummaryResponse {
    pub summary: String,
}

#[derive(Deserialize)]
pub(crate) struct SourcesSummaryResponse {
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_omits_missing_model() {
        let request = QueryRequest {
            query: "q".to_string(),
            pdfs: vec!["a.pdf".to_string()],
            session_id: SessionId::from("s1"),
            model_name: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"query": "q", "pdfs": ["a.pdf"], "session_id": "s1"})
        );
    }

    #[test]
    fn test_query_request_includes_model_override() {
        let request = QueryRequest {
            query: "q".to_string(),
            pdfs: vec![],
            session_id: SessionId::from("s1"),
            model_name: Some("gpt-4o".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model_name"], "gpt-4o");
    }

    #[test]
    fn test_single_shot_error_flag_variants() {
        let parse = |body: &str| serde_json::from_str::<SingleShotResponse>(body).unwrap();
        assert!(!parse(r#"{"response": "ok"}"#).is_error());
        assert!(!parse(r#"{"response": "ok", "error": null}"#).is_error());
        assert!(!parse(r#"{"response": "ok", "error": false}"#).is_error());
        assert!(parse(r#"{"response": "", "error": true}"#).is_error());
        assert!(parse(r#"{"response": "", "error": "boom"}"#).is_error());
    }

    #[test]
    fn test_models_accept_plain_and_object_entries() {
        let raw: RawModelsResponse = serde_json::from_str(
            r#"{"model_name": "a", "supported_models": ["a", {"name": "b"}]}"#,
        )
        .unwrap();
        let models = ModelsResponse::from(raw);
        assert_eq!(models.model_name.as_deref(), Some("a"));
        assert_eq!(models.supported_models, vec!["a", "b"]);
    }

    #[test]
    fn test_error_body_ignores_non_string_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": [{"loc": []}]}"#).unwrap();
        assert_eq!(body.detail_text(), None);

        let body: ErrorBody = serde_json::from_str(r#"{"detail": "File X exists"}"#).unwrap();
        assert_eq!(body.detail_text().as_deref(), Some("File X exists"));
    }
}
