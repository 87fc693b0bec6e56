use reqwest::{multipart, Client, Response, StatusCode};

use crate::api::types::{
    DocumentList, ErrorBody, ModelsResponse, QueryRequest, RawModelsResponse, SessionRequest,
    SetModelRequest, SingleShotResponse, SourcesSummaryResponse, SuggestedQueries,
    SummaryResponse, UploadResponse,
};
use crate::error::ApiError;
use crate::state::SessionId;
use crate::upload::{UploadAccepted, UploadFile, UploadKind};

/// HTTP/SSE client for every endpoint the PolicyBot backend exposes.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_url(&self, prefix: &str, filename: &str) -> String {
        format!("{}{}/{}", self.base_url, prefix, urlencoding::encode(filename))
    }

    pub async fn list_documents(&self) -> Result<Vec<String>, ApiError> {
        let response = self.client.get(self.url("/pdf/list")).send().await?;
        let list: DocumentList = ensure_success(response).await?.json().await?;
        Ok(list.pdfs)
    }

    /// Upload one PDF. 201 is a new document, 200 resumes processing of a
    /// partially processed one; every other status is an error.
    pub async fn upload_document(&self, file: &UploadFile) -> Result<UploadAccepted, ApiError> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/pdf/upload"))
            .multipart(form)
            .send()
            .await?;

        let kind = match response.status() {
            StatusCode::CREATED => UploadKind::Created,
            StatusCode::OK => UploadKind::Resumed,
            _ => return Err(status_error(response).await),
        };

        let body: UploadResponse = response.json().await?;
        Ok(UploadAccepted {
            filename: body.filename,
            kind,
            message: body.message,
        })
    }

    /// Open the server-push channel that reports processing progress.
    pub async fn processing_events(&self, filename: &str) -> Result<Response, ApiError> {
        let response = self
            .client
            .get(self.file_url("/pdf/process", filename))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        ensure_success(response).await
    }

    pub async fn delete_document(&self, filename: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.file_url("/pdf/delete", filename))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn document_summary(&self, filename: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.file_url("/pdf/summary", filename))
            .send()
            .await?;
        let body: SummaryResponse = ensure_success(response).await?.json().await?;
        Ok(body.summary)
    }

    /// Streaming protocol: the caller reads `data:` records off the body.
    pub async fn query_stream(&self, request: &QueryRequest) -> Result<Response, ApiError> {
        let response = self
            .client
            .post(self.url("/api/query"))
            .json(request)
            .send()
            .await?;
        ensure_success(response).await
    }

    pub async fn query_single_shot(
        &self,
        request: &QueryRequest,
    ) -> Result<SingleShotResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/query"))
            .json(request)
            .send()
            .await?;
        let body = ensure_success(response).await?.json().await?;
        Ok(body)
    }

    pub async fn suggested_queries(&self, session_id: &SessionId) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .post(self.url("/api/suggested-queries"))
            .json(&SessionRequest { session_id })
            .send()
            .await?;
        let body: SuggestedQueries = ensure_success(response).await?.json().await?;
        Ok(body.suggested_queries)
    }

    pub async fn default_model(&self) -> Result<ModelsResponse, ApiError> {
        self.fetch_models("/api/default-model").await
    }

    pub async fn models(&self) -> Result<ModelsResponse, ApiError> {
        self.fetch_models("/api/get-models").await
    }

    async fn fetch_models(&self, path: &str) -> Result<ModelsResponse, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        let raw: RawModelsResponse = ensure_success(response).await?.json().await?;
        Ok(raw.into())
    }

    pub async fn set_model(&self, model_name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/set-model"))
            .json(&SetModelRequest { model_name })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn sources_summary(&self) -> Result<String, ApiError> {
        let response = self.client.get(self.url("/api/sources-summary")).send().await?;
        let body: SourcesSummaryResponse = ensure_success(response).await?.json().await?;
        Ok(body.explanation)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response).await)
    }
}

async fn status_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::detail_text);
    log::debug!("Backend returned {}: {}", status, text);
    ApiError::Status { status, detail }
}
