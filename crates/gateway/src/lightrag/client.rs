//! HTTP client for the LightRAG server
//!
//! One method per backend endpoint. Every method performs exactly one HTTP
//! call and either returns the typed body or a `LightRagError` classified by
//! status code. No retries happen here: a failed call surfaces immediately.

use std::path::Path;
use std::time::Duration;

use lightrag_mcp_shared::types::*;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{LightRagError, LightRagResult};
use super::stream::QueryStream;

/// Header carrying the static backend credential
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Default backend timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one LightRAG backend instance
#[derive(Debug, Clone)]
pub struct LightRagClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl LightRagClient {
    /// Create a client for `base_url`.
    ///
    /// The API key, when present, is attached to every request. The timeout
    /// bounds each buffered call end to end and the time to response headers
    /// of a streaming call.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> LightRagResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| LightRagError::validation("API key contains invalid header characters"))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LightRagError::connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a buffered request and decode the JSON body
    async fn send_json<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> LightRagResult<T> {
        let response = request.timeout(self.timeout).send().await.map_err(|e| {
            let err = LightRagError::from(e);
            tracing::warn!(path = %path, kind = %err.kind, "LightRAG request failed");
            err
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = LightRagError::from_status(status.as_u16(), &body);
            tracing::warn!(
                path = %path,
                status = status.as_u16(),
                kind = %err.kind,
                "LightRAG returned an error status"
            );
            return Err(err);
        }

        tracing::debug!(path = %path, status = status.as_u16(), bytes = body.len(), "LightRAG response");

        serde_json::from_str(&body).map_err(|e| {
            LightRagError::api(format!("Invalid JSON response from {}: {}", path, e))
                .with_status(status.as_u16())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> LightRagResult<T> {
        self.send_json(path, self.http.get(self.url(path))).await
    }

    async fn get_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> LightRagResult<T> {
        self.send_json(path, self.http.get(self.url(path)).query(query)).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl serde::Serialize) -> LightRagResult<T> {
        self.send_json(path, self.http.post(self.url(path)).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> LightRagResult<T> {
        self.send_json(path, self.http.post(self.url(path))).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str, body: Option<&Value>) -> LightRagResult<T> {
        let request = self.http.delete(self.url(path));
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        self.send_json(path, request).await
    }

    // =========================================================================
    // Documents
    // =========================================================================

    pub async fn insert_text(&self, request: &InsertTextRequest) -> LightRagResult<InsertResponse> {
        self.post("/documents/text", request).await
    }

    pub async fn insert_texts(&self, request: &InsertTextsRequest) -> LightRagResult<InsertResponse> {
        self.post("/documents/texts", request).await
    }

    pub async fn upload_document(&self, file_path: &Path) -> LightRagResult<UploadResponse> {
        let contents = tokio::fs::read(file_path).await.map_err(|e| {
            LightRagError::validation(format!("Cannot read file {}: {}", file_path.display(), e))
        })?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(contents).file_name(file_name));

        self.send_json("/documents/upload", self.http.post(self.url("/documents/upload")).multipart(form))
            .await
    }

    pub async fn scan_documents(&self) -> LightRagResult<ScanResponse> {
        self.post_empty("/documents/scan").await
    }

    pub async fn get_documents(&self) -> LightRagResult<DocumentsResponse> {
        self.get("/documents").await
    }

    pub async fn get_documents_paginated(&self, request: &DocumentsRequest) -> LightRagResult<PaginatedDocsResponse> {
        self.post("/documents/paginated", request).await
    }

    pub async fn delete_documents(&self, request: &DeleteDocRequest) -> LightRagResult<DeleteDocByIdResponse> {
        let body = serde_json::to_value(request)
            .map_err(|e| LightRagError::api(format!("Failed to encode request: {}", e)))?;
        self.delete("/documents/delete_document", Some(&body)).await
    }

    pub async fn clear_documents(&self) -> LightRagResult<StatusMessageResponse> {
        self.delete("/documents", None).await
    }

    pub async fn reprocess_failed_documents(&self) -> LightRagResult<StatusMessageResponse> {
        self.post_empty("/documents/reprocess_failed").await
    }

    pub async fn cancel_pipeline(&self) -> LightRagResult<StatusMessageResponse> {
        self.post_empty("/documents/cancel_pipeline").await
    }

    // =========================================================================
    // Query
    // =========================================================================

    pub async fn query(&self, request: &QueryRequest) -> LightRagResult<QueryResponse> {
        self.post("/query", request).await
    }

    pub async fn query_data(&self, request: &QueryRequest) -> LightRagResult<QueryDataResponse> {
        self.post("/query/data", request).await
    }

    /// Start a streaming query.
    ///
    /// Failures up to and including the response status are returned here;
    /// failures while reading the body surface as stream items.
    pub async fn query_stream(&self, request: &QueryRequest) -> LightRagResult<QueryStream> {
        let path = "/query/stream";
        let mut request = request.clone();
        request.stream = Some(true);

        let send = self.http.post(self.url(path)).json(&request).send();
        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(path = %path, "LightRAG stream timed out before first byte");
                return Err(LightRagError::timeout(format!(
                    "No response from {} within {}s",
                    path,
                    self.timeout.as_secs_f64()
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = LightRagError::from_status(status.as_u16(), &body);
            tracing::warn!(path = %path, status = status.as_u16(), kind = %err.kind, "LightRAG stream rejected");
            return Err(err);
        }

        tracing::debug!(path = %path, "LightRAG stream opened");
        Ok(QueryStream::from_response(response))
    }

    // =========================================================================
    // Knowledge Graph
    // =========================================================================

    pub async fn get_knowledge_graph(
        &self,
        label: &str,
        max_depth: Option<u32>,
        max_nodes: Option<u32>,
    ) -> LightRagResult<GraphResponse> {
        let mut query = vec![("label", label.to_string())];
        if let Some(depth) = max_depth {
            query.push(("max_depth", depth.to_string()));
        }
        if let Some(nodes) = max_nodes {
            query.push(("max_nodes", nodes.to_string()));
        }
        self.get_query("/graphs", &query).await
    }

    pub async fn get_graph_labels(&self) -> LightRagResult<LabelsResponse> {
        let raw: Value = self.get("/graph/label/list").await?;
        Self::labels(raw)
    }

    pub async fn search_graph_labels(&self, q: &str, limit: u32) -> LightRagResult<LabelsResponse> {
        let raw: Value = self
            .get_query("/graph/label/search", &[("q", q.to_string()), ("limit", limit.to_string())])
            .await?;
        Self::labels(raw)
    }

    pub async fn get_popular_labels(&self, limit: u32) -> LightRagResult<LabelsResponse> {
        let raw: Value = self
            .get_query("/graph/label/popular", &[("limit", limit.to_string())])
            .await?;
        Self::labels(raw)
    }

    fn labels(raw: Value) -> LightRagResult<LabelsResponse> {
        LabelsResponse::from_value(raw)
            .map_err(|e| LightRagError::api(format!("Unexpected label list shape: {}", e)))
    }

    pub async fn check_entity_exists(&self, name: &str) -> LightRagResult<EntityExistsResponse> {
        self.get_query("/graph/entity/exists", &[("name", name.to_string())]).await
    }

    pub async fn create_entity(&self, request: &CreateEntityRequest) -> LightRagResult<GraphMutationResponse> {
        self.post("/graph/entity/create", request).await
    }

    pub async fn update_entity(&self, request: &EntityUpdateRequest) -> LightRagResult<GraphMutationResponse> {
        self.post("/graph/entity/edit", request).await
    }

    pub async fn delete_entity(&self, request: &DeleteEntityRequest) -> LightRagResult<DeletionResult> {
        let body = serde_json::to_value(request)
            .map_err(|e| LightRagError::api(format!("Failed to encode request: {}", e)))?;
        self.delete("/documents/delete_entity", Some(&body)).await
    }

    pub async fn create_relation(&self, request: &CreateRelationRequest) -> LightRagResult<GraphMutationResponse> {
        self.post("/graph/relation/create", request).await
    }

    pub async fn update_relation(&self, request: &RelationUpdateRequest) -> LightRagResult<GraphMutationResponse> {
        self.post("/graph/relation/edit", request).await
    }

    pub async fn delete_relation(&self, request: &DeleteRelationRequest) -> LightRagResult<DeletionResult> {
        let body = serde_json::to_value(request)
            .map_err(|e| LightRagError::api(format!("Failed to encode request: {}", e)))?;
        self.delete("/documents/delete_relation", Some(&body)).await
    }

    pub async fn merge_entities(&self, request: &EntityMergeRequest) -> LightRagResult<GraphMutationResponse> {
        self.post("/graph/entities/merge", request).await
    }

    // =========================================================================
    // System
    // =========================================================================

    pub async fn get_pipeline_status(&self) -> LightRagResult<PipelineStatusResponse> {
        self.get("/documents/pipeline_status").await
    }

    pub async fn get_track_status(&self, track_id: &str) -> LightRagResult<TrackStatusResponse> {
        let mut url = Url::parse(&self.url("/documents/track_status"))
            .map_err(|e| LightRagError::validation(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| LightRagError::validation("Base URL cannot carry a path"))?
            .push(track_id);

        self.send_json("/documents/track_status", self.http.get(url)).await
    }

    pub async fn get_document_status_counts(&self) -> LightRagResult<StatusCountsResponse> {
        self.get("/documents/status_counts").await
    }

    pub async fn clear_cache(&self, request: &ClearCacheRequest) -> LightRagResult<StatusMessageResponse> {
        self.post("/documents/clear_cache", request).await
    }

    pub async fn get_health(&self) -> LightRagResult<HealthResponse> {
        self.get("/health").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lightrag_mcp_shared::ErrorKind;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn client_for(server: &mockito::ServerGuard) -> LightRagClient {
        LightRagClient::new(&server.url(), Some("secret"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = LightRagClient::new("http://localhost:9621///", None, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9621");
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let err = LightRagClient::new("http://localhost:9621", Some("bad\nkey"), DEFAULT_TIMEOUT).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_status_code_mapping() {
        let cases = [
            (400, ErrorKind::ValidationError),
            (401, ErrorKind::AuthError),
            (403, ErrorKind::AuthError),
            (404, ErrorKind::NotFound),
            (408, ErrorKind::Timeout),
            (422, ErrorKind::ValidationError),
            (429, ErrorKind::ApiError),
            (500, ErrorKind::ServerError),
            (503, ErrorKind::ServerError),
        ];

        let mut server = mockito::Server::new_async().await;
        let client = client_for(&server);

        for (status, expected) in cases {
            let mock = server
                .mock("GET", "/health")
                .with_status(status)
                .with_body(r#"{"detail": "nope"}"#)
                .create_async()
                .await;

            let err = client.get_health().await.unwrap_err();
            assert_eq!(err.kind, expected, "status {}", status);
            assert_eq!(err.status_code, Some(status as u16));
            assert_eq!(err.message, format!("HTTP {}: nope", status));

            mock.remove_async().await;
        }
    }

    #[tokio::test]
    async fn test_api_key_header_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_body(r#"{"status": "healthy"}"#)
            .create_async()
            .await;

        let health = client_for(&server).get_health().await.unwrap();
        assert_eq!(health.status, "healthy");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_api_key_header_without_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .match_header("x-api-key", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"status": "healthy"}"#)
            .create_async()
            .await;

        let client = LightRagClient::new(&server.url(), None, DEFAULT_TIMEOUT).unwrap();
        client.get_health().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_request_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query")
            .match_body(Matcher::PartialJson(json!({
                "query": "who is alice",
                "mode": "mix",
                "only_need_context": false
            })))
            .with_status(200)
            .with_body(r#"{"response": "Alice is a person"}"#)
            .create_async()
            .await;

        let request = QueryRequest {
            query: "who is alice".to_string(),
            ..Default::default()
        };
        let response = client_for(&server).query(&request).await.unwrap();
        assert_eq!(response.response.as_deref(), Some("Alice is a person"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_document_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/documents/delete_document")
            .match_body(Matcher::Json(json!({
                "doc_ids": ["doc-1"],
                "delete_file": false,
                "delete_llm_cache": false
            })))
            .with_status(200)
            .with_body(r#"{"status": "deletion_started", "message": "ok", "doc_id": "doc-1"}"#)
            .create_async()
            .await;

        let request = DeleteDocRequest {
            doc_ids: vec!["doc-1".to_string()],
            delete_file: false,
            delete_llm_cache: false,
        };
        let response = client_for(&server).delete_documents(&request).await.unwrap();
        assert_eq!(response.status, "deletion_started");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graph_labels_bare_list() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/graph/label/list")
            .with_status(200)
            .with_body(r#"["Alice", "Bob"]"#)
            .create_async()
            .await;

        let labels = client_for(&server).get_graph_labels().await.unwrap();
        assert_eq!(labels.labels, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_query_parameters_forwarded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/graph/label/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "ali".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"["Alice"]"#)
            .create_async()
            .await;

        client_for(&server).search_graph_labels("ali", 5).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_track_status_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/documents/track_status/insert_42")
            .with_status(200)
            .with_body(r#"{"track_id": "insert_42", "documents": [], "total_count": 0}"#)
            .create_async()
            .await;

        let status = client_for(&server).get_track_status("insert_42").await.unwrap();
        assert_eq!(status.track_id, "insert_42");
        assert_eq!(status.total_count, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_json_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/documents/pipeline_status")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client_for(&server).get_pipeline_status().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ApiError);
        assert_eq!(err.status_code, Some(200));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = LightRagClient::new("http://127.0.0.1:1", None, Duration::from_secs(2)).unwrap();
        let err = client.get_health().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConnectionError);
        assert!(err.is_retryable());
    }

    /// Accepts connections and never answers
    async fn silent_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let client = LightRagClient::new(&silent_backend().await, None, Duration::from_millis(300)).unwrap();
        let request = QueryRequest {
            query: "who is alice".to_string(),
            ..Default::default()
        };

        let err = client.query(&request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.is_retryable());

        let err = client.query_stream(&request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_stream_decodes_chunks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query/stream")
            .match_body(Matcher::PartialJson(json!({"stream": true})))
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"Hello")?;
                w.write_all(b", world")
            })
            .create_async()
            .await;

        let request = QueryRequest {
            query: "hi".to_string(),
            ..Default::default()
        };
        let stream = client_for(&server).query_stream(&request).await.unwrap();
        assert_eq!(stream.collect_text().await.unwrap(), "Hello, world");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stream_error_status_before_first_byte() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/query/stream")
            .with_status(503)
            .with_body(r#"{"detail": "overloaded"}"#)
            .create_async()
            .await;

        let request = QueryRequest {
            query: "hi".to_string(),
            ..Default::default()
        };
        let err = client_for(&server).query_stream(&request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message, "HTTP 503: overloaded");
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_validation_error() {
        let client = LightRagClient::new("http://127.0.0.1:1", None, DEFAULT_TIMEOUT).unwrap();
        let err = client
            .upload_document(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
    }
}
