//! Client for the remote todo API.
//!
//! # Design
//! Each operation is split into a pure `build_*` method that produces an
//! `HttpRequest` and a pure `parse_*` method that consumes an
//! `HttpResponse`. The async operations compose the two around a single
//! `Transport::execute` call. The client keeps nothing between calls except
//! the base URL: no retries, no caching.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{RemoteError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::ReqwestTransport;
use crate::types::{ReplacedTodo, Status, Todo, TodoId, TodoPayload};

/// Talks to the todo collection at `base_url` through a [`Transport`].
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct RemoteTodoClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RemoteTodoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTodoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RemoteTodoClient {
    /// `base_url` is the collection endpoint; it is normalized to end in
    /// exactly one `/`.
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            transport,
        }
    }

    /// Client over `ReqwestTransport`, using `api_url` and the request timeout.
    pub fn from_config(config: &SyncConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::new(&config.api_url, Arc::new(transport)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: TodoId) -> String {
        format!("{}{id}/", self.base_url)
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.base_url.clone(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create(&self, payload: &TodoPayload) -> Result<HttpRequest, RemoteError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.base_url.clone(),
            headers: json_headers(),
            body: Some(encode(payload)?),
        })
    }

    pub fn build_replace(&self, id: TodoId, payload: &TodoPayload) -> Result<HttpRequest, RemoteError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.item_url(id),
            headers: json_headers(),
            body: Some(encode(payload)?),
        })
    }

    pub fn build_delete(&self, id: TodoId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Todo>, RemoteError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Todo, RemoteError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_replace(&self, response: HttpResponse) -> Result<ReplacedTodo, RemoteError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), RemoteError> {
        check_status(&response)
    }

    pub async fn list(&self) -> Result<Vec<Todo>, RemoteError> {
        let response = self.send(self.build_list()).await?;
        self.parse_list(response)
    }

    pub async fn create(&self, title: &str, status: Status) -> Result<Todo, RemoteError> {
        let request = self.build_create(&payload(title, status))?;
        let response = self.send(request).await?;
        self.parse_create(response)
    }

    pub async fn replace(
        &self,
        id: TodoId,
        title: &str,
        status: Status,
    ) -> Result<ReplacedTodo, RemoteError> {
        let request = self.build_replace(id, &payload(title, status))?;
        let response = self.send(request).await?;
        self.parse_replace(response)
    }

    pub async fn delete(&self, id: TodoId) -> Result<(), RemoteError> {
        let response = self.send(self.build_delete(id)).await?;
        self.parse_delete(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}

fn payload(title: &str, status: Status) -> TodoPayload {
    TodoPayload {
        title: title.to_string(),
        status,
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn encode(payload: &TodoPayload) -> Result<String, RemoteError> {
    serde_json::to_string(payload).map_err(|e| RemoteError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::InvalidBody(e.to_string()))
}

/// Any 2xx is success; everything else is a rejection.
fn check_status(response: &HttpResponse) -> Result<(), RemoteError> {
    if response.is_success() {
        return Ok(());
    }
    Err(RemoteError::Rejected {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{response, ScriptedTransport};

    fn client() -> RemoteTodoClient {
        RemoteTodoClient::new("http://127.0.0.1:8000/api/todos/", ScriptedTransport::new())
    }

    #[test]
    fn base_url_gets_single_trailing_slash() {
        let bare = RemoteTodoClient::new("http://host/api/todos", ScriptedTransport::new());
        assert_eq!(bare.base_url(), "http://host/api/todos/");
        let doubled = RemoteTodoClient::new("http://host/api/todos//", ScriptedTransport::new());
        assert_eq!(doubled.base_url(), "http://host/api/todos/");
    }

    #[test]
    fn build_list_targets_collection() {
        let req = client().build_list();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://127.0.0.1:8000/api/todos/");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_create_posts_json() {
        let req = client()
            .build_create(&payload("Buy milk", Status::Incomplete))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://127.0.0.1:8000/api/todos/");
        assert_eq!(req.headers, json_headers());
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Buy milk", "status": "incomplete"}));
    }

    #[test]
    fn build_replace_puts_to_item_path() {
        let req = client()
            .build_replace(TodoId(7), &payload("Walk dog", Status::Complete))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://127.0.0.1:8000/api/todos/7/");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["status"], "complete");
    }

    #[test]
    fn build_delete_has_no_body() {
        let req = client().build_delete(TodoId(7));
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://127.0.0.1:8000/api/todos/7/");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_create_accepts_any_2xx() {
        let body = r#"{"id":7,"title":"Buy milk","status":"incomplete","created_at":"2024-01-01T00:00:00Z"}"#;
        let c = client();
        for status in [200, 201] {
            let todo = c.parse_create(response(status, body)).unwrap();
            assert_eq!(todo.id, TodoId(7));
            assert_eq!(todo.title, "Buy milk");
        }
    }

    #[test]
    fn parse_replace_rejected_keeps_status() {
        let err = client()
            .parse_replace(response(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { status: 500, ref body } if body == "internal error"));
    }

    #[test]
    fn parse_delete_outcomes() {
        let c = client();
        assert!(c.parse_delete(response(204, "")).is_ok());
        assert!(matches!(
            c.parse_delete(response(404, "")).unwrap_err(),
            RemoteError::Rejected { status: 404, .. }
        ));
    }

    #[test]
    fn parse_list_bad_json() {
        let err = client().parse_list(response(200, "not json")).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn create_round_trips_through_transport() {
        let transport = ScriptedTransport::new();
        transport.respond(
            201,
            r#"{"id":1,"title":"Read","status":"complete","created_at":"2024-01-01T00:00:00Z"}"#,
        );
        let c = RemoteTodoClient::new("http://host/api/todos/", transport.clone());

        let todo = c.create("Read", Status::Complete).await.unwrap();
        assert_eq!(todo.status, Status::Complete);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_remote_transport() {
        let transport = ScriptedTransport::new();
        transport.fail(TransportError::Connect("refused".to_string()));
        let c = RemoteTodoClient::new("http://host/api/todos/", transport);

        let err = c.delete(TodoId(1)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(TransportError::Connect(_))));
    }
}
