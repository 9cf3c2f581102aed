use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Status, Todo};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/todos/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201_with_id_and_timestamp() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/todos/",
            r#"{"title":"Buy milk","status":"incomplete"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.id, 1);
    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.status, Status::Incomplete);
}

#[tokio::test]
async fn create_todo_blank_title_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/todos/", r#"{"title":"  "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let errors: serde_json::Value = body_json(resp).await;
    assert_eq!(errors["title"][0], "This field may not be blank.");
}

#[tokio::test]
async fn create_todo_invalid_status_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/todos/",
            r#"{"title":"x","status":"done"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- item routes ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/todos/7/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_todo_bad_id_returns_400() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/todos/not-a-number/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_todo_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/todos/7/", r#"{"title":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/api/todos/7/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let mut app = app().into_service();

    // create two; the later one lists first
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/todos/", r#"{"title":"Walk dog"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Todo = body_json(resp).await;
    assert_eq!(first.status, Status::Incomplete);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/todos/",
            r#"{"title":"Feed cat","status":"complete"}"#,
        ))
        .await
        .unwrap();
    let second: Todo = body_json(resp).await;
    assert_eq!(second.id, first.id + 1);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/todos/"))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    let ids: Vec<u64> = todos.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    // replace keeps id and created_at
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/api/todos/{}/", first.id),
            r#"{"title":"Walk the dog","status":"complete"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let replaced: Todo = body_json(resp).await;
    assert_eq!(replaced.id, first.id);
    assert_eq!(replaced.title, "Walk the dog");
    assert_eq!(replaced.status, Status::Complete);
    assert_eq!(replaced.created_at, first.created_at);

    // replace without status resets it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/api/todos/{}/", first.id),
            r#"{"title":"Walk the dog"}"#,
        ))
        .await
        .unwrap();
    let replaced: Todo = body_json(resp).await;
    assert_eq!(replaced.status, Status::Incomplete);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/api/todos/{}/", first.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/api/todos/{}/", first.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/todos/"))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, second.id);
}
