//! In-memory stand-in for the todo API.
//!
//! Serves the collection at `/api/todos/` and items at `/api/todos/{id}/`.
//! Ids are sequential integers, `created_at` is stamped on create, lists
//! come back newest first, and validation failures answer 400 with a
//! field -> messages map.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Incomplete,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

/// Body of POST and PUT. Fields are optional so that missing ones are
/// reported per field instead of as a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct TodoInput {
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default)]
pub struct Table {
    last_id: u64,
    rows: BTreeMap<u64, Todo>,
}

pub type Db = Arc<RwLock<Table>>;

type Rejection = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Table::default()));
    Router::new()
        .route("/api/todos/", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}/",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let table = db.read().await;
    let mut todos: Vec<Todo> = table.rows.values().cloned().collect();
    todos.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    Json(todos)
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<TodoInput>,
) -> Result<(StatusCode, Json<Todo>), Rejection> {
    let (title, status) = validate(input)?;
    let mut table = db.write().await;
    table.last_id += 1;
    let todo = Todo {
        id: table.last_id,
        title,
        status,
        created_at: Utc::now(),
    };
    table.rows.insert(todo.id, todo.clone());
    tracing::info!(id = todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Todo>, Rejection> {
    let table = db.read().await;
    table.rows.get(&id).cloned().map(Json).ok_or_else(not_found)
}

/// Full replace: `title` is required, `status` falls back to incomplete.
async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<TodoInput>,
) -> Result<Json<Todo>, Rejection> {
    let mut table = db.write().await;
    let todo = table.rows.get_mut(&id).ok_or_else(not_found)?;
    let (title, status) = validate(input)?;
    todo.title = title;
    todo.status = status;
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, Rejection> {
    let mut table = db.write().await;
    table
        .rows
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

fn not_found() -> Rejection {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": "No Todo matches the given query."})),
    )
}

/// Trims the title and checks both fields, collecting every problem.
fn validate(input: TodoInput) -> Result<(String, Status), Rejection> {
    let mut errors = serde_json::Map::new();

    let title = match input.title.as_deref().map(str::trim) {
        None => {
            errors.insert("title".into(), json!(["This field is required."]));
            String::new()
        }
        Some("") => {
            errors.insert("title".into(), json!(["This field may not be blank."]));
            String::new()
        }
        Some(t) if t.chars().count() > MAX_TITLE_CHARS => {
            errors.insert(
                "title".into(),
                json!([format!("Ensure this field has no more than {MAX_TITLE_CHARS} characters.")]),
            );
            String::new()
        }
        Some(t) => t.to_string(),
    };

    let status = match input.status.as_deref() {
        None | Some("incomplete") => Status::Incomplete,
        Some("complete") => Status::Complete,
        Some(other) => {
            errors.insert(
                "status".into(),
                json!([format!("\"{other}\" is not a valid choice.")]),
            );
            Status::Incomplete
        }
    };

    if errors.is_empty() {
        Ok((title, status))
    } else {
        Err((StatusCode::BAD_REQUEST, Json(Value::Object(errors))))
    }
}
