//! Turns user intents into ordered store mutations around remote calls.
//!
//! # Design
//! Each intent runs as its own short sequence: an optional optimistic
//! mutation, one remote call, then a reconciling mutation (or rollback), and
//! finally an `IntentOutcome` for the user. Intents share nothing but the
//! store, and the controller is the only owner of it.
//!
//! The store lives behind a `RefCell` and is only borrowed between await
//! points, so several intents can be in flight on one thread. Whichever call
//! resolves last writes last, unless stale-response fencing is enabled: then
//! every replace takes a per-entity sequence number, and a response may only
//! reconcile if no newer replace of that entity has already succeeded. A
//! failed replace supersedes nothing. A toggle rolls back only when every
//! newer replace has failed, and then to the last confirmed status.
//!
//! - Toggle: flip first, then replace. A failure keeps the flip unless the
//!   policy is `RollBack`.
//! - Add: validate, create, and only then insert (the id comes from the
//!   server).
//! - Edit: validate, replace, and apply the server's echoed title/status.
//! - Delete: delete remotely, then remove locally. Never optimistic, since
//!   a removed entity cannot be recreated under the same id.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, error, info, warn};

use crate::client::RemoteTodoClient;
use crate::config::{SyncConfig, ToggleFailurePolicy};
use crate::error::{IntentError, RemoteError, StoreError, ValidationError};
use crate::store::TodoStore;
use crate::types::{Status, Todo, TodoId};

const ADDED: &str = "Task added successfully";
const UPDATED: &str = "Task updated successfully";
const DELETED: &str = "Todo deleted successfully";
const GENERIC_FAILURE: &str = "Something went wrong";

/// A discrete user action, handed to [`TodoSyncController::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Toggle { id: TodoId },
    Add { title: String, status: Status },
    Edit { id: TodoId, title: String, status: Status },
    Delete { id: TodoId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected locally; no remote call was made.
    Validation,
    /// The intent named an id the store does not hold.
    UnknownTodo,
    /// No response from the server.
    Transport,
    /// The server answered with a failure status.
    Rejected,
    /// The server's answer could not be understood.
    Protocol,
}

/// What the user gets told once an intent has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Succeeded(String),
    Failed { kind: FailureKind, message: String },
}

impl IntentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IntentOutcome::Succeeded(_))
    }

    pub fn message(&self) -> &str {
        match self {
            IntentOutcome::Succeeded(message) => message,
            IntentOutcome::Failed { message, .. } => message,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            IntentOutcome::Succeeded(_) => None,
            IntentOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    /// An edit surface stays open only when its input was rejected locally.
    pub fn keeps_editor_open(&self) -> bool {
        self.failure_kind() == Some(FailureKind::Validation)
    }
}

/// Behavior switches for [`TodoSyncController`]. The defaults keep a failed
/// toggle's flip and let the last-resolved response win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    pub toggle_failure: ToggleFailurePolicy,
    pub fence_stale_responses: bool,
}

impl From<&SyncConfig> for ControllerOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            toggle_failure: config.toggle_failure_policy(),
            fence_stale_responses: config.fence_stale_responses,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Load,
    Add,
    Update,
    Delete,
}

impl Operation {
    fn describe(self) -> &'static str {
        match self {
            Operation::Load => "load todos",
            Operation::Add => "add todo",
            Operation::Update => "update todo",
            Operation::Delete => "delete todo",
        }
    }
}

/// Replace bookkeeping for one entity while fencing is on. Dropped once no
/// replace is pending.
#[derive(Debug, Default)]
struct Fence {
    issued: u64,
    /// Newest sequence number whose replace succeeded.
    confirmed: u64,
    pending: BTreeSet<u64>,
    /// Status as of `confirmed`, or before the oldest pending replace.
    baseline: Status,
}

/// Applies intents to the local store around calls to the remote API and
/// reports each one as an [`IntentOutcome`].
///
/// Single-threaded: intents may interleave at await points on one task or
/// `LocalSet`, and the controller is not `Sync`.
pub struct TodoSyncController {
    client: RemoteTodoClient,
    store: RefCell<TodoStore>,
    fences: RefCell<HashMap<TodoId, Fence>>,
    options: ControllerOptions,
}

impl TodoSyncController {
    pub fn new(client: RemoteTodoClient, options: ControllerOptions) -> Self {
        Self::with_store(client, TodoStore::new(), options)
    }

    pub fn with_store(client: RemoteTodoClient, store: TodoStore, options: ControllerOptions) -> Self {
        Self {
            client,
            store: RefCell::new(store),
            fences: RefCell::new(HashMap::new()),
            options,
        }
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// Snapshot of the store in insertion order.
    pub fn get_all(&self) -> Vec<Todo> {
        self.store.borrow().get_all().to_vec()
    }

    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.store.borrow().get(id).cloned()
    }

    pub async fn dispatch(&self, intent: Intent) -> IntentOutcome {
        match intent {
            Intent::Toggle { id } => self.submit_toggle(id).await,
            Intent::Add { title, status } => self.submit_add(&title, status).await,
            Intent::Edit { id, title, status } => self.submit_edit(id, &title, status).await,
            Intent::Delete { id } => self.submit_delete(id).await,
        }
    }

    /// Replaces the local collection with the server's.
    pub async fn refresh(&self) -> IntentOutcome {
        conclude(Operation::Load, self.load().await)
    }

    pub async fn submit_toggle(&self, id: TodoId) -> IntentOutcome {
        conclude(Operation::Update, self.toggle(id).await)
    }

    pub async fn submit_add(&self, title: &str, status: Status) -> IntentOutcome {
        conclude(Operation::Add, self.add(title, status).await)
    }

    pub async fn submit_edit(&self, id: TodoId, title: &str, status: Status) -> IntentOutcome {
        conclude(Operation::Update, self.edit(id, title, status).await)
    }

    pub async fn submit_delete(&self, id: TodoId) -> IntentOutcome {
        conclude(Operation::Delete, self.delete(id).await)
    }

    async fn load(&self) -> Result<String, IntentError> {
        let todos = self.client.list().await?;
        let count = todos.len();
        let mut store = self.store.borrow_mut();
        if let Err(err) = store.replace_all(todos) {
            // The server listed the same id twice; keep what we had.
            error!(error = %err, "refusing listed collection");
            return Err(RemoteError::InvalidBody(err.to_string()).into());
        }
        self.fences.borrow_mut().retain(|id, _| store.get(*id).is_some());
        info!(count, "loaded todos");
        Ok(format!("Loaded {count} todos"))
    }

    async fn toggle(&self, id: TodoId) -> Result<String, IntentError> {
        let (flipped, previous) = {
            let mut store = self.store.borrow_mut();
            let current = store.get(id).cloned().ok_or(IntentError::UnknownTodo(id))?;
            let previous = current.status;
            let flipped = Todo {
                status: previous.flipped(),
                ..current
            };
            invariant(store.update(flipped.clone()));
            (flipped, previous)
        };
        let ticket = self.issue(id, previous);

        match self.client.replace(id, &flipped.title, flipped.status).await {
            Ok(_) => {
                if self.options.fence_stale_responses {
                    if self.confirm(id, ticket, flipped.status) {
                        // An older replace may have landed in between.
                        self.set_status(id, flipped.status);
                    } else {
                        debug!(%id, ticket, "discarding superseded toggle response");
                    }
                }
                Ok(UPDATED.to_string())
            }
            Err(err) => {
                let restore = self.release(id, ticket, previous);
                if self.options.toggle_failure == ToggleFailurePolicy::RollBack {
                    match restore {
                        Some(status) => self.set_status(id, status),
                        None => debug!(%id, ticket, "skipping rollback of superseded toggle"),
                    }
                }
                Err(err.into())
            }
        }
    }

    async fn add(&self, title: &str, status: Status) -> Result<String, IntentError> {
        validate_title(title)?;
        let created = self.client.create(title, status).await?;
        invariant(self.store.borrow_mut().add(created));
        Ok(ADDED.to_string())
    }

    async fn edit(&self, id: TodoId, title: &str, status: Status) -> Result<String, IntentError> {
        validate_title(title)?;
        let current = self.get(id).ok_or(IntentError::UnknownTodo(id))?.status;
        let ticket = self.issue(id, current);
        let echoed = match self.client.replace(id, title, status).await {
            Ok(echoed) => echoed,
            Err(err) => {
                self.release(id, ticket, current);
                return Err(err.into());
            }
        };

        if !self.confirm(id, ticket, echoed.status) {
            debug!(%id, ticket, "discarding superseded edit response");
            return Ok(UPDATED.to_string());
        }

        let mut store = self.store.borrow_mut();
        match store.get(id).cloned() {
            Some(existing) => invariant(store.update(Todo {
                title: echoed.title,
                status: echoed.status,
                ..existing
            })),
            None => warn!(%id, "edited todo is gone locally; dropping server echo"),
        }
        Ok(UPDATED.to_string())
    }

    async fn delete(&self, id: TodoId) -> Result<String, IntentError> {
        self.client.delete(id).await?;
        if let Err(err) = self.store.borrow_mut().remove(id) {
            warn!(%id, error = %err, "deleted todo was already gone locally");
        }
        self.fences.borrow_mut().remove(&id);
        Ok(DELETED.to_string())
    }

    fn set_status(&self, id: TodoId, status: Status) {
        let mut store = self.store.borrow_mut();
        match store.get(id).cloned() {
            Some(current) => invariant(store.update(Todo { status, ..current })),
            None => warn!(%id, "toggled todo is gone locally; dropping status"),
        }
    }

    /// Takes the next sequence number for a replace of `id`. `current` is the
    /// entity's status before any optimistic change. Always 0 without fencing.
    fn issue(&self, id: TodoId, current: Status) -> u64 {
        if !self.options.fence_stale_responses {
            return 0;
        }
        let mut fences = self.fences.borrow_mut();
        let fence = fences.entry(id).or_default();
        if fence.pending.is_empty() {
            fence.baseline = current;
        }
        fence.issued += 1;
        fence.pending.insert(fence.issued);
        fence.issued
    }

    /// Records a successful replace. False when a newer replace of the same
    /// entity already succeeded, in which case the response must be dropped.
    fn confirm(&self, id: TodoId, ticket: u64, status: Status) -> bool {
        if !self.options.fence_stale_responses {
            return true;
        }
        let mut fences = self.fences.borrow_mut();
        let Some(fence) = fences.get_mut(&id) else {
            return true;
        };
        fence.pending.remove(&ticket);
        let newest = ticket > fence.confirmed;
        if newest {
            fence.confirmed = ticket;
            fence.baseline = status;
        }
        if fence.pending.is_empty() {
            fences.remove(&id);
        }
        newest
    }

    /// Records a failed replace and returns the status a rollback should
    /// restore, or `None` while a newer replace is pending or has succeeded.
    /// Without fencing the answer is always `previous`.
    fn release(&self, id: TodoId, ticket: u64, previous: Status) -> Option<Status> {
        if !self.options.fence_stale_responses {
            return Some(previous);
        }
        let mut fences = self.fences.borrow_mut();
        let fence = fences.get_mut(&id)?;
        fence.pending.remove(&ticket);
        let superseded =
            ticket < fence.confirmed || fence.pending.range(ticket + 1..).next().is_some();
        let restore = (!superseded).then_some(fence.baseline);
        if fence.pending.is_empty() {
            fences.remove(&id);
        }
        restore
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// Store errors at this point mean the controller itself is wrong.
fn invariant(result: Result<(), StoreError>) {
    if let Err(err) = result {
        error!(error = %err, "local store invariant violated");
    }
}

fn conclude(operation: Operation, result: Result<String, IntentError>) -> IntentOutcome {
    let (kind, message) = match result {
        Ok(message) => return IntentOutcome::Succeeded(message),
        Err(IntentError::Validation(err)) => (FailureKind::Validation, err.to_string()),
        Err(IntentError::UnknownTodo(id)) => {
            (FailureKind::UnknownTodo, format!("Todo {id} no longer exists"))
        }
        Err(IntentError::Remote(err)) => {
            warn!(operation = operation.describe(), error = %err, "remote call failed");
            match err {
                RemoteError::Transport(_) => (FailureKind::Transport, GENERIC_FAILURE.to_string()),
                RemoteError::Rejected { status, .. } => (
                    FailureKind::Rejected,
                    format!("Failed to {} (status {status})", operation.describe()),
                ),
                RemoteError::InvalidBody(_) | RemoteError::Encode(_) => {
                    (FailureKind::Protocol, GENERIC_FAILURE.to_string())
                }
            }
        }
    };
    IntentOutcome::Failed { kind, message }
}
