//! In-memory collection of todos, keyed by id, kept in insertion order.
//!
//! Every operation is a single synchronous step with no I/O. The store
//! never holds two entries with the same id: `add` and `replace_all` refuse
//! duplicates and leave the collection untouched when they do.

use std::collections::HashSet;

use crate::error::StoreError;
use crate::types::{Todo, TodoId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoStore {
    todos: Vec<Todo>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, todo: Todo) -> Result<(), StoreError> {
        if self.position(todo.id).is_some() {
            return Err(StoreError::DuplicateId(todo.id));
        }
        self.todos.push(todo);
        Ok(())
    }

    /// Replaces the entry with the same id wholesale, keeping its position.
    pub fn update(&mut self, todo: Todo) -> Result<(), StoreError> {
        let index = self.position(todo.id).ok_or(StoreError::NotFound(todo.id))?;
        self.todos[index] = todo;
        Ok(())
    }

    pub fn remove(&mut self, id: TodoId) -> Result<Todo, StoreError> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        Ok(self.todos.remove(index))
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn get_all(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Swaps in a fresh collection, e.g. one just listed from the server.
    pub fn replace_all(&mut self, todos: Vec<Todo>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(todos.len());
        if let Some(dup) = todos.iter().find(|todo| !seen.insert(todo.id)) {
            return Err(StoreError::DuplicateId(dup.id));
        }
        self.todos = todos;
        Ok(())
    }

    fn position(&self, id: TodoId) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id == id)
    }
}
