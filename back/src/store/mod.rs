//! Persistence boundary for todos.
//!
//! The use-case layer only sees [`TodoStore`]. [`memory::MemoryStore`] is the
//! adapter shipped with the server; anything else that can honor the same
//! contract can be swapped in.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracker_api::v1::{Patch, Priority, Status};

use crate::validate::{DESCRIPTION_MAX_LEN, NAME_MAX_LEN, REFLECTION_MEMO_MAX_LEN};

pub type TodoId = i32;

pub const DEFAULT_ESTIMATED_TIME_SEC: i32 = 1;
pub const DEFAULT_ACTUAL_TIME_SEC: i32 = 0;

/// A todo as the store keeps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TodoEntity {
    pub id: TodoId,
    pub name: String,
    pub description: Option<String>,
    pub estimated_time_sec: i32,
    pub actual_time_sec: i32,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    pub reflection_memo: Option<String>,
    pub owner_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoEntity {
    /// Checks the invariants every stored row must satisfy.
    pub fn check(&self) -> Result<(), StoreError> {
        fn too_long(value: Option<&str>, max: usize) -> bool {
            value.is_some_and(|value| value.chars().count() > max)
        }

        let violation = if self.name.is_empty() || too_long(Some(&*self.name), NAME_MAX_LEN) {
            "name must be 1 to 255 characters"
        } else if too_long(self.description.as_deref(), DESCRIPTION_MAX_LEN) {
            "description exceeds 1000 characters"
        } else if too_long(self.reflection_memo.as_deref(), REFLECTION_MEMO_MAX_LEN) {
            "reflection_memo exceeds 2000 characters"
        } else if self.estimated_time_sec < 1 {
            "estimated_time_sec must be at least 1"
        } else if self.actual_time_sec < 0 {
            "actual_time_sec must not be negative"
        } else if self.owner_id.is_some_and(|owner| owner <= 0) {
            "owner_id must be positive"
        } else {
            return Ok(());
        };

        Err(StoreError::Constraint(format!("todo {}: {violation}", self.id)))
    }
}

/// Fields for a new todo. `None` enum and time fields take the store defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTodo {
    pub name: String,
    pub description: Option<String>,
    pub estimated_time_sec: Option<i32>,
    pub actual_time_sec: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub reflection_memo: Option<String>,
    pub owner_id: Option<i32>,
}

/// A partial update. Only the fields that are set are written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoChanges {
    pub name: Option<String>,
    pub description: Patch<String>,
    pub estimated_time_sec: Option<i32>,
    /// Clearing resets to the default of zero.
    pub actual_time_sec: Patch<i32>,
    pub due_date: Patch<NaiveDate>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub reflection_memo: Patch<String>,
}

impl TodoChanges {
    pub fn apply(self, todo: &mut TodoEntity) {
        if let Some(name) = self.name {
            todo.name = name;
        }
        self.description.apply(&mut todo.description);
        if let Some(seconds) = self.estimated_time_sec {
            todo.estimated_time_sec = seconds;
        }
        match self.actual_time_sec {
            Patch::Absent => {}
            Patch::Null => todo.actual_time_sec = DEFAULT_ACTUAL_TIME_SEC,
            Patch::Value(seconds) => todo.actual_time_sec = seconds,
        }
        self.due_date.apply(&mut todo.due_date);
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        self.reflection_memo.apply(&mut todo.reflection_memo);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("todo {0} not found")]
    NotFound(TodoId),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] ron::de::SpannedError),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] ron::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn get(&self, id: TodoId) -> Result<TodoEntity, StoreError>;

    /// All todos ordered by id. Empty when there are none.
    async fn list(&self) -> Result<Vec<TodoEntity>, StoreError>;

    /// Assigns the id and both timestamps.
    async fn create(&self, todo: NewTodo) -> Result<TodoEntity, StoreError>;

    /// Applies `changes` and refreshes `updated_at`.
    async fn update(&self, id: TodoId, changes: TodoChanges) -> Result<TodoEntity, StoreError>;

    async fn delete(&self, id: TodoId) -> Result<(), StoreError>;
}
