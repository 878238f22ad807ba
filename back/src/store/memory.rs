use std::{
    collections::BTreeMap,
    fs, io,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    NewTodo, StoreError, TodoChanges, TodoEntity, TodoId, TodoStore, DEFAULT_ACTUAL_TIME_SEC,
    DEFAULT_ESTIMATED_TIME_SEC,
};

#[derive(Debug)]
pub struct MemoryStore {
    generation: AtomicU64,
    data: Mutex<Tables>,
}

#[derive(Debug)]
struct Tables {
    next_id: TodoId,
    todos: BTreeMap<TodoId, TodoEntity>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            next_id: 1,
            todos: BTreeMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_tables(Tables::default())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot written by [`MemoryStore::save`]. A missing file
    /// yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = match fs::File::open(path.as_ref()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let data: DataOwned = ron::de::from_reader(file)?;

        match data {
            DataOwned::V1 { next_id, todos } => Self::from_v1(next_id, todos),
        }
    }

    fn from_v1(next_id: TodoId, todos: BTreeMap<TodoId, TodoEntity>) -> Result<Self, StoreError> {
        for todo in todos.values() {
            todo.check()?;
        }

        // never hand out an id that is already in the snapshot
        let next_id = match todos.keys().next_back() {
            Some(last) => next_id.max(following_id(*last)?),
            None => next_id,
        };

        Ok(Self::from_tables(Tables { next_id, todos }))
    }

    fn from_tables(tables: Tables) -> Self {
        Self {
            generation: AtomicU64::new(0),
            data: Mutex::new(tables),
        }
    }

    /// Bumped on every successful mutation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    fn increment_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Writes a snapshot to `path` and returns the generation it captured.
    ///
    /// The snapshot goes to a sibling temp file first and is renamed over
    /// `path`, so a crash mid-write leaves the previous snapshot intact.
    ///
    /// Only the copy of the tables is taken under the lock; the file is
    /// written on the blocking pool.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<u64, StoreError> {
        let path = path.as_ref().to_path_buf();
        let (generation, next_id, todos) = {
            let tables = self.data.lock().await;
            (self.generation(), tables.next_id, tables.todos.clone())
        };
        let count = todos.len();

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&target, next_id, &todos))
            .await
            .map_err(io::Error::other)??;

        debug!(path = %path.display(), generation, todos = count, "saved snapshot");

        Ok(generation)
    }
}

fn write_snapshot(
    path: &Path,
    next_id: TodoId,
    todos: &BTreeMap<TodoId, TodoEntity>,
) -> Result<(), StoreError> {
    let data = DataBorrowed::V1 { next_id, todos };

    let tmp = path.with_extension("ron.tmp");
    let file = fs::File::create(&tmp)?;
    ron::ser::to_writer_pretty(file, &data, Default::default())?;
    fs::rename(&tmp, path)?;

    Ok(())
}

fn following_id(id: TodoId) -> Result<TodoId, StoreError> {
    id.checked_add(1)
        .ok_or_else(|| StoreError::Constraint(format!("no todo id left after {id}")))
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn get(&self, id: TodoId) -> Result<TodoEntity, StoreError> {
        let tables = self.data.lock().await;
        tables.todos.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<TodoEntity>, StoreError> {
        let tables = self.data.lock().await;
        Ok(tables.todos.values().cloned().collect())
    }

    async fn create(&self, todo: NewTodo) -> Result<TodoEntity, StoreError> {
        let mut tables = self.data.lock().await;
        let now = Utc::now();

        let entity = TodoEntity {
            id: tables.next_id,
            name: todo.name,
            description: todo.description,
            estimated_time_sec: todo.estimated_time_sec.unwrap_or(DEFAULT_ESTIMATED_TIME_SEC),
            actual_time_sec: todo.actual_time_sec.unwrap_or(DEFAULT_ACTUAL_TIME_SEC),
            due_date: todo.due_date,
            priority: todo.priority.unwrap_or_default(),
            status: todo.status.unwrap_or_default(),
            reflection_memo: todo.reflection_memo,
            owner_id: todo.owner_id,
            created_at: now,
            updated_at: now,
        };
        entity.check()?;
        let next_id = following_id(entity.id)?;

        tables.next_id = next_id;
        tables.todos.insert(entity.id, entity.clone());
        self.increment_generation();

        Ok(entity)
    }

    async fn update(&self, id: TodoId, changes: TodoChanges) -> Result<TodoEntity, StoreError> {
        let mut tables = self.data.lock().await;
        let current = tables.todos.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        let mut updated = current.clone();
        changes.apply(&mut updated);
        updated.updated_at = Utc::now().max(current.updated_at);
        updated.check()?;

        *current = updated.clone();
        self.increment_generation();

        Ok(updated)
    }

    async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        let mut tables = self.data.lock().await;
        tables.todos.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.increment_generation();

        Ok(())
    }
}

#[derive(Serialize)]
enum DataBorrowed<'a> {
    V1 {
        next_id: TodoId,
        todos: &'a BTreeMap<TodoId, TodoEntity>,
    },
}

#[derive(Deserialize)]
enum DataOwned {
    V1 {
        next_id: TodoId,
        todos: BTreeMap<TodoId, TodoEntity>,
    },
}
