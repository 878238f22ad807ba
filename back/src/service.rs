use std::sync::Arc;

use tracing::info;
use tracker_api::v1::{Patch, Todo, TodoCreationRequest, TodoUpdateRequest};

use crate::{
    error::TodoError,
    mapper,
    store::{NewTodo, TodoChanges, TodoId, TodoStore},
    validate::{self, DESCRIPTION_MAX_LEN, REFLECTION_MEMO_MAX_LEN},
};

/// The todo use cases: validate, call the store, map to the wire type.
///
/// Validation always runs before the store is asked to write anything, so a
/// rejected request never leaves a partial change behind. Concurrent updates
/// of the same todo are last-write-wins.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        let todos = self.store.list().await?;
        Ok(mapper::to_dto_list(todos))
    }

    pub async fn get_todo(&self, id: TodoId) -> Result<Todo, TodoError> {
        let todo = self.store.get(id).await?;
        Ok(mapper::to_dto(todo))
    }

    pub async fn create_todo(&self, request: TodoCreationRequest) -> Result<Todo, TodoError> {
        let new_todo = Self::new_todo(request)?;
        let todo = self.store.create(new_todo).await?;

        info!(
            id = todo.id,
            name = %todo.name,
            priority = %todo.priority,
            "created todo"
        );

        Ok(mapper::to_dto(todo))
    }

    fn new_todo(request: TodoCreationRequest) -> Result<NewTodo, TodoError> {
        validate::validate_name(&request.name)?;
        validate::validate_estimated_time(request.estimated_time_sec)?;

        if let Some(seconds) = request.actual_time_sec {
            validate::validate_actual_time(seconds)?;
        }
        if let Some(description) = &request.description {
            validate::validate_len("description", description, DESCRIPTION_MAX_LEN)?;
        }
        if let Some(memo) = &request.reflection_memo {
            validate::validate_len("reflectionMemo", memo, REFLECTION_MEMO_MAX_LEN)?;
        }

        let priority = request
            .priority
            .as_deref()
            .map(validate::validate_priority)
            .transpose()?;
        let status = request
            .status
            .as_deref()
            .map(validate::validate_status)
            .transpose()?;
        let due_date = match request.due_date.as_deref() {
            Some(date) => validate::parse_due_date(date)?,
            None => None,
        };

        Ok(NewTodo {
            name: request.name,
            description: request.description,
            estimated_time_sec: Some(request.estimated_time_sec),
            actual_time_sec: request.actual_time_sec,
            due_date,
            priority,
            status,
            reflection_memo: request.reflection_memo,
            owner_id: request.owner_id,
        })
    }

    pub async fn update_todo(
        &self,
        id: TodoId,
        request: TodoUpdateRequest,
    ) -> Result<Todo, TodoError> {
        self.store.get(id).await?;

        let changes = Self::changes(request)?;
        let todo = self.store.update(id, changes).await?;

        info!(id = todo.id, status = %todo.status, "updated todo");

        Ok(mapper::to_dto(todo))
    }

    fn changes(request: TodoUpdateRequest) -> Result<TodoChanges, TodoError> {
        if request.is_empty() {
            return Err(TodoError::validation(
                "update request must contain at least one field",
            ));
        }

        if let Some(name) = &request.name {
            if name.is_empty() {
                return Err(TodoError::validation(
                    "name cannot be empty when provided for update",
                ));
            }
            validate::validate_name(name)?;
        }
        if let Some(seconds) = request.estimated_time_sec {
            validate::validate_estimated_time(seconds)?;
        }
        if let Patch::Value(seconds) = request.actual_time_sec.as_ref() {
            validate::validate_actual_time(*seconds)?;
        }
        if let Patch::Value(description) = request.description.as_ref() {
            validate::validate_len("description", description, DESCRIPTION_MAX_LEN)?;
        }
        if let Patch::Value(memo) = request.reflection_memo.as_ref() {
            validate::validate_len("reflectionMemo", memo, REFLECTION_MEMO_MAX_LEN)?;
        }

        let priority = request
            .priority
            .as_deref()
            .map(validate::validate_priority)
            .transpose()?;
        let status = request
            .status
            .as_deref()
            .map(validate::validate_status)
            .transpose()?;
        // a zero date clears the field just like an explicit null
        let due_date = match request.due_date.try_map(|date| validate::parse_due_date(&date))? {
            Patch::Value(None) => Patch::Null,
            Patch::Value(Some(date)) => Patch::Value(date),
            Patch::Null => Patch::Null,
            Patch::Absent => Patch::Absent,
        };

        Ok(TodoChanges {
            name: request.name,
            description: request.description,
            estimated_time_sec: request.estimated_time_sec,
            actual_time_sec: request.actual_time_sec,
            due_date,
            priority,
            status,
            reflection_memo: request.reflection_memo,
        })
    }

    pub async fn delete_todo(&self, id: TodoId) -> Result<(), TodoError> {
        self.store.delete(id).await?;

        info!(id, "deleted todo");

        Ok(())
    }
}
