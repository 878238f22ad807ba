//! Conversion from stored entities to the wire representation.

use tracker_api::v1::Todo;

use crate::store::TodoEntity;

pub fn to_dto(entity: TodoEntity) -> Todo {
    Todo {
        id: entity.id,
        name: entity.name,
        description: entity.description,
        estimated_time_sec: entity.estimated_time_sec,
        actual_time_sec: entity.actual_time_sec,
        due_date: entity.due_date,
        priority: entity.priority,
        status: entity.status,
        reflection_memo: entity.reflection_memo,
        owner_id: entity.owner_id,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}

pub fn to_dto_list(entities: Vec<TodoEntity>) -> Vec<Todo> {
    entities.into_iter().map(to_dto).collect()
}
