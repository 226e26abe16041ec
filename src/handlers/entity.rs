//! Entity handlers: get, search, filter, create, update, delete, bulk delete.

use crate::context::ChangeSet;
use crate::error::AppError;
use crate::extractors::{EntityId, OptionalJson};
use crate::model::{Entity, EntityFilter, EntityPredicate};
use crate::response;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

/// GET /{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    let entity = state
        .context
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    Ok(response::ok(entity))
}

/// GET /search/{id}: first row whose id matches.
pub async fn search(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    let entity = state
        .context
        .first(&EntityPredicate::Id(id))
        .await?
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    Ok(response::ok(entity))
}

/// GET /filter?property1=&property2=. No match is an empty list, not a 404.
pub async fn filter(
    State(state): State<AppState>,
    Query(filter): Query<EntityFilter>,
) -> Result<impl IntoResponse, AppError> {
    let entities = state.context.filter(&filter.into()).await?;
    Ok(response::ok(entities))
}

/// POST /
pub async fn create(
    State(state): State<AppState>,
    OptionalJson(body): OptionalJson<Entity>,
) -> Result<impl IntoResponse, AppError> {
    let candidate = body.ok_or_else(|| AppError::BadRequest("body is required".into()))?;
    let mut changes = ChangeSet::new();
    changes.add(candidate);
    let created = state
        .context
        .save_changes(changes)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
    tracing::info!(id = created.id, "entity created");
    let location = state.location_of(created.id);
    Ok(response::created_at(&location, created))
}

/// PUT /{id}
pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    OptionalJson(body): OptionalJson<Entity>,
) -> Result<impl IntoResponse, AppError> {
    let updated = match body {
        Some(b) if b.id == id => b,
        Some(b) => {
            return Err(AppError::BadRequest(format!(
                "body id {} does not match path id {}",
                b.id, id
            )))
        }
        None => return Err(AppError::BadRequest("body is required".into())),
    };
    let mut entity = state
        .context
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    entity.apply(&updated);

    let mut changes = ChangeSet::new();
    changes.update(entity);
    state.context.save_changes(changes).await?;
    Ok(response::no_content())
}

/// DELETE /{id}
pub async fn delete(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    let entity = state
        .context
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    let mut changes = ChangeSet::new();
    changes.remove(&entity);
    state.context.save_changes(changes).await?;
    Ok(response::no_content())
}

/// DELETE /bulk?property1=&property2=. No match is a 404.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Query(filter): Query<EntityFilter>,
) -> Result<impl IntoResponse, AppError> {
    let predicate: EntityPredicate = filter.into();
    let entities = state.context.filter(&predicate).await?;
    if entities.is_empty() {
        return Err(AppError::NotFound(format!("no entities match {:?}", predicate)));
    }
    let mut changes = ChangeSet::new();
    changes.remove_range(&entities);
    state.context.save_changes(changes).await?;
    tracing::info!(count = entities.len(), "entities deleted");
    Ok(response::no_content())
}
