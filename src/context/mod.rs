//! Data context: the storage seam behind the entity controller.
//!
//! Reads go straight to the store. Writes are staged in a [`ChangeSet`] and
//! committed by a single [`DataContext::save_changes`] call, which applies the
//! whole set atomically or not at all.

mod memory;
mod postgres;

pub use memory::InMemoryDataContext;
pub use postgres::PgDataContext;

use crate::error::AppError;
use crate::model::{Entity, EntityPredicate};
use async_trait::async_trait;

#[async_trait]
pub trait DataContext: Send + Sync {
    /// Lookup by primary key.
    async fn find(&self, id: i32) -> Result<Option<Entity>, AppError>;

    /// First row (lowest id) matching the predicate.
    async fn first(&self, predicate: &EntityPredicate) -> Result<Option<Entity>, AppError>;

    /// All rows matching the predicate, ordered by id.
    async fn filter(&self, predicate: &EntityPredicate) -> Result<Vec<Entity>, AppError>;

    /// Persist pending changes. Returns the added entities, in the order they
    /// were added, carrying their store-assigned ids.
    async fn save_changes(&self, changes: ChangeSet) -> Result<Vec<Entity>, AppError>;

    /// Cheap round trip to the store, used by `/ready`.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Pending writes for one request.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    added: Vec<Entity>,
    modified: Vec<Entity>,
    removed: Vec<i32>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an insert. Any id on `entity` is ignored; the store assigns one.
    pub fn add(&mut self, entity: Entity) -> &mut Self {
        self.added.push(entity);
        self
    }

    /// Stage an overwrite of the row with `entity.id`.
    pub fn update(&mut self, entity: Entity) -> &mut Self {
        self.modified.push(entity);
        self
    }

    pub fn remove(&mut self, entity: &Entity) -> &mut Self {
        self.removed.push(entity.id);
        self
    }

    pub fn remove_range<'a, I>(&mut self, entities: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        self.removed.extend(entities.into_iter().map(|e| e.id));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn added(&self) -> &[Entity] {
        &self.added
    }

    pub fn modified(&self) -> &[Entity] {
        &self.modified
    }

    pub fn removed(&self) -> &[i32] {
        &self.removed
    }
}
