//! In-process data context. Backs tests and `DATA_CONTEXT=memory`.

use super::{ChangeSet, DataContext};
use crate::error::AppError;
use crate::model::{Entity, EntityPredicate};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Table {
    rows: BTreeMap<i32, Entity>,
    next_id: i32,
}

#[derive(Debug)]
pub struct InMemoryDataContext {
    table: RwLock<Table>,
}

impl Default for InMemoryDataContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDataContext {
    pub fn new() -> Self {
        InMemoryDataContext {
            table: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Seed with existing rows, keeping their ids. The id sequence continues after the largest one.
    pub fn with_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = Entity>,
    {
        let rows: BTreeMap<i32, Entity> = entities.into_iter().map(|e| (e.id, e)).collect();
        let next_id = rows.keys().next_back().map(|id| id + 1).unwrap_or(1).max(1);
        InMemoryDataContext {
            table: RwLock::new(Table { rows, next_id }),
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DataContext for InMemoryDataContext {
    async fn find(&self, id: i32) -> Result<Option<Entity>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn first(&self, predicate: &EntityPredicate) -> Result<Option<Entity>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|e| predicate.matches(e)).cloned())
    }

    async fn filter(&self, predicate: &EntityPredicate) -> Result<Vec<Entity>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|e| predicate.matches(e)).cloned().collect())
    }

    /// Same order as the Postgres context: removes, updates, inserts. Updates to missing rows are skipped.
    async fn save_changes(&self, changes: ChangeSet) -> Result<Vec<Entity>, AppError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        let mut table = self.table.write().await;

        for id in changes.removed() {
            table.rows.remove(id);
        }

        for entity in changes.modified() {
            if let Some(row) = table.rows.get_mut(&entity.id) {
                row.apply(entity);
            }
        }

        let mut created = Vec::with_capacity(changes.added().len());
        for entity in changes.added() {
            let id = table.next_id;
            table.next_id += 1;
            let mut row = entity.clone();
            row.id = id;
            table.rows.insert(id, row.clone());
            created.push(row);
        }
        tracing::debug!(
            removed = changes.removed().len(),
            modified = changes.modified().len(),
            added = created.len(),
            "saved changes"
        );
        Ok(created)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
