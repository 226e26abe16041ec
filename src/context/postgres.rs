//! PostgreSQL data context over a `PgPool`.

use super::{ChangeSet, DataContext};
use crate::error::AppError;
use crate::model::{Entity, EntityPredicate};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PgDataContext {
    pool: PgPool,
    schema: String,
}

impl PgDataContext {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDataContext {
            pool,
            schema: schema.into(),
        }
    }

    fn bind(q: &QueryBuf) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query
    }

    async fn query_optional(&self, q: &QueryBuf) -> Result<Option<Entity>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind(q).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_entity).transpose().map_err(AppError::Db)
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Entity>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = Self::bind(q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_entity).collect::<Result<_, _>>().map_err(AppError::Db)
    }
}

#[async_trait]
impl DataContext for PgDataContext {
    async fn find(&self, id: i32) -> Result<Option<Entity>, AppError> {
        self.query_optional(&sql::select_by_id(&self.schema, id)).await
    }

    async fn first(&self, predicate: &EntityPredicate) -> Result<Option<Entity>, AppError> {
        self.query_optional(&sql::select_where(&self.schema, predicate, Some(1))).await
    }

    async fn filter(&self, predicate: &EntityPredicate) -> Result<Vec<Entity>, AppError> {
        self.query_many(&sql::select_where(&self.schema, predicate, None)).await
    }

    /// Removes, then updates, then inserts, all in one transaction.
    async fn save_changes(&self, changes: ChangeSet) -> Result<Vec<Entity>, AppError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.pool.begin().await?;

        if !changes.removed().is_empty() {
            let q = sql::delete_by_ids(&self.schema, changes.removed());
            tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
            let done = Self::bind(&q).execute(&mut *tx).await?;
            tracing::debug!(rows = done.rows_affected(), "deleted");
        }

        for entity in changes.modified() {
            let q = sql::update(&self.schema, entity);
            tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
            Self::bind(&q).execute(&mut *tx).await?;
        }

        let mut created = Vec::with_capacity(changes.added().len());
        for entity in changes.added() {
            let q = sql::insert(&self.schema, entity);
            tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
            let row = Self::bind(&q).fetch_one(&mut *tx).await?;
            created.push(row_to_entity(&row)?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn row_to_entity(row: &PgRow) -> Result<Entity, sqlx::Error> {
    let extra = match row.try_get::<Option<Value>, _>("extra")? {
        Some(Value::Object(m)) => m,
        _ => serde_json::Map::new(),
    };
    Ok(Entity {
        id: row.try_get("id")?,
        property1: row.try_get("property1")?,
        property2: row.try_get("property2")?,
        extra,
    })
}
