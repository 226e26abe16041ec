//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for the `entities` table.

use super::PgBindValue;
use crate::model::{Entity, EntityPredicate};
use serde_json::Value;

pub const ENTITY_TABLE: &str = "entities";

const COLUMNS: &[&str] = &["id", "property1", "property2", "extra"];

/// Quote identifier for PostgreSQL (safe: only from settings).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(ENTITY_TABLE))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: impl Into<PgBindValue>) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v.into());
        n
    }
}

fn select_column_list() -> String {
    COLUMNS.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
}

/// WHERE clause body for a predicate; params are appended to `q`.
fn predicate_clause(q: &mut QueryBuf, predicate: &EntityPredicate) -> String {
    match predicate {
        EntityPredicate::Id(id) => {
            let n = q.push_param(*id);
            format!("{} = ${}", quoted("id"), n)
        }
        EntityPredicate::Properties { property1, property2 } => {
            let n1 = q.push_param(property1.as_str());
            let n2 = q.push_param(property2.as_str());
            format!(
                "{} = ${} AND {} = ${}",
                quoted("property1"),
                n1,
                quoted("property2"),
                n2
            )
        }
    }
}

/// SELECT by primary key.
pub fn select_by_id(schema: &str, id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(),
        qualified_table(schema),
        quoted("id"),
        n
    );
    q
}

/// SELECT rows matching the predicate, ORDER BY id, optional LIMIT.
pub fn select_where(schema: &str, predicate: &EntityPredicate, limit: Option<u32>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = predicate_clause(&mut q, predicate);
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}{}",
        select_column_list(),
        qualified_table(schema),
        where_clause,
        quoted("id"),
        limit_clause
    );
    q
}

/// INSERT without the id (store-assigned); returns the stored row.
pub fn insert(schema: &str, entity: &Entity) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n1 = q.push_param(entity.property1.as_str());
    let n2 = q.push_param(entity.property2.as_str());
    let n3 = q.push_param(PgBindValue::Json(Value::Object(entity.extra.clone())));
    q.sql = format!(
        "INSERT INTO {} ({}, {}, {}) VALUES (${}, ${}, ${}) RETURNING {}",
        qualified_table(schema),
        quoted("property1"),
        quoted("property2"),
        quoted("extra"),
        n1,
        n2,
        n3,
        select_column_list()
    );
    q
}

/// UPDATE every mutable column by id.
pub fn update(schema: &str, entity: &Entity) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n1 = q.push_param(entity.property1.as_str());
    let n2 = q.push_param(entity.property2.as_str());
    let n3 = q.push_param(PgBindValue::Json(Value::Object(entity.extra.clone())));
    let id_param = q.push_param(entity.id);
    q.sql = format!(
        "UPDATE {} SET {} = ${}, {} = ${}, {} = ${} WHERE {} = ${}",
        qualified_table(schema),
        quoted("property1"),
        n1,
        quoted("property2"),
        n2,
        quoted("extra"),
        n3,
        quoted("id"),
        id_param
    );
    q
}

/// DELETE WHERE id IN ($1, $2, ...). Empty `ids` yields a statement that deletes nothing.
pub fn delete_by_ids(schema: &str, ids: &[i32]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema);
    if ids.is_empty() {
        q.sql = format!("DELETE FROM {} WHERE 1 = 0", table);
        return q;
    }
    let placeholders: Vec<String> = ids
        .iter()
        .map(|id| format!("${}", q.push_param(*id)))
        .collect();
    q.sql = format!(
        "DELETE FROM {} WHERE {} IN ({})",
        table,
        quoted("id"),
        placeholders.join(", ")
    );
    q
}

/// Idempotent schema bootstrap.
pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))
}

pub fn create_database(name: &str) -> String {
    format!("CREATE DATABASE {}", quoted(name))
}

/// CREATE TABLE IF NOT EXISTS for the entity table.
pub fn create_table(schema: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            "id" SERIAL PRIMARY KEY,
            "property1" TEXT NOT NULL DEFAULT '',
            "property2" TEXT NOT NULL DEFAULT '',
            "extra" JSONB NOT NULL DEFAULT '{{}}'::jsonb
        )
        "#,
        qualified_table(schema)
    )
}
