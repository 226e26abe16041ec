//! Database bootstrap and data context construction.

use crate::config::{DataContextKind, Settings};
use crate::context::{DataContext, InMemoryDataContext, PgDataContext};
use crate::error::{AppError, ConfigError};
use crate::sql;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::sync::Arc;

const MAINTENANCE_DATABASE: &str = "postgres";

/// Create the schema if missing, then the `entities` table. Idempotent.
pub async fn ensure_entity_table(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&sql::create_schema(schema)).execute(pool).await?;
    sqlx::query(&sql::create_table(schema)).execute(pool).await?;
    Ok(())
}

/// Parse `DATABASE_URL`.
pub fn connect_options(database_url: &str) -> Result<PgConnectOptions, ConfigError> {
    PgConnectOptions::from_str(database_url).map_err(|e| ConfigError::Invalid {
        key: "DATABASE_URL",
        reason: e.to_string(),
    })
}

/// Target database name and options for the maintenance database, or `None`
/// when the target is the maintenance database itself or unnamed.
fn maintenance_target(opts: &PgConnectOptions) -> Option<(String, PgConnectOptions)> {
    let name = opts.get_database()?.trim();
    if name.is_empty() || name == MAINTENANCE_DATABASE {
        return None;
    }
    Some((name.to_string(), opts.clone().database(MAINTENANCE_DATABASE)))
}

/// Create the target database through the maintenance database when it does not exist yet.
pub async fn ensure_database_exists(opts: &PgConnectOptions) -> Result<(), AppError> {
    let Some((name, admin)) = maintenance_target(opts) else {
        return Ok(());
    };
    let mut conn = admin.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %name, "creating database");
        sqlx::query(&sql::create_database(&name)).execute(&mut conn).await?;
    }
    Ok(())
}

/// Build the data context selected by `settings.data_context`. For Postgres this
/// creates the database and table when missing and opens the pool.
pub async fn open_context(settings: &Settings) -> Result<Arc<dyn DataContext>, AppError> {
    match settings.data_context {
        DataContextKind::Memory => {
            tracing::info!("using in-memory data context");
            Ok(Arc::new(InMemoryDataContext::new()))
        }
        DataContextKind::Postgres => {
            let opts = connect_options(&settings.database_url)?;
            ensure_database_exists(&opts).await?;
            let pool = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect_with(opts)
                .await?;
            ensure_entity_table(&pool, &settings.schema).await?;
            tracing::info!(schema = %settings.schema, "using postgres data context");
            Ok(Arc::new(PgDataContext::new(pool, settings.schema.clone())))
        }
    }
}
