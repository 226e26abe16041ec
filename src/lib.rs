//! Entity CRUD: REST controller for a single entity table backed by a data context.

pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{DataContextKind, Settings};
pub use context::{ChangeSet, DataContext, InMemoryDataContext, PgDataContext};
pub use error::{AppError, ConfigError};
pub use model::{Entity, EntityFilter, EntityPredicate};
pub use routes::{app_routes, common_routes_with_ready, entity_routes, router};
pub use state::AppState;
pub use store::{connect_options, ensure_database_exists, ensure_entity_table, open_context};
