//! Shared application state for all routes.

use crate::context::DataContext;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<dyn DataContext>,
    /// Prefix the entity routes are nested under; used to build `Location` headers.
    pub base_path: Arc<str>,
}

impl AppState {
    pub fn new(context: Arc<dyn DataContext>, base_path: impl Into<Arc<str>>) -> Self {
        AppState {
            context,
            base_path: base_path.into(),
        }
    }

    /// Location of the entity with `id`, e.g. `/api/entities/7`.
    pub fn location_of(&self, id: i32) -> String {
        format!("{}/{}", self.base_path.trim_end_matches('/'), id)
    }
}
