//! Entity controller routes. Nest the returned router under the base path.

use crate::handlers::entity::{
    bulk_delete, create, delete as delete_handler, filter, get_by_id, search, update,
};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(create))
        .route("/filter", get(filter))
        .route("/bulk", delete(bulk_delete))
        .route("/search/:id", get(search))
        .route("/:id", get(get_by_id).put(update).delete(delete_handler))
        .with_state(state)
}

/// Entity routes nested under `state.base_path`. `nest` maps the inner `/` to the
/// bare prefix only, so create is also routed at `{base}/`.
pub fn app_routes(state: AppState) -> Router {
    let base = state.base_path.to_string();
    let trailing = Router::new()
        .route(&format!("{}/", base), post(create))
        .with_state(state.clone());
    Router::new().nest(&base, entity_routes(state)).merge(trailing)
}
