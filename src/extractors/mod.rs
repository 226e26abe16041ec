//! Request extractors.

mod body;
mod id;
pub use body::OptionalJson;
pub use id::EntityId;
