//! HTTP handlers for the entity controller.

pub mod entity;
pub use entity::*;
