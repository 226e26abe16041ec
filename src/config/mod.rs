//! Runtime settings read from the environment (and `.env` when present).

pub mod settings;
pub mod validator;

pub use settings::*;
pub use validator::*;
