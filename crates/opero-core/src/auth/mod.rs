//! Authentication contracts of the hosted backend.

mod backend;
mod model;

pub use backend::AuthBackend;
pub use model::{AuthEvent, AuthUser};
