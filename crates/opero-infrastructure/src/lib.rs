//! Data access and local persistence for OPERO.
//!
//! The services in this crate wrap a [`Backend`](opero_core::backend::Backend)
//! and turn every backend failure into a normalized
//! [`ServiceError`](opero_core::error::ServiceError).

pub mod config_service;
pub mod email;
pub mod gamification;
pub mod local;
pub mod paths;
pub mod profiles;
pub mod properties;
pub mod storage;
pub mod team;
pub mod ui_preferences;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use crate::config_service::ConfigService;
pub use crate::email::SimulatedEmailSender;
pub use crate::gamification::GamificationService;
pub use crate::local::LocalBackend;
pub use crate::paths::OperoPaths;
pub use crate::profiles::ProfileService;
pub use crate::properties::PropertyService;
pub use crate::team::TeamService;
pub use crate::ui_preferences::UiPreferenceStore;
pub use crate::workspace::WorkspaceService;
