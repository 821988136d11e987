//! Profile domain module.
//!
//! A profile is the CRM-side record of an authenticated user: role,
//! workspace membership and accumulated experience points.

mod model;
mod repository;

pub use model::{NewProfile, Profile, ProfileUpdate, Role};
pub use repository::ProfileRepository;
