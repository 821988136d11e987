//! Domain layer of OPERO, a real-estate CRM.
//!
//! This crate holds the entity models, the contracts of the hosted backend
//! (auth, tables, object storage, e-mail) and the pure decision procedures:
//! error normalization, the demo capability gate and the leveling table.

pub mod auth;
pub mod backend;
pub mod config;
pub mod demo;
pub mod email;
pub mod error;
pub mod gamification;
pub mod profile;
pub mod property;
pub mod storage;
pub mod team;
pub mod ui;
pub mod workspace;

pub use backend::Backend;
pub use error::{
    BackendError, BackendResult, ErrorKind, OperoError, ServiceError, ServiceResponse,
    ServiceResult,
};
