//! Error types for OPERO.
//!
//! Two families live here:
//!
//! - [`OperoError`]: ambient failures of the process itself (file system,
//!   serialization, configuration). Used by storage and configuration code.
//! - [`BackendError`] / [`ServiceError`]: failures reported by the hosted
//!   backend and their normalized, user-facing form. Every data-access
//!   function returns a [`ServiceResult`], so UI-facing code only ever branches
//!   on a tagged result carrying a localized message.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Shared error type for process-level failures.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum OperoError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local storage error (tables, object storage, lock files)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperoError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

impl From<std::io::Error> for OperoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for OperoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for OperoError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for OperoError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, OperoError>`.
pub type Result<T> = std::result::Result<T, OperoError>;

// ============================================================================
// Backend errors
// ============================================================================

/// Error codes emitted by the hosted backend (Postgres SQLSTATE, REST gateway
/// and auth codes).
pub mod codes {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
    pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
    pub const NO_ROWS: &str = "PGRST116";
    pub const JWT_EXPIRED: &str = "PGRST301";
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const USER_ALREADY_EXISTS: &str = "user_already_exists";
    pub const WEAK_PASSWORD: &str = "weak_password";
}

/// Raw error as reported by the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct BackendError {
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            details: None,
        }
    }

    /// An exception without a backend code (transport failures, client bugs).
    pub fn exception(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn unique_violation(constraint: &str) -> Self {
        Self::new(
            codes::UNIQUE_VIOLATION,
            format!("duplicate key value violates unique constraint \"{constraint}\""),
        )
    }

    pub fn foreign_key_violation(constraint: &str) -> Self {
        Self::new(
            codes::FOREIGN_KEY_VIOLATION,
            format!("insert or update violates foreign key constraint \"{constraint}\""),
        )
    }

    pub fn not_null_violation(column: &str) -> Self {
        Self::new(
            codes::NOT_NULL_VIOLATION,
            format!("null value in column \"{column}\" violates not-null constraint"),
        )
    }

    pub fn permission_denied(table: &str) -> Self {
        Self::new(
            codes::INSUFFICIENT_PRIVILEGE,
            format!("new row violates row-level security policy for table \"{table}\""),
        )
    }

    pub fn no_rows() -> Self {
        Self::new(
            codes::NO_ROWS,
            "JSON object requested, multiple (or no) rows returned",
        )
    }
}

/// A type alias for results coming straight from the backend.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

// ============================================================================
// Normalized service errors
// ============================================================================

/// Coarse classification of a failure, used by callers to pick a UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Constraint,
    Permission,
    NotFound,
    Connectivity,
    Validation,
    DemoRestricted,
    Unclassified,
}

pub const DEFAULT_ERROR_MESSAGE: &str = "Beklenmeyen bir hata oluştu.";
pub const CONNECTIVITY_ERROR_MESSAGE: &str =
    "Bağlantı hatası. İnternet bağlantınızı kontrol edin.";
pub const NOT_FOUND_MESSAGE: &str = "Kayıt bulunamadı.";

static ERROR_TABLE: Lazy<HashMap<&'static str, (ErrorKind, &'static str)>> = Lazy::new(|| {
    HashMap::from([
        (
            codes::UNIQUE_VIOLATION,
            (ErrorKind::Constraint, "Bu kayıt zaten mevcut."),
        ),
        (
            codes::FOREIGN_KEY_VIOLATION,
            (
                ErrorKind::Constraint,
                "İlişkili kayıt bulunamadı veya hâlâ kullanımda.",
            ),
        ),
        (
            codes::NOT_NULL_VIOLATION,
            (ErrorKind::Constraint, "Zorunlu alanlar eksik."),
        ),
        (
            codes::INVALID_TEXT_REPRESENTATION,
            (ErrorKind::Constraint, "Geçersiz veri formatı."),
        ),
        (
            codes::INSUFFICIENT_PRIVILEGE,
            (ErrorKind::Permission, "Bu işlem için yetkiniz yok."),
        ),
        (codes::NO_ROWS, (ErrorKind::NotFound, NOT_FOUND_MESSAGE)),
        (
            codes::JWT_EXPIRED,
            (
                ErrorKind::Permission,
                "Oturumunuzun süresi doldu. Lütfen tekrar giriş yapın.",
            ),
        ),
        (
            codes::INVALID_CREDENTIALS,
            (ErrorKind::Permission, "E-posta veya şifre hatalı."),
        ),
        (
            codes::USER_ALREADY_EXISTS,
            (ErrorKind::Constraint, "Bu e-posta adresi zaten kayıtlı."),
        ),
        (
            codes::WEAK_PASSWORD,
            (ErrorKind::Validation, "Şifre en az 6 karakter olmalıdır."),
        ),
    ])
});

/// User-facing failure of a data-access operation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
    pub code: Option<String>,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, NOT_FOUND_MESSAGE)
    }

    pub fn demo_restricted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DemoRestricted, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Connectivity | ErrorKind::Unclassified)
    }
}

fn is_network_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("fetch") || lower.contains("network")
}

/// Translates a raw backend error into its user-facing form.
///
/// Known codes win; then network-shaped messages; then the backend's own
/// message; then [`DEFAULT_ERROR_MESSAGE`].
pub fn normalize(err: &BackendError) -> ServiceError {
    if let Some(code) = err.code.as_deref() {
        if let Some((kind, message)) = ERROR_TABLE.get(code) {
            return ServiceError {
                kind: *kind,
                message: (*message).to_string(),
                code: Some(code.to_string()),
            };
        }
    }

    if is_network_message(&err.message) {
        return ServiceError {
            kind: ErrorKind::Connectivity,
            message: CONNECTIVITY_ERROR_MESSAGE.to_string(),
            code: err.code.clone(),
        };
    }

    let message = if err.message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        err.message.clone()
    };

    ServiceError {
        kind: ErrorKind::Unclassified,
        message,
        code: err.code.clone(),
    }
}

/// Translates a generic exception message (no backend code attached).
pub fn normalize_exception(message: &str) -> ServiceError {
    normalize(&BackendError::exception(message))
}

impl From<BackendError> for ServiceError {
    fn from(err: BackendError) -> Self {
        normalize(&err)
    }
}

impl From<OperoError> for ServiceError {
    fn from(err: OperoError) -> Self {
        match err {
            OperoError::NotFound { .. } => Self::not_found(),
            other => Self::new(ErrorKind::Unclassified, other.to_string()),
        }
    }
}

/// Result of every data-access operation.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Wire form of a [`ServiceResult`]: `{ok:true, data}` or `{ok:false, error, code?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceResponse<T> {
    Success {
        ok: bool,
        data: T,
    },
    Failure {
        ok: bool,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        code: Option<String>,
    },
}

impl<T> From<ServiceResult<T>> for ServiceResponse<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(data) => Self::Success { ok: true, data },
            Err(err) => Self::Failure {
                ok: false,
                error: err.message,
                code: err.code,
            },
        }
    }
}
