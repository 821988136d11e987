//! Application layer for OPERO.
//!
//! Client-side state (session, active workspace, demo mode), the query cache
//! with its invalidation rules, navigation guards and the daily task job.

pub mod client;
pub mod queries;
pub mod query;
pub mod routing;
pub mod scheduler;
pub mod session;
pub mod workspace_context;

pub use client::OperoClient;
pub use queries::{GamificationQueries, PropertyQueries, TeamQueries, WorkspaceQueries};
pub use query::{EntityKind, QueryClient, QueryKey};
pub use routing::{RouteDecision, resolve_route};
pub use scheduler::{DailyTaskScheduler, SchedulerReport};
pub use session::{SessionState, SessionStore, SignUp};
pub use workspace_context::{WorkspaceState, WorkspaceStore};
