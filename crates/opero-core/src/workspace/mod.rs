pub mod model;
pub mod repository;

pub use model::{BillingMode, NewWorkspace, PlanType, Workspace, WorkspaceUpdate, slugify};
pub use repository::WorkspaceRepository;
