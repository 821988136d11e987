//! Team domain module: workspace members and pending invitations.

mod model;
mod repository;

pub use model::{INVITATION_TTL_DAYS, Invitation, InvitationStatus, TeamMember, is_valid_email};
pub use repository::InvitationRepository;
