use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::profile::{Profile, Role};

/// Days an invitation stays valid.
pub const INVITATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
    Expired,
}

/// Row of the `invitations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub workspace_id: String,
    /// Lower-cased address the invitation was sent to
    pub email: String,
    pub role: Role,
    /// Opaque token embedded in the invitation link
    pub token: String,
    pub status: InvitationStatus,
    pub invited_by: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(
        id: String,
        token: String,
        workspace_id: &str,
        email: &str,
        role: Role,
        invited_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workspace_id: workspace_id.to_string(),
            email: email.trim().to_lowercase(),
            role,
            token,
            status: InvitationStatus::Pending,
            invited_by: invited_by.to_string(),
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A workspace member as shown in the team screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub xp: u32,
    pub is_owner: bool,
}

impl TeamMember {
    pub fn from_profile(profile: &Profile, owner_id: &str) -> Self {
        Self {
            id: profile.id.clone(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            role: profile.role,
            xp: profile.xp,
            is_owner: profile.id == owner_id,
        }
    }
}

/// Loose structural e-mail check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
