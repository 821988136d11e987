use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Subscription plan of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanType {
    Free,
    Pro,
    Enterprise,
}

impl PlanType {
    /// Member cap applied when a workspace is created on this plan.
    pub fn default_member_cap(&self) -> u32 {
        match self {
            PlanType::Free => 3,
            PlanType::Pro => 10,
            PlanType::Enterprise => 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BillingMode {
    Monthly,
    Yearly,
}

/// A tenant record scoping users and data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier for the workspace
    pub id: String,
    /// Display name of the office
    pub name: String,
    /// URL-safe unique handle derived from the name
    pub slug: String,
    pub plan_type: PlanType,
    pub billing_mode: BillingMode,
    /// Profile id of the broker who owns the workspace
    pub owner_id: String,
    /// Maximum number of members, pending invitations included
    pub max_members: u32,
    /// Public URL of the uploaded logo, if any
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
    pub owner_id: String,
    pub plan_type: PlanType,
    pub billing_mode: BillingMode,
}

/// Partial update of a workspace. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceUpdate {
    pub name: Option<String>,
    pub plan_type: Option<PlanType>,
    pub billing_mode: Option<BillingMode>,
    pub max_members: Option<u32>,
}

impl WorkspaceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.plan_type.is_none()
            && self.billing_mode.is_none()
            && self.max_members.is_none()
    }

    pub fn apply(self, workspace: &mut Workspace) {
        if let Some(name) = self.name {
            workspace.name = name;
        }
        if let Some(plan_type) = self.plan_type {
            workspace.plan_type = plan_type;
        }
        if let Some(billing_mode) = self.billing_mode {
            workspace.billing_mode = billing_mode;
        }
        if let Some(max_members) = self.max_members {
            workspace.max_members = max_members;
        }
    }
}

/// Builds a URL slug from a workspace name.
///
/// Turkish letters are folded to ASCII, every other run of non-alphanumeric
/// characters becomes a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        let folded = match ch {
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'I' | 'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ü' | 'Ü' => 'u',
            other => other.to_ascii_lowercase(),
        };

        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    slug
}
