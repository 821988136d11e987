use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Role of a user inside a workspace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Broker,
    Agent,
    Admin,
}

impl Role {
    /// Brokers and admins manage the team and workspace settings.
    pub fn can_manage_team(&self) -> bool {
        matches!(self, Role::Broker | Role::Admin)
    }
}

/// Row of the `profiles` table. `id` equals the auth user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub xp: u32,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(new: NewProfile) -> Self {
        Self {
            id: new.id,
            email: new.email,
            full_name: new.full_name,
            role: new.role,
            workspace_id: new.workspace_id,
            xp: 0,
            phone: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_broker(&self) -> bool {
        self.role == Role::Broker
    }
}

/// Data required to create a profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub workspace_id: Option<String>,
}

/// Partial update of a profile. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, profile: &mut Profile) {
        if let Some(full_name) = self.full_name {
            profile.full_name = full_name;
        }
        if let Some(phone) = self.phone {
            profile.phone = Some(phone);
        }
        if let Some(avatar_url) = self.avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trips_through_strings() {
        assert_eq!(Role::from_str("broker").unwrap(), Role::Broker);
        assert_eq!(Role::Agent.to_string(), "agent");
        assert!(Role::from_str("owner").is_err());
    }

    #[test]
    fn test_profile_update_keeps_unset_fields() {
        let mut profile = Profile::new(NewProfile {
            id: "u-1".to_string(),
            email: "ayse@example.com".to_string(),
            full_name: "Ayşe Yılmaz".to_string(),
            role: Role::Agent,
            workspace_id: None,
        });

        ProfileUpdate {
            phone: Some("+90 555 000 0000".to_string()),
            ..Default::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.full_name, "Ayşe Yılmaz");
        assert_eq!(profile.phone.as_deref(), Some("+90 555 000 0000"));
    }
}
