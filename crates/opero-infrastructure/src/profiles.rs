use opero_core::backend::Backend;
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::profile::{NewProfile, Profile, ProfileUpdate};

#[derive(Clone)]
pub struct ProfileService {
    backend: Backend,
}

impl ProfileService {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub async fn get_profile(&self, user_id: &str) -> ServiceResult<Profile> {
        Ok(self.backend.profiles.get(user_id).await?)
    }

    /// Creates the profile row for a freshly registered user.
    pub async fn create_profile(&self, new: NewProfile) -> ServiceResult<Profile> {
        if new.full_name.trim().is_empty() {
            return Err(ServiceError::validation("Ad soyad zorunludur."));
        }
        let profile = self.backend.profiles.insert(Profile::new(new)).await?;
        tracing::info!(user_id = %profile.id, role = %profile.role, "Created profile");
        Ok(profile)
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> ServiceResult<Profile> {
        if update.full_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ServiceError::validation("Ad soyad zorunludur."));
        }
        let mut profile = self.backend.profiles.get(user_id).await?;
        update.apply(&mut profile);
        Ok(self.backend.profiles.update(profile).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::broker_fixture;

    #[tokio::test]
    async fn test_update_profile_changes_only_given_fields() {
        let fixture = broker_fixture().await;
        let profiles = ProfileService::new(fixture.backend.clone());

        let updated = profiles
            .update_profile(
                &fixture.user.id,
                ProfileUpdate {
                    phone: Some("+90 555 000 00 00".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Ayşe Güneş");
        assert_eq!(updated.phone.as_deref(), Some("+90 555 000 00 00"));

        let err = profiles
            .update_profile(
                &fixture.user.id,
                ProfileUpdate {
                    full_name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, opero_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let fixture = broker_fixture().await;
        let profiles = ProfileService::new(fixture.backend.clone());

        assert!(profiles.get_profile("ghost").await.unwrap_err().is_not_found());
    }
}
