//! Team membership and invitations.

use std::sync::Arc;

use chrono::Utc;
use opero_core::backend::Backend;
use opero_core::email::{EmailSender, invitation_email};
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::profile::Role;
use opero_core::team::{Invitation, InvitationStatus, TeamMember, is_valid_email};
use uuid::Uuid;

#[derive(Clone)]
pub struct TeamService {
    backend: Backend,
    email: Arc<dyn EmailSender>,
    app_url: String,
}

impl TeamService {
    /// `app_url` is the public base used to build invitation links.
    pub fn new(backend: Backend, email: Arc<dyn EmailSender>, app_url: impl Into<String>) -> Self {
        Self {
            backend,
            email,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn invitation_link(&self, token: &str) -> String {
        format!("{}/invite/{token}", self.app_url)
    }

    /// Members of a workspace, the owner first.
    pub async fn list_members(&self, workspace_id: &str) -> ServiceResult<Vec<TeamMember>> {
        let workspace = self.backend.workspaces.get(workspace_id).await?;
        let mut members: Vec<TeamMember> = self
            .backend
            .profiles
            .list_by_workspace(workspace_id)
            .await?
            .iter()
            .map(|profile| TeamMember::from_profile(profile, &workspace.owner_id))
            .collect();
        members.sort_by_key(|member| !member.is_owner);
        Ok(members)
    }

    pub async fn list_invitations(&self, workspace_id: &str) -> ServiceResult<Vec<Invitation>> {
        Ok(self.backend.invitations.list_by_workspace(workspace_id).await?)
    }

    /// Creates a pending invitation and e-mails the link.
    ///
    /// Members plus live pending invitations may not exceed the workspace cap.
    /// A failed e-mail leaves the invitation in place.
    pub async fn invite_member(
        &self,
        workspace_id: &str,
        inviter_id: &str,
        email: &str,
        role: Role,
    ) -> ServiceResult<Invitation> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ServiceError::validation("Geçerli bir e-posta adresi girin."));
        }

        let workspace = self.backend.workspaces.get(workspace_id).await?;
        let members = self.backend.profiles.list_by_workspace(workspace_id).await?;
        if members.iter().any(|m| m.email.eq_ignore_ascii_case(&email)) {
            return Err(ServiceError::validation("Bu kullanıcı zaten ekibin üyesi."));
        }

        let now = Utc::now();
        let pending = self
            .backend
            .invitations
            .list_by_workspace(workspace_id)
            .await?
            .into_iter()
            .filter(|i| i.is_pending() && !i.is_expired_at(now))
            .count();
        let seats_taken = members.len() + pending;
        if seats_taken >= workspace.max_members as usize {
            tracing::warn!(workspace_id, seats_taken, max = workspace.max_members, "Member cap reached");
            return Err(ServiceError::validation(format!(
                "Ekip üye sınırına ulaşıldı ({} kişi). Planınızı yükseltin.",
                workspace.max_members
            )));
        }

        let invitation = Invitation::new(
            Uuid::new_v4().to_string(),
            Uuid::new_v4().simple().to_string(),
            workspace_id,
            &email,
            role,
            inviter_id,
            now,
        );
        let invitation = self.backend.invitations.insert(invitation).await?;
        tracing::info!(workspace_id, invitation_id = %invitation.id, %role, "Created invitation");

        let inviter_name = match self.backend.profiles.get(inviter_id).await {
            Ok(profile) => profile.full_name,
            Err(_) => workspace.name.clone(),
        };
        let message = invitation_email(
            &invitation.email,
            &workspace.name,
            &inviter_name,
            &self.invitation_link(&invitation.token),
        );
        if let Err(err) = self.email.send(message).await {
            tracing::warn!(invitation_id = %invitation.id, "Invitation e-mail failed: {}", err);
        }

        Ok(invitation)
    }

    pub async fn revoke_invitation(&self, invitation_id: &str) -> ServiceResult<Invitation> {
        let mut invitation = self.backend.invitations.get(invitation_id).await?;
        if !invitation.is_pending() {
            return Err(ServiceError::validation("Bu davet artık geçerli değil."));
        }
        invitation.status = InvitationStatus::Revoked;
        let invitation = self.backend.invitations.update(invitation).await?;
        tracing::info!(invitation_id, "Revoked invitation");
        Ok(invitation)
    }

    /// Joins `user_id` to the inviting workspace with the invited role.
    ///
    /// An expired token is marked [`InvitationStatus::Expired`] and rejected.
    pub async fn accept_invitation(&self, token: &str, user_id: &str) -> ServiceResult<TeamMember> {
        let Some(mut invitation) = self.backend.invitations.find_by_token(token).await? else {
            return Err(ServiceError::not_found());
        };
        if !invitation.is_pending() {
            return Err(ServiceError::validation("Bu davet artık geçerli değil."));
        }

        if invitation.is_expired_at(Utc::now()) {
            invitation.status = InvitationStatus::Expired;
            if let Err(err) = self.backend.invitations.update(invitation).await {
                tracing::warn!("Failed to mark invitation expired: {}", err.message);
            }
            return Err(ServiceError::validation("Davetin süresi dolmuş."));
        }

        let profile = self.backend.profiles.get(user_id).await?;
        if !profile.email.eq_ignore_ascii_case(&invitation.email) {
            return Err(ServiceError::validation("Bu davet başka bir e-posta adresine gönderildi."));
        }

        let workspace_id = invitation.workspace_id.clone();
        let role = invitation.role;
        invitation.status = InvitationStatus::Accepted;
        self.backend.invitations.update(invitation).await?;
        let profile = self
            .backend
            .profiles
            .set_membership(user_id, Some(workspace_id.clone()), role)
            .await?;

        tracing::info!(user_id, %workspace_id, %role, "Accepted invitation");
        Ok(TeamMember::from_profile(&profile, ""))
    }

    pub async fn update_member_role(&self, member_id: &str, role: Role) -> ServiceResult<TeamMember> {
        let profile = self.backend.profiles.get(member_id).await?;
        let Some(workspace_id) = profile.workspace_id.clone() else {
            return Err(ServiceError::validation("Kullanıcı bir ekibe bağlı değil."));
        };
        let workspace = self.backend.workspaces.get(&workspace_id).await?;
        if workspace.owner_id == member_id && role != Role::Broker {
            return Err(ServiceError::validation("Ofis sahibinin rolü değiştirilemez."));
        }

        let profile = self
            .backend
            .profiles
            .set_membership(member_id, Some(workspace_id), role)
            .await?;
        tracing::info!(member_id, %role, "Updated member role");
        Ok(TeamMember::from_profile(&profile, &workspace.owner_id))
    }

    /// Unlinks a member from the workspace. The owner cannot be removed.
    pub async fn remove_member(&self, workspace_id: &str, member_id: &str) -> ServiceResult<()> {
        let workspace = self.backend.workspaces.get(workspace_id).await?;
        if workspace.owner_id == member_id {
            return Err(ServiceError::validation("Ofis sahibi ekipten çıkarılamaz."));
        }
        let profile = self.backend.profiles.get(member_id).await?;
        if profile.workspace_id.as_deref() != Some(workspace_id) {
            return Err(ServiceError::not_found());
        }

        self.backend
            .profiles
            .set_membership(member_id, None, Role::Agent)
            .await?;
        tracing::info!(workspace_id, member_id, "Removed member");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::SimulatedEmailSender;
    use crate::testing::{Fixture, broker_fixture, sign_up};
    use opero_core::auth::AuthBackend;
    use opero_core::config::EmailSettings;
    use opero_core::error::ErrorKind;
    use opero_core::team::InvitationRepository;

    fn service(fixture: &Fixture) -> (TeamService, Arc<SimulatedEmailSender>) {
        let sender = Arc::new(SimulatedEmailSender::new(&EmailSettings {
            simulated_delay_ms: 0,
            ..Default::default()
        }));
        let team = TeamService::new(fixture.backend.clone(), sender.clone(), "https://app.opero.io/");
        (team, sender)
    }

    #[tokio::test]
    async fn test_invite_sends_link_and_counts_toward_cap() {
        let fixture = broker_fixture().await;
        let (team, sender) = service(&fixture);

        let invitation = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, " Ali@Ofis.com ", Role::Agent)
            .await
            .unwrap();
        assert_eq!(invitation.email, "ali@ofis.com");
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains(&format!("https://app.opero.io/invite/{}", invitation.token)));

        // Free plan: owner + 2 pending invitations fill the three seats.
        team.invite_member(&fixture.workspace_id, &fixture.user.id, "veli@ofis.com", Role::Agent)
            .await
            .unwrap();
        let err = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "can@ofis.com", Role::Agent)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(team.list_invitations(&fixture.workspace_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invite_rejects_bad_email_and_duplicates() {
        let fixture = broker_fixture().await;
        let (team, _) = service(&fixture);

        let err = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "ali@", Role::Agent)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "ayse@gunesemlak.com", Role::Agent)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_revoked_invitation_frees_a_seat() {
        let fixture = broker_fixture().await;
        let (team, _) = service(&fixture);

        let first = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "a@ofis.com", Role::Agent)
            .await
            .unwrap();
        team.invite_member(&fixture.workspace_id, &fixture.user.id, "b@ofis.com", Role::Agent)
            .await
            .unwrap();

        let revoked = team.revoke_invitation(&first.id).await.unwrap();
        assert_eq!(revoked.status, InvitationStatus::Revoked);
        assert!(team.revoke_invitation(&first.id).await.is_err());

        team.invite_member(&fixture.workspace_id, &fixture.user.id, "c@ofis.com", Role::Agent)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_accept_joins_workspace_and_owner_is_protected() {
        let fixture = broker_fixture().await;
        let (team, _) = service(&fixture);
        let invitation = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "ali@ofis.com", Role::Agent)
            .await
            .unwrap();

        fixture.local.sign_out().await.unwrap();
        let agent = sign_up(&fixture.local, "ali@ofis.com", "Ali Kaya", Role::Agent).await;
        let member = team.accept_invitation(&invitation.token, &agent.id).await.unwrap();
        assert_eq!(member.role, Role::Agent);

        let members = team.list_members(&fixture.workspace_id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members[0].is_owner);

        let err = team
            .remove_member(&fixture.workspace_id, &fixture.user.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_expired_invitation_is_marked_and_rejected() {
        let fixture = broker_fixture().await;
        let (team, _) = service(&fixture);
        let mut invitation = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "ali@ofis.com", Role::Agent)
            .await
            .unwrap();
        invitation.expires_at = Utc::now() - chrono::Duration::hours(1);
        InvitationRepository::update(fixture.local.as_ref(), invitation.clone())
            .await
            .unwrap();

        let err = team
            .accept_invitation(&invitation.token, &fixture.user.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let stored = InvitationRepository::get(fixture.local.as_ref(), &invitation.id)
            .await
            .unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn test_broker_manages_roles_and_removal() {
        let fixture = broker_fixture().await;
        let (team, _) = service(&fixture);
        let invitation = team
            .invite_member(&fixture.workspace_id, &fixture.user.id, "ali@ofis.com", Role::Agent)
            .await
            .unwrap();

        fixture.local.sign_out().await.unwrap();
        let agent = sign_up(&fixture.local, "ali@ofis.com", "Ali Kaya", Role::Agent).await;
        team.accept_invitation(&invitation.token, &agent.id).await.unwrap();
        fixture.local.sign_out().await.unwrap();
        fixture
            .local
            .sign_in("ayse@gunesemlak.com", "secret1")
            .await
            .unwrap();

        let promoted = team.update_member_role(&agent.id, Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);

        team.remove_member(&fixture.workspace_id, &agent.id).await.unwrap();
        assert_eq!(team.list_members(&fixture.workspace_id).await.unwrap().len(), 1);
    }
}
