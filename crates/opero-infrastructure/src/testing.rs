//! Fixtures shared by the service tests.

use std::sync::Arc;

use chrono::Utc;
use opero_core::auth::{AuthBackend, AuthUser};
use opero_core::backend::Backend;
use opero_core::profile::{NewProfile, Profile, ProfileRepository, Role};
use opero_core::property::{ListingType, NewProperty, PropertyType};
use opero_core::workspace::{BillingMode, PlanType, Workspace, WorkspaceRepository};

use crate::local::LocalBackend;

pub(crate) struct Fixture {
    pub local: Arc<LocalBackend>,
    pub backend: Backend,
    pub user: AuthUser,
    pub workspace_id: String,
}

/// Signs up a user and creates their profile row.
pub(crate) async fn sign_up(local: &LocalBackend, email: &str, name: &str, role: Role) -> AuthUser {
    let user = local.sign_up(email, "secret1").await.unwrap();
    ProfileRepository::insert(
        local,
        Profile::new(NewProfile {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: name.to_string(),
            role,
            workspace_id: None,
        }),
    )
    .await
    .unwrap();
    user
}

/// A signed-in broker owning a free workspace.
pub(crate) async fn broker_fixture() -> Fixture {
    let local = Arc::new(LocalBackend::in_memory());
    let user = sign_up(&local, "ayse@gunesemlak.com", "Ayşe Güneş", Role::Broker).await;

    let workspace = Workspace {
        id: "ws-gunes".to_string(),
        name: "Güneş Emlak".to_string(),
        slug: "gunes-emlak".to_string(),
        plan_type: PlanType::Free,
        billing_mode: BillingMode::Monthly,
        owner_id: user.id.clone(),
        max_members: PlanType::Free.default_member_cap(),
        logo_url: None,
        created_at: Utc::now(),
    };
    WorkspaceRepository::insert(local.as_ref(), workspace).await.unwrap();
    local
        .set_membership(&user.id, Some("ws-gunes".to_string()), Role::Broker)
        .await
        .unwrap();

    Fixture {
        backend: Backend::from_shared(local.clone()),
        local,
        user,
        workspace_id: "ws-gunes".to_string(),
    }
}

pub(crate) fn new_listing(workspace_id: &str, agent_id: &str, title: &str, price: f64) -> NewProperty {
    NewProperty {
        workspace_id: workspace_id.to_string(),
        agent_id: agent_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        property_type: PropertyType::Apartment,
        listing_type: ListingType::Sale,
        price,
        currency: "TRY".to_string(),
        city: "İzmir".to_string(),
        district: "Bornova".to_string(),
        address: "Kazımdirik Mah.".to_string(),
        area_m2: Some(120.0),
        rooms: Some("3+1".to_string()),
        latitude: None,
        longitude: None,
    }
}
