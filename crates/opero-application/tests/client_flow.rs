use std::sync::Arc;

use chrono::Utc;
use opero_application::{OperoClient, RouteDecision, SignUp};
use opero_core::backend::Backend;
use opero_core::config::{EmailSettings, OperoConfig};
use opero_core::error::ErrorKind;
use opero_core::gamification::TaskType;
use opero_core::profile::Role;
use opero_core::property::{ListingType, NewProperty, PropertyFilter, PropertyType};
use opero_core::workspace::{BillingMode, PlanType};
use opero_infrastructure::{
    GamificationService, LocalBackend, OperoPaths, PropertyService, SimulatedEmailSender,
};
use tempfile::TempDir;

fn client(local: &Arc<LocalBackend>) -> (OperoClient, Arc<SimulatedEmailSender>) {
    let config = OperoConfig::default();
    let email = Arc::new(SimulatedEmailSender::new(&EmailSettings {
        simulated_delay_ms: 0,
        ..Default::default()
    }));
    let client = OperoClient::with_email(Backend::from_shared(local.clone()), &config, email.clone());
    (client, email)
}

fn form(email: &str, name: &str, role: Role) -> SignUp {
    SignUp {
        email: email.to_string(),
        password: "secret1".to_string(),
        full_name: name.to_string(),
        role,
    }
}

fn listing(workspace_id: &str, agent_id: &str, title: &str, price: f64) -> NewProperty {
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
        address: String::new(),
        area_m2: Some(95.0),
        rooms: Some("2+1".to_string()),
        latitude: None,
        longitude: None,
    }
}

#[tokio::test]
async fn test_visitor_to_broker_to_team() {
    let local = Arc::new(LocalBackend::in_memory());
    let (client, outbox) = client(&local);

    let state = client.start().await.unwrap();
    assert!(!state.is_authenticated());
    assert_eq!(client.route("/properties"), RouteDecision::Redirect("/login".to_string()));

    // Demo visit
    client.workspace.enter_demo().unwrap();
    assert_eq!(client.route("/dashboard"), RouteDecision::Allow);
    assert!(!client.properties.list(&PropertyFilter::default()).await.unwrap().is_empty());
    let err = client.properties.delete("demo-p1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DemoRestricted);

    // Registration ends the demo
    let broker = client
        .session
        .sign_up(form("ayse@gunesemlak.com", "Ayşe Güneş", Role::Broker))
        .await
        .unwrap()
        .user
        .unwrap();
    let workspace = client
        .workspaces
        .create("Güneş Emlak", PlanType::Free, BillingMode::Monthly)
        .await
        .unwrap();
    assert!(!client.workspace.is_demo());
    assert_eq!(workspace.slug, "gunes-emlak");
    assert_eq!(
        client.route("/dashboard"),
        RouteDecision::Redirect("/broker/dashboard".to_string())
    );

    client
        .properties
        .create(listing(&workspace.id, &broker.id, "Bornova 2+1", 3_250_000.0))
        .await
        .unwrap();
    let stats = client.properties.stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.open_sale_value, 3_250_000.0);

    let invitation = client.team.invite("mehmet@gunesemlak.com", Role::Agent).await.unwrap();
    assert!(
        outbox
            .sent()
            .iter()
            .any(|message| message.to == "mehmet@gunesemlak.com")
    );
    client.sign_out().await.unwrap();
    assert!(client.cache.is_empty().await);
    assert!(client.workspace.active_workspace().is_none());

    // The invited agent joins
    client
        .session
        .sign_up(form("mehmet@gunesemlak.com", "Mehmet Kaya", Role::Agent))
        .await
        .unwrap();
    client.team.accept(&invitation.token).await.unwrap();
    assert_eq!(client.workspace.active_workspace().unwrap().id, workspace.id);
    assert_eq!(
        client.route("/broker/dashboard"),
        RouteDecision::Redirect("/dashboard".to_string())
    );

    let members = client.team.members().await.unwrap();
    assert_eq!(members.len(), 2);
    assert!(members[0].is_owner);
    assert_eq!(members[1].role, Role::Agent);

    let listings = client.properties.list(&PropertyFilter::default()).await.unwrap();
    assert_eq!(listings.len(), 1);

    client.stop();
}

#[tokio::test]
async fn test_task_progress_awards_xp_once() {
    let local = Arc::new(LocalBackend::in_memory());
    let (client, _) = client(&local);
    let user = client
        .session
        .sign_up(form("ali@ofis.com", "Ali Demir", Role::Agent))
        .await
        .unwrap()
        .user
        .unwrap();
    let today = Utc::now().date_naive();

    GamificationService::new(Backend::from_shared(local.clone()))
        .initialize_daily_tasks(&user.id, today)
        .await
        .unwrap();

    let first = client
        .gamification
        .record_progress(TaskType::ScheduleAppointment, today)
        .await
        .unwrap();
    assert_eq!(first.xp_awarded, 15);
    let again = client
        .gamification
        .record_progress(TaskType::ScheduleAppointment, today)
        .await
        .unwrap();
    assert_eq!(again.xp_awarded, 0);

    let stats = client.gamification.stats(today).await.unwrap();
    assert_eq!(stats.level.xp, 15);
    assert_eq!(stats.tasks_completed_today, 1);
    assert_eq!(client.session.state().profile.unwrap().xp, 15);
}

#[tokio::test]
async fn test_persistent_backend_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let paths = OperoPaths::new(Some(dir.path()));

    let workspace_id = {
        let local = Arc::new(LocalBackend::persistent(&paths).unwrap());
        let (client, _) = client(&local);
        let user = client
            .session
            .sign_up(form("ayse@gunesemlak.com", "Ayşe Güneş", Role::Broker))
            .await
            .unwrap()
            .user
            .unwrap();
        let workspace = client
            .workspaces
            .create("Güneş Emlak", PlanType::Pro, BillingMode::Yearly)
            .await
            .unwrap();
        client
            .properties
            .create(listing(&workspace.id, &user.id, "Karşıyaka dubleks", 7_900_000.0))
            .await
            .unwrap();
        workspace.id
    };

    let reopened = LocalBackend::persistent(&paths).unwrap().with_service_role();
    let properties = PropertyService::new(Backend::from_shared(Arc::new(reopened)))
        .list_properties(&workspace_id, &PropertyFilter::default())
        .await
        .unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].title, "Karşıyaka dubleks");
}

#[tokio::test]
async fn test_failed_sign_in_keeps_demo_visit() {
    let local = Arc::new(LocalBackend::in_memory());
    let (client, _) = client(&local);
    client.start().await.unwrap();
    client.workspace.enter_demo().unwrap();

    assert!(client.sign_in("yok@ofis.com", "yanlis1").await.is_err());
    assert!(client.workspace.is_demo());
    assert_eq!(client.route("/dashboard"), RouteDecision::Allow);
    client.stop();
}
