//! Demo mode: the capability table and the sample data shown to visitors
//! walking through the product without an account.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{ServiceError, ServiceResult};
use crate::property::{ListingType, Property, PropertyStatus, PropertyType};
use crate::workspace::{BillingMode, PlanType, Workspace};

pub const DEMO_WORKSPACE_ID: &str = "demo-workspace";
pub const DEMO_USER_ID: &str = "demo-user";

/// Mutating actions a visitor may attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DemoAction {
    CreateRecord,
    EditRecord,
    DeleteRecord,
    ExportData,
    InviteMember,
    UploadFile,
    ChangeSettings,
    ManageBilling,
    SendEmail,
}

struct Capability {
    action: DemoAction,
    allowed: bool,
    denial: &'static str,
}

const CAPABILITIES: &[Capability] = &[
    Capability {
        action: DemoAction::CreateRecord,
        allowed: true,
        denial: "",
    },
    Capability {
        action: DemoAction::EditRecord,
        allowed: true,
        denial: "",
    },
    Capability {
        action: DemoAction::DeleteRecord,
        allowed: false,
        denial: "Demo modunda kayıt silinemez. Tam erişim için ücretsiz hesap oluşturun.",
    },
    Capability {
        action: DemoAction::ExportData,
        allowed: false,
        denial: "Demo modunda dışa aktarma kullanılamaz.",
    },
    Capability {
        action: DemoAction::InviteMember,
        allowed: false,
        denial: "Demo modunda ekip üyesi davet edilemez.",
    },
    Capability {
        action: DemoAction::UploadFile,
        allowed: false,
        denial: "Demo modunda dosya yüklenemez.",
    },
    Capability {
        action: DemoAction::ChangeSettings,
        allowed: false,
        denial: "Demo modunda ayarlar değiştirilemez.",
    },
    Capability {
        action: DemoAction::ManageBilling,
        allowed: false,
        denial: "Demo modunda ödeme ayarlarına erişilemez.",
    },
    Capability {
        action: DemoAction::SendEmail,
        allowed: false,
        denial: "Demo modunda e-posta gönderilemez.",
    },
];

const UNLISTED_DENIAL: &str = "Bu işlem demo modunda kullanılamaz.";

/// Outcome of a capability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoDecision {
    pub action: DemoAction,
    pub allowed: bool,
    pub message: Option<String>,
}

/// Checks an action against the capability table.
///
/// The table only applies in demo mode; real sessions are always permitted.
pub fn check(action: DemoAction, demo_mode: bool) -> DemoDecision {
    if !demo_mode {
        return DemoDecision {
            action,
            allowed: true,
            message: None,
        };
    }

    match CAPABILITIES.iter().find(|c| c.action == action) {
        Some(capability) if capability.allowed => DemoDecision {
            action,
            allowed: true,
            message: None,
        },
        Some(capability) => DemoDecision {
            action,
            allowed: false,
            message: Some(capability.denial.to_string()),
        },
        None => DemoDecision {
            action,
            allowed: false,
            message: Some(UNLISTED_DENIAL.to_string()),
        },
    }
}

/// Like [`check`], but as a result that short-circuits with `?`.
pub fn ensure_allowed(action: DemoAction, demo_mode: bool) -> ServiceResult<()> {
    let decision = check(action, demo_mode);
    if decision.allowed {
        Ok(())
    } else {
        Err(ServiceError::demo_restricted(
            decision.message.unwrap_or_else(|| UNLISTED_DENIAL.to_string()),
        ))
    }
}

/// Whether the capability table allows `action` in demo mode.
pub fn is_allowed_in_demo(action: DemoAction) -> bool {
    CAPABILITIES
        .iter()
        .find(|c| c.action == action)
        .is_some_and(|c| c.allowed)
}

fn fixed_time(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The synthetic workspace shown in demo mode.
pub fn demo_workspace() -> Workspace {
    Workspace {
        id: DEMO_WORKSPACE_ID.to_string(),
        name: "Demo Emlak Ofisi".to_string(),
        slug: "demo-emlak-ofisi".to_string(),
        plan_type: PlanType::Pro,
        billing_mode: BillingMode::Monthly,
        owner_id: DEMO_USER_ID.to_string(),
        max_members: PlanType::Pro.default_member_cap(),
        logo_url: None,
        created_at: fixed_time(2025, 1, 1, 9),
    }
}

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    title: &str,
    property_type: PropertyType,
    listing_type: ListingType,
    status: PropertyStatus,
    price: f64,
    city: &str,
    district: &str,
) -> Property {
    let created_at = fixed_time(2025, 1, 15, 10);
    Property {
        id: id.to_string(),
        workspace_id: DEMO_WORKSPACE_ID.to_string(),
        agent_id: DEMO_USER_ID.to_string(),
        title: title.to_string(),
        description: String::new(),
        property_type,
        listing_type,
        status,
        price,
        currency: "TRY".to_string(),
        city: city.to_string(),
        district: district.to_string(),
        address: format!("{district}, {city}"),
        area_m2: None,
        rooms: None,
        latitude: None,
        longitude: None,
        created_at,
        updated_at: created_at,
    }
}

/// Listings served to demo visitors instead of backend rows.
pub fn sample_properties() -> Vec<Property> {
    vec![
        sample(
            "demo-p1",
            "Boğaz manzaralı 3+1 daire",
            PropertyType::Apartment,
            ListingType::Sale,
            PropertyStatus::Active,
            12_500_000.0,
            "İstanbul",
            "Beşiktaş",
        ),
        sample(
            "demo-p2",
            "Havuzlu müstakil villa",
            PropertyType::Villa,
            ListingType::Sale,
            PropertyStatus::Pending,
            27_000_000.0,
            "Muğla",
            "Bodrum",
        ),
        sample(
            "demo-p3",
            "Merkezi konumda ofis katı",
            PropertyType::Office,
            ListingType::Rent,
            PropertyStatus::Active,
            85_000.0,
            "Ankara",
            "Çankaya",
        ),
        sample(
            "demo-p4",
            "İmarlı arsa",
            PropertyType::Land,
            ListingType::Sale,
            PropertyStatus::Sold,
            4_200_000.0,
            "İzmir",
            "Urla",
        ),
    ]
}
