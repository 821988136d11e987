//! Navigation guard deciding where a page request may land.

use serde::{Deserialize, Serialize};

use crate::session::SessionState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const BROKER_DASHBOARD_PATH: &str = "/broker/dashboard";

const PUBLIC_PATHS: &[&str] = &["/", "/login", "/register", "/demo", "/pricing"];
const PUBLIC_PREFIXES: &[&str] = &["/invite/"];
const BROKER_PREFIX: &str = "/broker";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect(String),
    /// The session is still loading; render a placeholder and ask again.
    Pending,
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

fn is_broker_area(path: &str) -> bool {
    path == BROKER_PREFIX || path.starts_with("/broker/")
}

/// Landing page for a signed-in user.
pub fn home_path(session: &SessionState) -> &'static str {
    if session.is_broker() {
        BROKER_DASHBOARD_PATH
    } else {
        DASHBOARD_PATH
    }
}

pub fn resolve_route(path: &str, session: &SessionState, demo_mode: bool) -> RouteDecision {
    let path = normalize(path);

    if is_public(path) {
        if session.is_authenticated() && matches!(path, LOGIN_PATH | "/register") {
            return RouteDecision::Redirect(home_path(session).to_string());
        }
        return RouteDecision::Allow;
    }

    if session.loading {
        return RouteDecision::Pending;
    }

    if !session.is_authenticated() {
        return if demo_mode && !is_broker_area(path) {
            RouteDecision::Allow
        } else {
            RouteDecision::Redirect(LOGIN_PATH.to_string())
        };
    }

    if session.is_broker() && path == DASHBOARD_PATH {
        return RouteDecision::Redirect(BROKER_DASHBOARD_PATH.to_string());
    }
    if !session.is_broker() && is_broker_area(path) {
        return RouteDecision::Redirect(DASHBOARD_PATH.to_string());
    }
    RouteDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use opero_core::auth::AuthUser;
    use opero_core::profile::{NewProfile, Profile, Role};

    fn signed_in(role: Role) -> SessionState {
        SessionState {
            user: Some(AuthUser {
                id: "u-1".to_string(),
                email: "ayse@ofis.com".to_string(),
            }),
            profile: Some(Profile::new(NewProfile {
                id: "u-1".to_string(),
                email: "ayse@ofis.com".to_string(),
                full_name: "Ayşe Güneş".to_string(),
                role,
                workspace_id: Some("ws-1".to_string()),
            })),
            loading: false,
            loading_timed_out: false,
        }
    }

    fn redirect(path: &str) -> RouteDecision {
        RouteDecision::Redirect(path.to_string())
    }

    #[test]
    fn test_anonymous_visitors_go_to_login() {
        let anonymous = SessionState::default();
        assert_eq!(resolve_route("/properties", &anonymous, false), redirect("/login"));
        assert_eq!(resolve_route("/login", &anonymous, false), RouteDecision::Allow);
        assert_eq!(resolve_route("/invite/abc123", &anonymous, false), RouteDecision::Allow);
    }

    #[test]
    fn test_demo_opens_agent_pages_only() {
        let anonymous = SessionState::default();
        assert_eq!(resolve_route("/dashboard", &anonymous, true), RouteDecision::Allow);
        assert_eq!(resolve_route("/broker/team", &anonymous, true), redirect("/login"));
    }

    #[test]
    fn test_brokers_land_on_broker_dashboard() {
        let broker = signed_in(Role::Broker);
        assert_eq!(resolve_route("/dashboard/", &broker, false), redirect("/broker/dashboard"));
        assert_eq!(resolve_route("/login", &broker, false), redirect("/broker/dashboard"));
        assert_eq!(resolve_route("/broker/team?tab=invites", &broker, false), RouteDecision::Allow);
    }

    #[test]
    fn test_agents_are_kept_out_of_broker_area() {
        let agent = signed_in(Role::Agent);
        assert_eq!(resolve_route("/broker/dashboard", &agent, false), redirect("/dashboard"));
        assert_eq!(resolve_route("/register", &agent, false), redirect("/dashboard"));
        assert_eq!(resolve_route("/properties/p-1", &agent, false), RouteDecision::Allow);
    }

    #[test]
    fn test_loading_session_defers_protected_pages() {
        let loading = SessionState {
            loading: true,
            ..Default::default()
        };
        assert_eq!(resolve_route("/properties", &loading, false), RouteDecision::Pending);
        assert_eq!(resolve_route("/", &loading, false), RouteDecision::Allow);
    }
}
