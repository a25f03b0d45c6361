// Access Convention Contract Tests
//
// These tests pin the permission conventions every page and route relies on.
// **Problem**: a "convenient" default (treating a loading session as allowed,
// or an empty any-of list as satisfied) silently exposes guarded screens.
// **Solution**: contract tests over the evaluator and guard conventions.

use std::sync::Arc;
use wms_access::rbac::{
    has_all_permissions, has_any_permission, has_permission, is_admin, is_company_admin, is_system_admin,
    satisfies,
};
use wms_access::{
    well_known, AccessError, AccessGuard, GuardDecision, Permission, PermissionKey, Rendered, Requirement,
    Role, Session, SessionState, SessionStore, UserProfile,
};

fn role(keys: &[&str]) -> Role {
    let permissions = keys
        .iter()
        .map(|k| Permission::new(PermissionKey::new(k).unwrap(), *k))
        .collect();
    Role::new("9", "Contract", permissions)
}

fn authenticated(keys: &[&str]) -> SessionState {
    let profile = UserProfile::new("1", "Sam", "Shipper").with_role(role(keys));
    SessionState::Authenticated {
        generation: 1,
        session: Arc::new(Session::from_profile(profile, "tok")),
    }
}

/// WHY: Every non-authenticated state must deny every key
/// REASON: Loading, Unauthenticated and Error carry no trustworthy role
/// BREAKS: Guarded pages flash (or fully render) before the profile arrives
#[test]
fn non_authenticated_states_deny_everything() {
    let states = [
        SessionState::Loading { generation: 0 },
        SessionState::Unauthenticated { generation: 2 },
        SessionState::Error {
            generation: 3,
            cause: "profile service down".to_string(),
        },
    ];

    for state in &states {
        for key in well_known::ALL {
            assert!(!has_permission(state, key), "{:?} granted {}", state, key);
        }
        assert!(!has_any_permission(state, well_known::ALL));
        assert!(!is_admin(state));
    }
}

/// WHY: A profile without a role has no permissions
/// REASON: Role is the only source of grants
/// BREAKS: Freshly invited users see admin menus
#[test]
fn profile_without_role_is_denied() {
    let profile = UserProfile::new("1", "No", "Role");
    assert!(!has_permission(&profile, well_known::CAN_MANAGE_SYSTEM));
    assert!(!has_any_permission(&profile, &["can_view_orders"]));

    let missing: Option<UserProfile> = None;
    assert!(!has_permission(&missing, "can_view_orders"));
}

/// WHY: any-of over an empty list is false; all-of over an empty list is true
/// REASON: Standard existential/universal semantics over slices
/// BREAKS: A guard built from a filtered-to-empty list would open up (any-of)
///         or lock out everyone (all-of)
#[test]
fn empty_list_semantics() {
    let empty: [&str; 0] = [];
    let state = authenticated(&["can_view_orders"]);

    assert!(!has_any_permission(&state, &empty));
    assert!(has_all_permissions(&state, &empty));

    // Vacuous truth still passes through the session gate for all-of
    let loading = SessionState::Loading { generation: 0 };
    assert!(!has_any_permission(&loading, &empty));
}

/// WHY: isAdmin == isSystemAdmin || isCompanyAdmin, for every grant combination
/// REASON: Admin is derived, never stored
/// BREAKS: Admin-only actions drift from the two underlying keys
#[test]
fn admin_is_union_of_system_and_company_admin() {
    let combos: [&[&str]; 4] = [
        &[],
        &[well_known::CAN_MANAGE_SYSTEM],
        &[well_known::CAN_MANAGE_COMPANY],
        &[well_known::CAN_MANAGE_SYSTEM, well_known::CAN_MANAGE_COMPANY],
    ];

    for keys in combos {
        let state = authenticated(keys);
        assert_eq!(
            is_admin(&state),
            is_system_admin(&state) || is_company_admin(&state),
            "grants {:?}",
            keys
        );
    }
}

/// WHY: Requirement evaluation agrees with the slice predicates
/// REASON: Guards are built from Requirement; pages call the predicates directly
/// BREAKS: A page and its route guard disagree about the same grant set
#[test]
fn requirement_matches_slice_predicates() {
    let state = authenticated(&["can_view_orders", "can_pick_items"]);
    let any: Requirement = "can_view_orders|can_manage_system".parse().unwrap();
    let all: Requirement = "can_view_orders,can_manage_system".parse().unwrap();

    assert_eq!(
        satisfies(&state, &any),
        has_any_permission(&state, &["can_view_orders", "can_manage_system"])
    );
    assert_eq!(
        satisfies(&state, &all),
        has_all_permissions(&state, &["can_view_orders", "can_manage_system"])
    );
}

/// WHY: The guard never renders content or fallback while loading
/// REASON: A loading session has not decided anything yet
/// BREAKS: Users see a "no access" flash on every page load
#[test]
fn guard_is_neutral_while_loading() {
    let guard = AccessGuard::new(Requirement::key("can_view_orders").unwrap());
    let loading = SessionState::Loading { generation: 4 };

    assert_eq!(guard.decide(&loading), GuardDecision::Loading);
    let rendered = guard.render(&loading, || "orders", || "denied");
    assert_eq!(rendered, Rendered::Loading);
}

/// WHY: Denied guards render the fallback, or nothing when hidden
/// REASON: Menus hide entries; pages show an explanation
/// BREAKS: Hidden menu entries render a "no access" notice instead
#[test]
fn guard_denial_modes() {
    let state = authenticated(&["can_view_orders"]);
    let visible = AccessGuard::new(Requirement::key("can_export_analytics_data").unwrap());
    let hidden = visible.clone().hide_on_denied(true);

    assert_eq!(visible.render(&state, || 1, || 0), Rendered::Fallback(0));
    assert_eq!(hidden.render(&state, || 1, || 0), Rendered::Nothing);

    let granted = AccessGuard::new(Requirement::key("can_view_orders").unwrap());
    assert_eq!(granted.render(&state, || 1, || 0), Rendered::Content(1));
}

/// WHY: Permission evaluation reads live state (no caching)
/// REASON: Sign-out or a 401 must take effect on the very next check
/// BREAKS: Revoked sessions keep their permissions until some cache expires
#[test]
fn evaluation_tracks_live_session() {
    let store = SessionStore::in_memory();
    let profile = UserProfile::new("1", "Sam", "Shipper").with_role(role(&["can_view_orders"]));
    let ticket = store.begin_load();
    store.complete(ticket, Ok(Session::from_profile(profile, "tok")));

    assert!(has_permission(&store.state(), "can_view_orders"));
    store.invalidate();
    assert!(!has_permission(&store.state(), "can_view_orders"));
}

/// WHY: Permission keys are validated at the boundary
/// REASON: An empty or whitespace key can never match and hides a typo
/// BREAKS: Guards silently deny because of a malformed literal
#[test]
fn malformed_keys_are_rejected() {
    assert!(matches!(PermissionKey::new(""), Err(AccessError::InvalidPermissionKey(_))));
    assert!(PermissionKey::new("can view").is_err());
    assert!(Requirement::key("").is_err());
    assert!("can_a||can_b".parse::<Requirement>().is_err());
}
