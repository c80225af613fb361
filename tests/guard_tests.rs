use axum::http::{HeaderMap, HeaderValue, header};
use story_portal::{
    GuardDecision, RouteGuard,
    auth::{AuthUser, EffectiveRole, UserCookie},
};

// --- Helpers ---

fn user(roles: &[&str], approved: bool) -> UserCookie {
    UserCookie::Present(AuthUser {
        roles: roles.iter().map(|r| r.to_string()).collect(),
        is_author_approved: approved,
        ..AuthUser::default()
    })
}

fn eval(path: &str, cookie: &UserCookie) -> GuardDecision {
    RouteGuard::default().evaluate(path, cookie)
}

// --- Effective Role ---

#[test]
fn test_role_precedence() {
    let role = |roles: &[&str], approved: bool| {
        EffectiveRole::from_user(&AuthUser {
            roles: roles.iter().map(|r| r.to_string()).collect(),
            is_author_approved: approved,
            ..AuthUser::default()
        })
    };

    assert_eq!(role(&["reader", "cmod", "admin", "omod"], false), EffectiveRole::Admin);
    assert_eq!(role(&["cmod", "omod"], false), EffectiveRole::Omod);
    assert_eq!(role(&["author", "cmod"], true), EffectiveRole::Cmod);
    assert_eq!(role(&["author"], false), EffectiveRole::Author);
    assert_eq!(role(&["reader"], true), EffectiveRole::Author);
    assert_eq!(role(&["reader"], false), EffectiveRole::Reader);
    assert_eq!(role(&[], false), EffectiveRole::Reader);
}

#[test]
fn test_staff_policy_table() {
    assert_eq!(EffectiveRole::Admin.dashboard(), Some("/Admin"));
    assert_eq!(EffectiveRole::Omod.allowed_prefix(), Some("/Op"));
    assert_eq!(EffectiveRole::Omod.dashboard(), Some("/Op/dashboard"));
    assert_eq!(EffectiveRole::Cmod.allowed_prefix(), Some("/Content"));
    assert_eq!(EffectiveRole::Cmod.dashboard(), Some("/Content/dashboard"));
    assert!(!EffectiveRole::Author.is_staff());
    assert!(!EffectiveRole::Reader.is_staff());
}

// --- Cookie Parsing ---

#[test]
fn test_cookie_parsing() {
    assert_eq!(UserCookie::from_value(None), UserCookie::Absent);
    assert_eq!(UserCookie::from_value(Some("")), UserCookie::Absent);
    assert_eq!(UserCookie::from_value(Some("{not json")), UserCookie::Malformed);
    assert_eq!(UserCookie::from_value(Some(r#"{"roles":"admin"}"#)), UserCookie::Malformed);

    let parsed = UserCookie::from_value(Some(
        r#"{"roles":["author"],"isAuthorApproved":false,"name":"Ada","theme":"dark"}"#,
    ));
    let user = parsed.user().expect("cookie should parse");
    assert!(user.has_author_privileges());
    assert_eq!(user.name.as_deref(), Some("Ada"));
}

#[test]
fn test_missing_fields_default() {
    let parsed = UserCookie::from_value(Some("{}"));
    let user = parsed.user().expect("empty object is a valid record");
    assert!(user.roles.is_empty());
    assert!(!user.is_author_approved);
}

#[test]
fn test_cookie_from_headers() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static(r#"theme=dark; user={"roles":["omod"]}"#),
    );
    let cookie = UserCookie::from_headers(&headers, "user");
    assert_eq!(cookie, user(&["omod"], false));
    assert_eq!(UserCookie::from_headers(&headers, "other"), UserCookie::Absent);
}

// --- Staff Confinement ---

#[test]
fn test_admin_outside_subtree_goes_to_dashboard() {
    let admin = user(&["admin"], false);
    assert_eq!(eval("/Op/dashboard", &admin), GuardDecision::Redirect("/Admin"));
    assert_eq!(eval("/", &admin), GuardDecision::Redirect("/Admin"));
    assert_eq!(eval("/Admin/pricing", &admin), GuardDecision::Continue);
}

#[test]
fn test_moderators_are_confined() {
    let omod = user(&["omod"], false);
    assert_eq!(eval("/Content/queue", &omod), GuardDecision::Redirect("/Op/dashboard"));
    assert_eq!(eval("/Op/reports", &omod), GuardDecision::Continue);

    let cmod = user(&["cmod", "author"], true);
    assert_eq!(eval("/author/overview", &cmod), GuardDecision::Redirect("/Content/dashboard"));
    assert_eq!(eval("/Content/dashboard", &cmod), GuardDecision::Continue);
}

// --- Non-staff Exclusion ---

#[test]
fn test_reader_barred_from_staff_subtrees() {
    let reader = user(&["reader"], false);
    assert_eq!(eval("/Admin/pricing", &reader), GuardDecision::Redirect("/"));
    assert_eq!(eval("/Op", &reader), GuardDecision::Redirect("/"));
    assert_eq!(eval("/Content/dashboard", &reader), GuardDecision::Redirect("/"));
    assert_eq!(eval("/stories/42", &reader), GuardDecision::Continue);
}

#[test]
fn test_author_barred_from_staff_subtrees() {
    let author = user(&["author"], false);
    assert_eq!(eval("/Admin", &author), GuardDecision::Redirect("/"));
    assert_eq!(eval("/author/overview", &author), GuardDecision::Continue);
}

// --- Author Flow ---

#[test]
fn test_approved_author_skips_upgrade() {
    assert_eq!(
        eval("/author-upgrade", &user(&["reader"], true)),
        GuardDecision::Redirect("/author/overview")
    );
    assert_eq!(
        eval("/author-upgrade", &user(&["author"], false)),
        GuardDecision::Redirect("/author/overview")
    );
    assert_eq!(eval("/author-upgrade", &user(&["reader"], false)), GuardDecision::Continue);
    assert_eq!(eval("/author-upgrade", &UserCookie::Absent), GuardDecision::Continue);
}

#[test]
fn test_anonymous_author_subtree_goes_to_login() {
    assert_eq!(eval("/author/overview", &UserCookie::Absent), GuardDecision::Redirect("/login"));
    assert_eq!(eval("/author", &UserCookie::Absent), GuardDecision::Redirect("/login"));
    // Not part of the author subtree.
    assert_eq!(eval("/authors", &UserCookie::Absent), GuardDecision::Continue);
}

#[test]
fn test_reader_let_into_author_subtree_once() {
    assert_eq!(
        eval("/author/chapters/new", &user(&["reader"], false)),
        GuardDecision::Continue
    );
}

#[test]
fn test_anonymous_elsewhere_continues() {
    assert_eq!(eval("/", &UserCookie::Absent), GuardDecision::Continue);
    assert_eq!(eval("/Admin", &UserCookie::Absent), GuardDecision::Continue);
}

// --- Malformed Cookies ---

#[test]
fn test_malformed_cookie_fails_open_by_default() {
    let cookie = UserCookie::Malformed;
    assert_eq!(eval("/author/overview", &cookie), GuardDecision::Continue);
    assert_eq!(eval("/Admin", &cookie), GuardDecision::Continue);
}

#[test]
fn test_malformed_cookie_fail_closed() {
    let guard = RouteGuard::default().with_fail_closed(true);
    assert_eq!(
        guard.evaluate("/author/overview", &UserCookie::Malformed),
        GuardDecision::Redirect("/login")
    );
    assert_eq!(guard.evaluate("/", &UserCookie::Malformed), GuardDecision::Continue);
}

// --- Applicability ---

#[test]
fn test_excluded_paths() {
    let guard = RouteGuard::default();
    for path in [
        "/api/session",
        "/static/app.js",
        "/assets/logo.svg",
        "/_next/static/chunk.js",
        "/favicon.ico",
        "/login",
        "/register",
        "/health",
        "/swagger-ui",
        "/images/cover.jpg",
        "/logo.png",
        "/Admin/charts/icon.SVG",
        "/manifest.json",
        "/robots.txt",
        "/bundle/app.js.map",
    ] {
        assert!(!guard.is_applicable(path), "{path} should be skipped");
    }
    for path in [
        "/",
        "/Admin",
        "/author/overview",
        "/stories/1",
        "/stories/v1.2",
        "/Op/.json",
    ] {
        assert!(guard.is_applicable(path), "{path} should be guarded");
    }
}

#[test]
fn test_asset_paths_bypass_staff_rules() {
    let guard = RouteGuard::default();
    let admin = user(&["admin"], false);
    let cmod = user(&["cmod"], false);
    for path in ["/images/cover.jpg", "/logo.png", "/manifest.json", "/robots.txt"] {
        assert!(!guard.is_applicable(path), "{path} should be skipped");
    }
    // Evaluation itself is unchanged; only applicability keeps assets out of it.
    assert_eq!(guard.evaluate("/images/cover.jpg", &admin), GuardDecision::Redirect("/Admin"));
    assert_eq!(
        guard.evaluate("/images/cover.jpg", &cmod),
        GuardDecision::Redirect("/Content/dashboard")
    );
}
