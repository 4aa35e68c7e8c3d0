use blog_portal::pages::{GuardDecision, guard_decision};

#[test]
fn test_logged_in_visitor_is_sent_home_from_auth_pages() {
    assert_eq!(
        guard_decision("/login", true),
        GuardDecision::Redirect("/".to_string())
    );
    assert_eq!(
        guard_decision("/registrar/admin", true),
        GuardDecision::Redirect("/".to_string())
    );
}

#[test]
fn test_anonymous_visitor_is_sent_to_login_with_callback() {
    assert_eq!(
        guard_decision("/perfil", false),
        GuardDecision::Redirect("/login?callbackUrl=%2Fperfil".to_string())
    );
    assert_eq!(
        guard_decision("/post/new", false),
        GuardDecision::Redirect("/login?callbackUrl=%2Fpost%2Fnew".to_string())
    );
}

#[test]
fn test_other_pages_pass_through() {
    assert_eq!(guard_decision("/", false), GuardDecision::Allow);
    assert_eq!(guard_decision("/", true), GuardDecision::Allow);
    assert_eq!(guard_decision("/login", false), GuardDecision::Allow);
    assert_eq!(guard_decision("/perfil", true), GuardDecision::Allow);
    assert_eq!(guard_decision("/assets/app.js", false), GuardDecision::Allow);
}
