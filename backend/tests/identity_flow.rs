//! End-to-end identity behaviour over the in-memory credential store.

use actix_session::SessionMiddleware;
use actix_session::config::CookieContentSecurity;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use recipeapp::IdentityStack;
use recipeapp::domain::{
    CHEF_ROLE, GUEST_ROLE, IdentityError, IdentityOptions, MAX_PASSWORD_BYTES, bootstrap, has_role,
    is_guest,
};
use recipeapp::example_data::{EXAMPLE_PASSWORD, EXAMPLE_USERS, seed_example_users};
use recipeapp::inbound::http::state::HttpState;
use recipeapp::inbound::http::users::{IdentityView, UserView, configure};
use recipeapp::outbound::crypto::MIN_COST;
use rstest::{fixture, rstest};
use serde_json::json;

fn in_memory(options: IdentityOptions) -> IdentityStack {
    IdentityStack::in_memory(MIN_COST, options).expect("minimum cost is valid")
}

#[fixture]
fn stack() -> IdentityStack {
    in_memory(IdentityOptions::default())
}

fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .build()
}

#[rstest]
#[tokio::test]
async fn bootstrap_is_idempotent(stack: IdentityStack) {
    let first = bootstrap(&stack.registry).await.expect("first bootstrap");
    let second = bootstrap(&stack.registry).await.expect("second bootstrap");

    let names: Vec<&str> = first.roles().iter().map(|r| r.name().as_str()).collect();
    assert_eq!(names, vec![CHEF_ROLE, GUEST_ROLE]);
    assert_eq!(first.roles(), second.roles());
    assert_eq!(stack.registry.list_roles().await.expect("list").len(), 2);
}

#[rstest]
#[tokio::test]
async fn make_users_twice_creates_each_user_once(stack: IdentityStack) {
    let first = seed_example_users(&stack.identity, &stack.registry)
        .await
        .expect("first seeding");
    let second = seed_example_users(&stack.identity, &stack.registry)
        .await
        .expect("second seeding");

    assert_eq!(first.created.len(), EXAMPLE_USERS.len());
    assert!(first.existing.is_empty());
    assert!(second.created.is_empty());
    assert_eq!(second.existing, first.created);

    for example in EXAMPLE_USERS {
        let user = stack
            .identity
            .authenticate(example.email, EXAMPLE_PASSWORD, None)
            .await
            .expect("example user logs in");
        assert!(has_role(&user, example.role));
        assert_eq!(is_guest(&user), example.role == GUEST_ROLE);
    }
}

#[rstest]
#[tokio::test]
async fn concurrent_registration_has_one_winner(stack: IdentityStack) {
    bootstrap(&stack.registry).await.expect("bootstrap");

    let (a, b) = tokio::join!(
        stack.identity.register("race@x.com", "pw", CHEF_ROLE),
        stack.identity.register("race@x.com", "pw", GUEST_ROLE),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(IdentityError::DuplicateEmail)))
    );
}

#[rstest]
#[tokio::test]
async fn duplicate_registration_keeps_the_first_account(stack: IdentityStack) {
    bootstrap(&stack.registry).await.expect("bootstrap");
    stack
        .identity
        .register("dup@x.com", "pw", CHEF_ROLE)
        .await
        .expect("first registration");

    let err = stack
        .identity
        .register("dup@x.com", "pw2", GUEST_ROLE)
        .await
        .expect_err("email already taken");
    assert_eq!(err, IdentityError::DuplicateEmail);

    let user = stack
        .identity
        .authenticate("dup@x.com", "pw", None)
        .await
        .expect("first password still valid");
    assert!(has_role(&user, CHEF_ROLE));
    assert!(!has_role(&user, GUEST_ROLE));

    let err = stack
        .identity
        .authenticate("dup@x.com", "pw2", None)
        .await
        .expect_err("second password was never stored");
    assert_eq!(err, IdentityError::AuthFailure);
}

#[rstest]
#[tokio::test]
async fn passwords_sharing_a_long_prefix_stay_distinct(stack: IdentityStack) {
    bootstrap(&stack.registry).await.expect("bootstrap");
    let prefix = "a".repeat(MAX_PASSWORD_BYTES);
    let first = format!("{prefix}one");
    let second = format!("{prefix}two");

    let err = stack
        .identity
        .register("long@x.com", &first, CHEF_ROLE)
        .await
        .expect_err("overlong password");
    assert!(matches!(err, IdentityError::Invalid { .. }), "got {err:?}");

    stack
        .identity
        .register("long@x.com", &prefix, CHEF_ROLE)
        .await
        .expect("72-byte password");
    for attempt in [&first, &second] {
        let err = stack
            .identity
            .authenticate("long@x.com", attempt, None)
            .await
            .expect_err("longer password must not match");
        assert_eq!(err, IdentityError::AuthFailure);
    }
}

#[rstest]
#[tokio::test]
async fn login_records_telemetry(stack: IdentityStack) {
    bootstrap(&stack.registry).await.expect("bootstrap");
    stack
        .identity
        .register("cook@x.com", "pw", CHEF_ROLE)
        .await
        .expect("register");

    let first_ip = "192.0.2.1".parse().expect("ip");
    let second_ip = "192.0.2.2".parse().expect("ip");
    stack
        .identity
        .authenticate("cook@x.com", "pw", Some(first_ip))
        .await
        .expect("first login");
    let user = stack
        .identity
        .authenticate("cook@x.com", "pw", Some(second_ip))
        .await
        .expect("second login");

    let telemetry = user.telemetry();
    assert_eq!(telemetry.login_count, 2);
    assert_eq!(telemetry.last_login_ip.as_deref(), Some("192.0.2.1"));
    assert_eq!(telemetry.current_login_ip.as_deref(), Some("192.0.2.2"));
    assert!(telemetry.last_login_at <= telemetry.current_login_at);
}

#[rstest]
#[tokio::test]
async fn inactive_users_cannot_log_in(stack: IdentityStack) {
    bootstrap(&stack.registry).await.expect("bootstrap");
    let user = stack
        .identity
        .register("cook@x.com", "pw", CHEF_ROLE)
        .await
        .expect("register");
    stack
        .identity
        .set_active(user.id(), false)
        .await
        .expect("deactivate");

    let err = stack
        .identity
        .authenticate("cook@x.com", "pw", None)
        .await
        .expect_err("inactive user");
    assert_eq!(err, IdentityError::AuthFailure);
}

#[rstest]
#[tokio::test]
async fn unknown_role_policy_is_configurable() {
    let strict = in_memory(IdentityOptions::default());
    bootstrap(&strict.registry).await.expect("bootstrap");
    let err = strict
        .identity
        .register("a@x.com", "pw", "admin")
        .await
        .expect_err("unknown role");
    assert!(matches!(err, IdentityError::RoleNotFound { .. }));
    assert!(!strict.identity.is_registered("a@x.com").await.expect("lookup"));

    let permissive = in_memory(IdentityOptions {
        allow_roleless_registration: true,
    });
    bootstrap(&permissive.registry).await.expect("bootstrap");
    let user = permissive
        .identity
        .register("a@x.com", "pw", "admin")
        .await
        .expect("roleless registration");
    assert!(user.roles().is_empty());
    assert!(is_guest(&user));
}

#[rstest]
#[actix_web::test]
async fn http_register_login_me_logout(stack: IdentityStack) {
    let token = bootstrap(&stack.registry).await.expect("bootstrap");
    assert_eq!(token.roles().len(), 2);
    let state = HttpState::new(stack.identity, &token);
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(session_middleware())
            .configure(configure),
    )
    .await;

    let register_req = actix_test::TestRequest::post()
        .uri("/api/v1/register")
        .set_json(json!({ "email": "cook@x.com", "password": "pw", "role": "chef" }))
        .to_request();
    let created = actix_test::call_service(&app, register_req).await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let login_req = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": "cook@x.com", "password": "pw" }))
        .to_request();
    let res = actix_test::call_service(&app, login_req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie: Cookie<'static> = res
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned();
    let user: UserView = actix_test::read_body_json(res).await;
    assert_eq!(user.roles, vec![CHEF_ROLE]);

    let me = actix_test::TestRequest::get()
        .uri("/api/v1/me")
        .cookie(cookie.clone())
        .to_request();
    let identity: IdentityView = actix_test::call_and_read_body_json(&app, me).await;
    assert_eq!(identity.user, user);
    assert!(!identity.guest);

    let logout_req = actix_test::TestRequest::post()
        .uri("/api/v1/logout")
        .cookie(cookie)
        .to_request();
    let res = actix_test::call_service(&app, logout_req).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}
