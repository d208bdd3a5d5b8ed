//! Identity API handlers.
//!
//! ```text
//! POST /api/v1/register {"email":"cook@example.com","password":"pw","role":"chef"}
//! POST /api/v1/login    {"email":"cook@example.com","password":"pw"}
//! POST /api/v1/logout
//! GET  /api/v1/me
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ApiResult, Error, GUEST_ROLE, SessionIdentity, User, session_is_guest};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn default_role() -> String {
    GUEST_ROLE.to_owned()
}

/// Body of `POST /api/v1/register`.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

/// Body of `POST /api/v1/login`.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub roles: Vec<String>,
    pub active: bool,
    pub login_count: u32,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            email: user.email().to_string(),
            roles: user
                .roles()
                .iter()
                .map(|role| role.name().to_string())
                .collect(),
            active: user.is_active(),
            login_count: user.telemetry().login_count,
        }
    }
}

/// Identity of the current session.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub user: UserView,
    pub guest: bool,
}

impl From<&User> for IdentityView {
    fn from(user: &User) -> Self {
        let identity = SessionIdentity::for_user(user);
        Self {
            user: UserView::from(user),
            guest: session_is_guest(&identity),
        }
    }
}

/// Create an account holding the requested role.
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        email,
        password,
        role,
    } = payload.into_inner();
    let user = state.identity.register(&email, &password, &role).await?;
    Ok(HttpResponse::Created().json(UserView::from(&user)))
}

/// Authenticate and establish a session.
#[post("/login")]
pub async fn login(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserView>> {
    let client_ip = req.peer_addr().map(|addr| addr.ip());
    let user = state
        .identity
        .authenticate(&payload.email, &payload.password, client_ip)
        .await?;
    session.persist_user(user.id())?;
    Ok(web::Json(UserView::from(&user)))
}

/// End the session. Anonymous callers get the same response.
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Current identity, or `401` for anonymous sessions.
///
/// Sessions pointing at deleted or deactivated accounts are purged and
/// treated as anonymous.
#[get("/me")]
pub async fn current_identity(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<IdentityView>> {
    let user_id = session.require_user_id()?;
    match state.identity.find_active_user(user_id).await? {
        Some(user) => Ok(web::Json(IdentityView::from(&user))),
        None => {
            debug!(%user_id, "stale session dropped");
            session.purge();
            Err(Error::unauthorized("login required"))
        }
    }
}

/// Register the identity routes on a service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(register)
            .service(login)
            .service(logout)
            .service(current_identity),
    );
}
