//! Authentication route handlers.
//!
//! Login is delegated to the backend's `/auth/login`; on success the returned
//! user becomes the session identity. There are no tokens: the session cookie
//! is the only credential the storefront keeps.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::error::add_breadcrumb;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user, set_flash, take_flash};
use crate::models::{CurrentUser, FlashNotice};
use crate::state::AppState;

/// Shown when the backend rejects the login without a message.
pub const LOGIN_FAILURE_MESSAGE: &str = "Correo o contraseña incorrectos.";

/// Shown when the form is submitted with a blank field.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Ingresa tu correo y contraseña.";

/// Shown when the session cannot be written after a successful login.
pub const SESSION_FAILURE_MESSAGE: &str = "No se pudo iniciar sesión. Inténtalo nuevamente.";

/// Flash shown after logging out.
pub const LOGOUT_MESSAGE: &str = "Sesión cerrada.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashNotice>,
    pub error: Option<String>,
    pub email: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(session: Session, OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        user,
        flash: take_flash(&session).await,
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email.trim()))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_string();
    let failed = |message: &str, email: String| {
        LoginTemplate {
            user: None,
            flash: None,
            error: Some(message.to_string()),
            email,
        }
        .into_response()
    };

    if email.is_empty() || form.password.is_empty() {
        return failed(MISSING_CREDENTIALS_MESSAGE, email);
    }

    match state
        .backend()
        .login(&email, SecretString::from(form.password))
        .await
    {
        Ok(backend_user) => {
            let user = CurrentUser::from(backend_user);
            if let Err(e) = set_current_user(&session, &user).await {
                tracing::error!(error = %e, "Failed to set session");
                return failed(SESSION_FAILURE_MESSAGE, email);
            }

            add_breadcrumb("auth", "User logged in", None);
            tracing::info!(user_id = %user.id, "User logged in");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            failed(&login_error_message(&e), email)
        }
    }
}

/// Visitor-facing text for a failed login: the backend's own message when it
/// sent one, otherwise a generic one.
fn login_error_message(error: &BackendError) -> String {
    error
        .server_message()
        .unwrap_or(LOGIN_FAILURE_MESSAGE)
        .to_string()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }

    set_flash(&session, FlashNotice::success(LOGOUT_MESSAGE)).await;
    Redirect::to("/login").into_response()
}
