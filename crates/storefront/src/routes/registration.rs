//! Registration route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::middleware::{OptionalAuth, set_current_user, take_flash};
use crate::models::{CurrentUser, FlashNotice};
use crate::services::registration::{GENERIC_FAILURE_MESSAGE, RegistrationForm, prepare};
use crate::state::AppState;

/// `<option>` display data for region and comuna selects.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

fn select_options(values: Vec<String>, selected: &str) -> Vec<SelectOption> {
    values
        .into_iter()
        .map(|value| SelectOption {
            selected: value == selected,
            value,
        })
        .collect()
}

/// Registration page template.
///
/// Passwords are never echoed back into the form.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashNotice>,
    pub error: Option<String>,
    pub form: RegistrationForm,
    pub regions: Vec<SelectOption>,
    pub comunas: Vec<SelectOption>,
}

/// Comuna options fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/comunas.html")]
pub struct ComunasTemplate {
    pub comunas: Vec<SelectOption>,
}

impl RegisterTemplate {
    async fn render(
        state: &AppState,
        mut form: RegistrationForm,
        error: Option<String>,
        flash: Option<FlashNotice>,
    ) -> Self {
        form.clave.clear();
        form.confirmar_clave.clear();

        let regions = select_options(state.backend().regions().await, &form.region);
        let comunas = if form.region.trim().is_empty() {
            Vec::new()
        } else {
            select_options(state.backend().comunas(&form.region).await, &form.comuna)
        };

        Self {
            user: None,
            flash,
            error,
            form,
            regions,
            comunas,
        }
    }
}

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let flash = take_flash(&session).await;
    RegisterTemplate::render(&state, RegistrationForm::default(), None, flash)
        .await
        .into_response()
}

/// Handle registration form submission.
///
/// On success the new account is signed in straight away.
#[instrument(skip(state, session, form), fields(email = %form.correo.trim()))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let payload = match prepare(&form) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "Registration form rejected");
            return RegisterTemplate::render(&state, form, Some(e.to_string()), None)
                .await
                .into_response();
        }
    };

    match state.backend().create_user(&payload).await {
        Ok(backend_user) => {
            let user = CurrentUser::from(backend_user);
            if let Err(e) = set_current_user(&session, &user).await {
                tracing::error!(error = %e, "Failed to set session after registration");
                return Redirect::to("/login").into_response();
            }

            add_breadcrumb("auth", "User registered", None);
            tracing::info!(user_id = %user.id, "User registered");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let message = e
                .server_message()
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string();
            RegisterTemplate::render(&state, form, Some(message), None)
                .await
                .into_response()
        }
    }
}

/// Comuna lookup query.
#[derive(Debug, Deserialize)]
pub struct ComunaQuery {
    #[serde(default)]
    pub region: String,
}

/// Comuna `<option>` list for a region (HTMX).
#[instrument(skip(state))]
pub async fn comunas(
    State(state): State<AppState>,
    Query(query): Query<ComunaQuery>,
) -> impl IntoResponse {
    let comunas = if query.region.trim().is_empty() {
        Vec::new()
    } else {
        select_options(state.backend().comunas(&query.region).await, "")
    };

    ComunasTemplate { comunas }
}
