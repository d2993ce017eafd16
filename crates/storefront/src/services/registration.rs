//! Customer self-registration.
//!
//! Two layers of checks run before anything reaches the backend: the form
//! rules (RUN shape, allowed email domains, password length and confirmation)
//! and the payload rules the account API itself enforces (dotted RUT, email
//! shape, 6-character password). Both report the first failure only.

use std::sync::LazyLock;

use hazel_lab_core::{Email, Run, UserRole, UserStatus, is_formatted_rut};
use regex::Regex;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::backend::NewUser;

/// Message shown when the backend rejects the account without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "No se pudo registrar el usuario. Verifica los datos e inténtalo nuevamente.";

/// Only institutional and Gmail addresses may register.
static ALLOWED_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@(duoc\.cl|profesor\.duoc\.cl|gmail\.com)$")
        .expect("Invalid regex")
});

const MIN_FORM_PASSWORD: usize = 4;
const MAX_FORM_PASSWORD: usize = 50;
const MIN_API_PASSWORD: usize = 6;

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub run: String,
    pub nombre: String,
    pub apellidos: String,
    pub correo: String,
    pub fecha_nacimiento: String,
    pub region: String,
    pub comuna: String,
    pub direccion: String,
    pub clave: String,
    pub confirmar_clave: String,
}

/// A registration rule the form broke. `Display` is the visitor-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("RUN inválido. Ej: 19011022K")]
    InvalidRun,

    #[error("Correo inválido. Solo @duoc.cl / @profesor.duoc.cl / @gmail.com")]
    EmailDomain,

    #[error("La contraseña debe tener al menos 4 caracteres (se recomienda más).")]
    PasswordLength,

    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,

    #[error("Formato de RUT inválido. Use: 12.345.678-9")]
    RutFormat,

    #[error("Formato de email inválido")]
    EmailFormat,

    #[error("La contraseña debe tener al menos 6 caracteres")]
    PasswordTooShort,
}

/// Check the form rules in order; the first failure wins.
///
/// # Errors
///
/// Returns the first rule broken: RUN, email domain, password length,
/// password confirmation.
pub fn validate(form: &RegistrationForm) -> Result<Run, RegistrationError> {
    let run = Run::parse(&form.run).map_err(|_| RegistrationError::InvalidRun)?;

    if !ALLOWED_EMAIL_RE.is_match(&form.correo) {
        return Err(RegistrationError::EmailDomain);
    }

    let length = form.clave.chars().count();
    if !(MIN_FORM_PASSWORD..=MAX_FORM_PASSWORD).contains(&length) {
        return Err(RegistrationError::PasswordLength);
    }

    if form.clave != form.confirmar_clave {
        return Err(RegistrationError::PasswordMismatch);
    }

    Ok(run)
}

/// Validate the form and build the account payload.
///
/// # Errors
///
/// Returns the first form rule broken (see [`validate`]), then the first
/// payload rule broken: dotted RUT, email shape, 6-character password.
pub fn prepare(form: &RegistrationForm) -> Result<NewUser, RegistrationError> {
    let run = validate(form)?;

    let rut = run.formatted();
    if !is_formatted_rut(&rut) {
        return Err(RegistrationError::RutFormat);
    }

    let email = Email::parse(&form.correo).map_err(|_| RegistrationError::EmailFormat)?;

    if form.clave.chars().count() < MIN_API_PASSWORD {
        return Err(RegistrationError::PasswordTooShort);
    }

    Ok(NewUser {
        username: display_username(form, &run),
        email: email.into_inner(),
        rut,
        password: SecretString::from(form.clave.clone()),
        role: UserRole::Customer,
        status: UserStatus::Activo,
        region: form.region.clone(),
        comuna: form.comuna.clone(),
        direccion: form.direccion.clone(),
        apellidos: form.apellidos.clone(),
        fecha_nacimiento: form.fecha_nacimiento.clone(),
    })
}

/// `"{nombre} {apellidos}"`, falling back to whichever part is present, then
/// to the RUN.
fn display_username(form: &RegistrationForm, run: &Run) -> String {
    let full = format!("{} {}", form.nombre, form.apellidos);
    [full.trim(), form.nombre.as_str(), form.apellidos.as_str()]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .map_or_else(|| run.as_str().to_string(), String::from)
}
