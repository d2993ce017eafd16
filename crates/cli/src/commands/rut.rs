//! RUT helper commands.

use hazel_lab_core::{Run, format_rut, is_formatted_rut};
use thiserror::Error;

/// The input is neither a compact RUN nor a dotted RUT.
#[derive(Debug, Error)]
#[error("Invalid RUT: {0}. Expected 19011022K or 19.011.022-K")]
pub struct InvalidRut(String);

/// Log `rut` in dotted form.
pub fn format(rut: &str) {
    tracing::info!("{}", format_rut(rut));
}

/// Check the shape of a RUN or RUT and log its dotted form.
///
/// # Errors
///
/// Returns [`InvalidRut`] if the input is malformed.
pub fn validate(rut: &str) -> Result<(), InvalidRut> {
    let formatted = check(rut).ok_or_else(|| InvalidRut(rut.to_string()))?;
    tracing::info!("{formatted} is valid");
    Ok(())
}

/// Dotted form of a well-formed RUN or RUT.
fn check(rut: &str) -> Option<String> {
    let rut = rut.trim();
    if is_formatted_rut(rut) {
        return Some(rut.to_ascii_uppercase());
    }
    Run::parse(rut).ok().map(|run| run.formatted())
}
