//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. Sessions hold only the
//! signed-in identity, the checkout snapshot and a flash notice; the backend
//! owns everything durable, so losing them on restart only signs people out.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::models::{FlashNotice, keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "hl_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Store a notice for the next page load.
///
/// Failures are logged and swallowed; a lost flash is not worth an error page.
pub async fn set_flash(session: &Session, notice: FlashNotice) {
    if let Err(e) = session.insert(keys::FLASH, notice).await {
        tracing::warn!(error = %e, "Failed to store flash notice");
    }
}

/// Take the pending flash notice, if any. It is removed from the session.
pub async fn take_flash(session: &Session) -> Option<FlashNotice> {
    session
        .remove::<FlashNotice>(keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash notice");
            None
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_read_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        set_flash(&session, FlashNotice::error("Tu carrito está vacío.")).await;

        let flash = take_flash(&session).await.unwrap();
        assert_eq!(flash.message, "Tu carrito está vacío.");
        assert!(flash.is_error);
        assert_eq!(take_flash(&session).await, None);
    }
}
