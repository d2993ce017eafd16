//! Session-related types.
//!
//! Types stored in the session for authentication state and checkout.

use serde::{Deserialize, Serialize};

use hazel_lab_core::{CartLine, UserId};

use crate::backend::BackendUser;
use crate::services::checkout::Notice;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user id.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// Display name.
    pub username: Option<String>,
}

impl CurrentUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

impl From<BackendUser> for CurrentUser {
    fn from(user: BackendUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            username: user.username,
        }
    }
}

/// Cart lines retrieved on checkout entry, kept so later steps of the same
/// visit do not fetch again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    /// Owner of the cart. A snapshot for another user is ignored.
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

/// One-shot message shown on the next page the visitor loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashNotice {
    pub message: String,
    pub is_error: bool,
}

impl FlashNotice {
    /// A success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    /// An error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

impl From<Notice> for FlashNotice {
    fn from(notice: Notice) -> Self {
        Self {
            is_error: notice.kind.is_error(),
            message: notice.message,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart snapshot taken on checkout entry.
    pub const CHECKOUT_SNAPSHOT: &str = "checkout_snapshot";

    /// Key for the one-shot flash notice.
    pub const FLASH: &str = "flash";
}
