use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::{AdminCredential, CredentialVerifier};

/// State changes on controlled components that need an administrator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Turning a controlled component back into an ordinary one.
    ReleaseControl,
    /// Soft-deleting a controlled component.
    DeleteControlled,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::ReleaseControl => "release_control",
            AdminAction::DeleteControlled => "delete_controlled",
        }
    }
}

impl core::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("admin credential required for '{0}'")]
    MissingCredential(AdminAction),

    #[error("admin credential rejected for '{0}'")]
    Rejected(AdminAction),
}

/// Proof that an admin credential was verified for one specific action.
///
/// The fields are private: the only way to get one is [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminApproval {
    action: AdminAction,
    approved_at: DateTime<Utc>,
}

impl AdminApproval {
    pub fn action(&self) -> AdminAction {
        self.action
    }

    pub fn approved_at(&self) -> DateTime<Utc> {
        self.approved_at
    }

    /// Whether this approval covers `action`.
    pub fn permits(&self, action: AdminAction) -> bool {
        self.action == action
    }
}

/// Verify `credential` for `action` with the external verifier.
///
/// - No IO of its own (the verifier may do IO)
/// - No panics
pub fn authorize<V>(
    verifier: &V,
    credential: Option<&AdminCredential>,
    action: AdminAction,
) -> Result<AdminApproval, AuthzError>
where
    V: CredentialVerifier + ?Sized,
{
    let Some(credential) = credential else {
        return Err(AuthzError::MissingCredential(action));
    };

    if !verifier.verify_admin_credential(credential) {
        tracing::warn!(action = %action, "admin credential rejected");
        return Err(AuthzError::Rejected(action));
    }

    Ok(AdminApproval {
        action,
        approved_at: Utc::now(),
    })
}
