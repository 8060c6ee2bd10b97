//! Privileged capability required by moderation actions.

use tracing::warn;

use crate::{AuthzError, Permission, Principal, PrincipalId, authorize};

/// Proof that the holder was authorized to moderate products.
///
/// The private field means the only way to obtain one is [`ModeratorCapability::grant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorCapability {
    moderator: PrincipalId,
}

impl ModeratorCapability {
    pub fn grant(principal: &Principal) -> Result<Self, AuthzError> {
        authorize(principal, &Permission::PRODUCTS_MODERATE).inspect_err(|e| {
            warn!(principal_id = %principal.principal_id, error = %e, "moderation denied");
        })?;
        Ok(Self {
            moderator: principal.principal_id,
        })
    }

    pub fn moderator(&self) -> PrincipalId {
        self.moderator
    }
}
