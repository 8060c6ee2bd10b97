//! API-side authorization guard.
//!
//! Enforced at the request boundary, before any service call. Domain crates
//! and infra stay auth-agnostic apart from the moderator capability.

use tracing::warn;

use kivu_auth::{AuthzError, ModeratorCapability, Permission, authorize};

use crate::context::PrincipalContext;

/// Check that the request principal holds `permission`.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), AuthzError> {
    authorize(&principal.principal(), permission).inspect_err(|_| {
        warn!(
            principal_id = %principal.principal_id(),
            permission = permission.as_str(),
            "request denied"
        );
    })
}

/// Obtain the capability required by moderation and admin views.
pub fn moderator(principal: &PrincipalContext) -> Result<ModeratorCapability, AuthzError> {
    ModeratorCapability::grant(&principal.principal())
}
