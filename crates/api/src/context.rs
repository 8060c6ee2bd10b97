use kivu_auth::{Principal, PrincipalId, Role};
use kivu_core::UserId;

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware; present on every authenticated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// The marketplace user acting in this request (seller or buyer).
    pub fn user_id(&self) -> UserId {
        self.principal_id.user_id()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Principal with permissions resolved from the token's roles.
    pub fn principal(&self) -> Principal {
        Principal::from_roles(self.principal_id, self.roles.clone())
    }
}
