use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "products.submit"). The wildcard `"*"`
/// grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const PRODUCTS_SUBMIT: Permission = Permission(Cow::Borrowed("products.submit"));
    pub const PRODUCTS_READ_OWN: Permission = Permission(Cow::Borrowed("products.read_own"));
    pub const PRODUCTS_MODERATE: Permission = Permission(Cow::Borrowed("products.moderate"));
    pub const PURCHASES_CREATE: Permission = Permission(Cow::Borrowed("purchases.create"));
    pub const ORDERS_READ_OWN: Permission = Permission(Cow::Borrowed("orders.read_own"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
