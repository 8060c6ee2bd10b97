//! Role → permission mapping.

use crate::{Permission, Role};

const SELLER_PERMISSIONS: &[Permission] = &[
    Permission::PRODUCTS_SUBMIT,
    Permission::PRODUCTS_READ_OWN,
    Permission::PURCHASES_CREATE,
    Permission::ORDERS_READ_OWN,
];

const BUYER_PERMISSIONS: &[Permission] = &[Permission::PURCHASES_CREATE, Permission::ORDERS_READ_OWN];

/// Static role policy.
///
/// - `admin`: everything (`*`)
/// - `seller`: submit and read own products, purchase, read own orders
/// - `buyer`: purchase, read own orders
///
/// Unknown roles grant nothing. Duplicates are removed, order is stable.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r.as_str() == Role::ADMIN.as_str()) {
        return vec![Permission::WILDCARD];
    }

    let mut permissions: Vec<Permission> = Vec::new();
    for role in roles {
        let granted = match role.as_str() {
            "seller" => SELLER_PERMISSIONS,
            "buyer" => BUYER_PERMISSIONS,
            _ => &[],
        };
        for perm in granted {
            if !permissions.contains(perm) {
                permissions.push(perm.clone());
            }
        }
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_collapses_to_wildcard() {
        let perms = permissions_from_roles(&[Role::SELLER, Role::ADMIN]);
        assert_eq!(perms, vec![Permission::WILDCARD]);
    }

    #[test]
    fn overlapping_roles_are_deduplicated() {
        let perms = permissions_from_roles(&[Role::SELLER, Role::BUYER]);
        assert_eq!(perms.len(), 4);
        assert!(perms.contains(&Permission::PRODUCTS_SUBMIT));
    }
}
