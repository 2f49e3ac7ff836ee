//! Immutable role → permission registry.
//!
//! Built once at start-up and shared behind an `Arc`; there is no mutation API
//! after `build()`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Permission, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRegistry {
    grants: BTreeMap<Role, Vec<Permission>>,
}

impl PermissionRegistry {
    /// The default policy: `user` may read users, `admin` may do everything.
    pub fn standard() -> Self {
        Self::builder()
            .grant(Role::User, [Permission::UserRead])
            .grant(
                Role::Admin,
                [
                    Permission::UserRead,
                    Permission::UserWrite,
                    Permission::UserDelete,
                    Permission::AdminRead,
                    Permission::AdminWrite,
                ],
            )
            .build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Ordered permission set of `role`; empty when the role has no entry.
    pub fn permissions_for(&self, role: Role) -> &[Permission] {
        self.grants.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.grants.keys().copied()
    }

    /// Audit/display view of every role with its grants.
    pub fn definitions(&self) -> Vec<RoleDefinition> {
        self.grants
            .iter()
            .map(|(role, permissions)| RoleDefinition {
                name: *role,
                permissions: permissions.clone(),
                description: role_description(*role),
            })
            .collect()
    }
}

impl Default for PermissionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    grants: BTreeMap<Role, Vec<Permission>>,
}

impl RegistryBuilder {
    /// Append permissions to a role, keeping first-grant order and skipping duplicates.
    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        let entry = self.grants.entry(role).or_default();
        for p in permissions {
            if !entry.contains(&p) {
                entry.push(p);
            }
        }
        self
    }

    pub fn build(self) -> PermissionRegistry {
        PermissionRegistry {
            grants: self.grants,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub permissions: Vec<Permission>,
    pub description: &'static str,
}

fn role_description(role: Role) -> &'static str {
    match role {
        Role::User => "Regular account; may read user data",
        Role::Admin => "Administrator with every permission",
    }
}
