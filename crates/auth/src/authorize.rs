use warden_core::UserId;

use crate::{AuthError, Permission, PermissionRegistry, SessionRecord};

/// Authorize a session for `required`.
///
/// Consults the registry by the session's role; no I/O.
pub fn authorize(
    registry: &PermissionRegistry,
    session: &SessionRecord,
    required: Permission,
) -> Result<(), AuthError> {
    if registry.has(session.role, required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(required))
    }
}

/// Principals may always act on their own account; acting on anyone else's
/// needs `required`.
pub fn authorize_self_or(
    registry: &PermissionRegistry,
    session: &SessionRecord,
    target: UserId,
    required: Permission,
) -> Result<(), AuthError> {
    if session.user_id == target {
        return Ok(());
    }
    authorize(registry, session, required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn session(role: Role) -> SessionRecord {
        SessionRecord {
            user_id: UserId::new(),
            email: "a@x.com".to_string(),
            role,
            permissions: vec![],
        }
    }

    #[test]
    fn admin_passes_and_user_is_denied() {
        let registry = PermissionRegistry::standard();
        assert!(authorize(&registry, &session(Role::Admin), Permission::AdminRead).is_ok());
        assert_eq!(
            authorize(&registry, &session(Role::User), Permission::AdminRead),
            Err(AuthError::PermissionDenied(Permission::AdminRead))
        );
    }

    #[test]
    fn self_access_needs_no_permission() {
        let registry = PermissionRegistry::standard();
        let me = session(Role::User);

        assert!(authorize_self_or(&registry, &me, me.user_id, Permission::UserDelete).is_ok());
        assert!(authorize_self_or(&registry, &me, UserId::new(), Permission::UserDelete).is_err());
    }
}
