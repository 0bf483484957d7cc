use crate::{PrivilegeLevel, Role};

/// Roles the reconciler may place in a user's role set.
///
/// `systems` holds only the asserted system names that resolved to an
/// existing role; unresolved names are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    baseline: Role,
    elevated: Role,
    systems: Vec<Role>,
}

impl RoleCatalog {
    /// Creates a catalog from the two privilege roles and resolved system roles.
    #[must_use]
    pub fn new(baseline: Role, elevated: Role, systems: Vec<Role>) -> Self {
        Self {
            baseline,
            elevated,
            systems,
        }
    }

    /// Returns the baseline privilege role.
    #[must_use]
    pub fn baseline(&self) -> &Role {
        &self.baseline
    }

    /// Returns the elevated privilege role.
    #[must_use]
    pub fn elevated(&self) -> &Role {
        &self.elevated
    }

    /// Returns the system role with the exact name, if it resolved.
    #[must_use]
    pub fn find_system(&self, name: &str) -> Option<&Role> {
        self.systems.iter().find(|role| role.name() == name)
    }

    fn is_privilege_role(&self, role: &Role) -> bool {
        role.id() == self.baseline.id() || role.id() == self.elevated.id()
    }
}

/// Recomputes a user's role set from freshly asserted claims, in place.
///
/// Asserted systems that resolved are added, roles that are neither asserted
/// systems nor privilege roles are dropped, then the asserted privilege level
/// (if any) selects exactly one privilege role. Without a recognized privilege
/// claim the existing privilege roles are left untouched.
pub fn reconcile_roles(
    roles: &mut Vec<Role>,
    asserted_systems: &[String],
    asserted_privileges: &[String],
    catalog: &RoleCatalog,
) {
    for system in asserted_systems {
        if let Some(role) = catalog.find_system(system)
            && !roles.contains(role)
        {
            roles.push(role.clone());
        }
    }

    roles.retain(|role| {
        catalog.is_privilege_role(role)
            || asserted_systems
                .iter()
                .any(|system| system.as_str() == role.name())
    });

    let (granted, revoked) = match PrivilegeLevel::from_claims(asserted_privileges) {
        Some(PrivilegeLevel::Sysadmin) => (catalog.elevated(), catalog.baseline()),
        Some(PrivilegeLevel::Operator) => (catalog.baseline(), catalog.elevated()),
        None => return,
    };

    roles.retain(|role| role.id() != revoked.id());
    if !roles.iter().any(|role| role.id() == granted.id()) {
        roles.push(granted.clone());
    }
}
