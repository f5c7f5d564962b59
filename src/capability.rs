//! Capability predicates gating registry operations
//!
//! Each mutating operation declares one [`Capability`] and evaluates it
//! before touching state.

use crate::error::{LabError, Result};
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Any caller may act.
    Public,
    /// The caller may only act on their own record.
    SelfOnly,
    /// Only the configured admin may act.
    AdminOnly,
}

impl Capability {
    pub fn permits(&self, caller: &Identity, target: &Identity, admin: &Identity) -> bool {
        match self {
            Capability::Public => true,
            Capability::SelfOnly => caller == target,
            Capability::AdminOnly => caller == admin,
        }
    }

    pub fn check(&self, caller: &Identity, target: &Identity, admin: &Identity) -> Result<()> {
        if self.permits(caller, target, admin) {
            Ok(())
        } else {
            Err(LabError::NotAuthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_permits_everyone() {
        let admin = Identity::from_label("admin");
        let other = Identity::from_label("other");
        assert!(Capability::Public.permits(&other, &admin, &admin));
    }

    #[test]
    fn test_self_only() {
        let admin = Identity::from_label("admin");
        let alice = Identity::from_label("alice");
        let bob = Identity::from_label("bob");
        assert!(Capability::SelfOnly.permits(&alice, &alice, &admin));
        assert!(!Capability::SelfOnly.permits(&alice, &bob, &admin));
        // Admin gets no special treatment for self-service records
        assert_eq!(
            Capability::SelfOnly.check(&admin, &bob, &admin),
            Err(LabError::NotAuthorized)
        );
    }

    #[test]
    fn test_admin_only() {
        let admin = Identity::from_label("admin");
        let alice = Identity::from_label("alice");
        assert!(Capability::AdminOnly.check(&admin, &alice, &admin).is_ok());
        assert_eq!(
            Capability::AdminOnly.check(&alice, &alice, &admin),
            Err(LabError::NotAuthorized)
        );
    }
}
