//! Small behaviours shared across components.

use std::time::Duration;

use crate::debounce::DebounceGate;
use crate::dialogs::session::SessionPayload;
use crate::domain::types::Role;

/// A component whose triggers pass through a [`DebounceGate`].
pub trait Debounced {
    fn gate(&self) -> &DebounceGate;

    fn debounce_window(&self) -> Duration {
        self.gate().window()
    }
}

/// A dialog that may adjust its working copy as it closes.
pub trait Closable {
    /// Runs before the requester is told about the result.
    fn before_close(&self, _session: &mut SessionPayload, _confirmed: bool) {}
}

/// A component that is only offered to viewers with a minimum role.
pub trait RoleAware {
    fn required_role(&self) -> Role;

    fn permits(&self, role: Role) -> bool {
        role.at_least(self.required_role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AdminOnly;

    impl RoleAware for AdminOnly {
        fn required_role(&self) -> Role {
            Role::Admin
        }
    }

    #[test]
    fn permits_follows_role_order() {
        assert!(AdminOnly.permits(Role::Admin));
        assert!(!AdminOnly.permits(Role::Moderator));
        assert!(!AdminOnly.permits(Role::Guest));
    }
}
