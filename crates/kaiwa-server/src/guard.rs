//! Channel authorization guard.
//!
//! The single source of truth for per-channel capability checks. One guard
//! instance lives in [`crate::state::AppState`] and is consulted on inbound
//! sends, history fetches, and per-recipient broadcast fan-out; the policy is
//! never re-implemented at call sites.

use kaiwa_core::{Channel, Identity};

/// Action a caller wants to perform on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Read,
    Send,
    ReceiveBroadcast,
}

/// Capability check: (identity, channel, action) → allow/deny.
///
/// Policy table:
///
/// | channel | action | rule |
/// |---------|--------|------|
/// | general | any    | allowed if identity present |
/// | admin   | any    | allowed only if role == admin |
///
/// No identity ⇒ deny all actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelGuard;

impl ChannelGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn allowed(
        &self,
        identity: Option<&Identity>,
        channel: Channel,
        _action: ChannelAction,
    ) -> bool {
        let Some(identity) = identity else {
            return false;
        };
        match channel {
            Channel::General => true,
            Channel::Admin => identity.is_admin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::Role;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            display_name: "t".to_string(),
            avatar_url: None,
            role,
        }
    }

    const ACTIONS: [ChannelAction; 3] = [
        ChannelAction::Read,
        ChannelAction::Send,
        ChannelAction::ReceiveBroadcast,
    ];

    #[test]
    fn test_no_identity_denies_everything() {
        let guard = ChannelGuard::new();
        for channel in [Channel::General, Channel::Admin] {
            for action in ACTIONS {
                assert!(!guard.allowed(None, channel, action));
            }
        }
    }

    #[test]
    fn test_member_allowed_general_denied_admin() {
        let guard = ChannelGuard::new();
        let member = identity(Role::Member);
        for action in ACTIONS {
            assert!(guard.allowed(Some(&member), Channel::General, action));
            assert!(!guard.allowed(Some(&member), Channel::Admin, action));
        }
    }

    #[test]
    fn test_admin_allowed_everywhere() {
        let guard = ChannelGuard::new();
        let admin = identity(Role::Admin);
        for channel in [Channel::General, Channel::Admin] {
            for action in ACTIONS {
                assert!(guard.allowed(Some(&admin), channel, action));
            }
        }
    }
}
