//! Two-tier authorization store.
//!
//! One super-admin is fixed at startup and can never be removed. The
//! super-admin may grant and revoke access for delegated admins, who can use
//! the transfer command but cannot manage other admins.

use std::collections::BTreeSet;

use crate::identity::UserId;

/// Result of [`AdminSet::add_admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The target is now a delegated admin.
    Added,
    /// The requester is not the super-admin.
    Denied,
    /// The target is already authorized (delegated, or the super-admin).
    AlreadyAdmin,
}

/// Result of [`AdminSet::remove_admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The target is no longer a delegated admin.
    Removed,
    /// The requester is not the super-admin.
    Denied,
    /// The target is not a delegated admin.
    NotAdmin,
    /// The target is the super-admin, who cannot be removed.
    CannotRemoveSuper,
}

/// Process-lifetime admin registry.
///
/// Invariant: `super_admin` is always authorized and is never stored in
/// `delegated`.
#[derive(Debug, Clone)]
pub struct AdminSet {
    super_admin: UserId,
    delegated: BTreeSet<UserId>,
}

impl AdminSet {
    /// Create a registry with only the super-admin.
    #[must_use]
    pub fn new(super_admin: UserId) -> Self {
        Self {
            super_admin,
            delegated: BTreeSet::new(),
        }
    }

    /// The fixed super-admin identity.
    #[must_use]
    pub fn super_admin(&self) -> UserId {
        self.super_admin
    }

    /// Whether `id` is the super-admin.
    #[must_use]
    pub fn is_super_admin(&self, id: UserId) -> bool {
        id == self.super_admin
    }

    /// Whether `id` may run transfers.
    #[must_use]
    pub fn is_authorized(&self, id: UserId) -> bool {
        self.is_super_admin(id) || self.delegated.contains(&id)
    }

    /// Grant delegated admin rights to `target`.
    pub fn add_admin(&mut self, requester: UserId, target: UserId) -> AddOutcome {
        if !self.is_super_admin(requester) {
            return AddOutcome::Denied;
        }
        if self.is_super_admin(target) || !self.delegated.insert(target) {
            return AddOutcome::AlreadyAdmin;
        }
        AddOutcome::Added
    }

    /// Revoke delegated admin rights from `target`.
    pub fn remove_admin(&mut self, requester: UserId, target: UserId) -> RemoveOutcome {
        if !self.is_super_admin(requester) {
            return RemoveOutcome::Denied;
        }
        if self.is_super_admin(target) {
            return RemoveOutcome::CannotRemoveSuper;
        }
        if self.delegated.remove(&target) {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotAdmin
        }
    }

    /// Delegated admins in ascending id order.
    #[must_use]
    pub fn delegated(&self) -> Vec<UserId> {
        self.delegated.iter().copied().collect()
    }

    /// Every admin: the super-admin first, then delegated admins.
    #[must_use]
    pub fn all_admins(&self) -> Vec<UserId> {
        std::iter::once(self.super_admin)
            .chain(self.delegated.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPER: UserId = UserId(1000);

    #[test]
    fn fresh_set_only_authorizes_super_admin() {
        let admins = AdminSet::new(SUPER);
        assert!(admins.is_authorized(SUPER));
        assert!(admins.delegated().is_empty());
        for id in [0, 1, 999, 1001, u64::MAX] {
            assert!(!admins.is_authorized(UserId(id)));
        }
    }

    #[test]
    fn super_admin_adds_and_authorizes() {
        let mut admins = AdminSet::new(SUPER);
        assert_eq!(admins.add_admin(SUPER, UserId(5)), AddOutcome::Added);
        assert!(admins.is_authorized(UserId(5)));
        assert!(!admins.is_super_admin(UserId(5)));
        assert_eq!(admins.delegated(), vec![UserId(5)]);
    }

    #[test]
    fn non_super_add_is_denied_without_mutation() {
        let mut admins = AdminSet::new(SUPER);
        admins.add_admin(SUPER, UserId(5));

        // A delegated admin cannot add others either.
        assert_eq!(admins.add_admin(UserId(5), UserId(6)), AddOutcome::Denied);
        assert_eq!(admins.add_admin(UserId(7), UserId(7)), AddOutcome::Denied);
        assert_eq!(admins.delegated(), vec![UserId(5)]);
    }

    #[test]
    fn adding_super_admin_reports_already_admin() {
        let mut admins = AdminSet::new(SUPER);
        assert_eq!(admins.add_admin(SUPER, SUPER), AddOutcome::AlreadyAdmin);
        assert!(admins.delegated().is_empty());
        assert_eq!(admins.all_admins(), vec![SUPER]);
    }

    #[test]
    fn adding_twice_reports_already_admin() {
        let mut admins = AdminSet::new(SUPER);
        assert_eq!(admins.add_admin(SUPER, UserId(5)), AddOutcome::Added);
        assert_eq!(admins.add_admin(SUPER, UserId(5)), AddOutcome::AlreadyAdmin);
        assert_eq!(admins.delegated(), vec![UserId(5)]);
    }

    #[test]
    fn remove_outcomes_are_distinct() {
        let mut admins = AdminSet::new(SUPER);
        admins.add_admin(SUPER, UserId(5));

        assert_eq!(admins.remove_admin(UserId(5), UserId(5)), RemoveOutcome::Denied);
        assert_eq!(admins.remove_admin(SUPER, SUPER), RemoveOutcome::CannotRemoveSuper);
        assert_eq!(admins.remove_admin(SUPER, UserId(6)), RemoveOutcome::NotAdmin);
        assert_eq!(admins.remove_admin(SUPER, UserId(5)), RemoveOutcome::Removed);
        assert!(!admins.is_authorized(UserId(5)));
        assert_eq!(admins.remove_admin(SUPER, UserId(5)), RemoveOutcome::NotAdmin);
    }

    #[test]
    fn removing_super_never_touches_delegated() {
        let mut admins = AdminSet::new(SUPER);
        admins.add_admin(SUPER, UserId(2));
        admins.add_admin(SUPER, UserId(3));

        assert_eq!(admins.remove_admin(SUPER, SUPER), RemoveOutcome::CannotRemoveSuper);
        assert_eq!(admins.remove_admin(UserId(2), SUPER), RemoveOutcome::Denied);
        assert_eq!(admins.delegated(), vec![UserId(2), UserId(3)]);
        assert!(admins.is_authorized(SUPER));
    }

    #[test]
    fn all_admins_lists_super_first_then_sorted_delegates() {
        let mut admins = AdminSet::new(SUPER);
        admins.add_admin(SUPER, UserId(30));
        admins.add_admin(SUPER, UserId(10));
        assert_eq!(admins.all_admins(), vec![SUPER, UserId(10), UserId(30)]);
    }
}
