//! Access policy.
//!
//! Every lifecycle operation and every live-channel subscription asks
//! [`authorize`] before touching an order. Nothing else in the crate makes
//! role-based decisions; the merchant transition table in
//! [`OrderStatus::merchant_next`](crate::entities::OrderStatus::merchant_next)
//! is a state-machine rule, not an access rule.

use thiserror::Error;

use crate::entities::order::OrderScope;
use crate::identity::{Caller, Role};

/// What the caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Subscribe,
    Pay,
    SetStatus,
    Refund,
}

/// Who an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership<'a> {
    pub consumer_id: &'a str,
    pub merchant_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("caller may not {action:?} this order")]
pub struct AccessDenied {
    pub action: Action,
}

fn can_access(caller: &Caller, order: &Ownership<'_>) -> bool {
    match &caller.role {
        Role::AdminLike(_) => true,
        Role::Consumer => order.consumer_id == caller.user_id,
        Role::Merchant(merchant_id) => order.merchant_id == merchant_id,
    }
}

fn role_allows(caller: &Caller, action: Action) -> bool {
    match action {
        Action::Create => matches!(caller.role, Role::Consumer),
        Action::Read | Action::Subscribe => true,
        Action::Pay => !matches!(caller.role, Role::Merchant(_)),
        Action::SetStatus => !matches!(caller.role, Role::Consumer),
        Action::Refund => caller.is_admin_like(),
    }
}

/// Decide whether `caller` may perform `action`.
///
/// `order` is `None` only for [`Action::Create`], which is decided on the
/// role alone. Any other action without a target is denied.
pub fn authorize(
    caller: &Caller,
    action: Action,
    order: Option<Ownership<'_>>,
) -> Result<(), AccessDenied> {
    let visible = order.is_some_and(|o| can_access(caller, &o));
    let allowed = role_allows(caller, action) && (action == Action::Create || visible);
    if allowed {
        Ok(())
    } else {
        Err(AccessDenied { action })
    }
}

/// The role half of [`authorize`], for rejecting a caller before the
/// target order is looked up.
pub fn authorize_role(caller: &Caller, action: Action) -> Result<(), AccessDenied> {
    if role_allows(caller, action) {
        Ok(())
    } else {
        Err(AccessDenied { action })
    }
}

/// The slice of orders a caller may list.
pub fn list_scope(caller: &Caller) -> OrderScope {
    match &caller.role {
        Role::AdminLike(_) => OrderScope::All,
        Role::Consumer => OrderScope::Consumer(caller.user_id.clone()),
        Role::Merchant(merchant_id) => OrderScope::Merchant(merchant_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaffRole;

    const ORDER: Ownership<'static> = Ownership {
        consumer_id: "alice",
        merchant_id: "bakery-one",
    };

    fn allowed(caller: &Caller, action: Action) -> bool {
        authorize(caller, action, Some(ORDER)).is_ok()
    }

    #[test]
    fn test_admin_like_can_do_everything() {
        for staff in [StaffRole::Admin, StaffRole::Support] {
            let caller = Caller::staff("root", staff);
            for action in [
                Action::Read,
                Action::Subscribe,
                Action::Pay,
                Action::SetStatus,
                Action::Refund,
            ] {
                assert!(allowed(&caller, action), "{staff:?} denied {action:?}");
            }
            assert!(authorize(&caller, Action::Create, None).is_err());
        }
    }

    #[test]
    fn test_consumer_limited_to_own_orders() {
        let owner = Caller::consumer("alice");
        let other = Caller::consumer("bob");

        assert!(allowed(&owner, Action::Read));
        assert!(allowed(&owner, Action::Pay));
        assert!(!allowed(&owner, Action::SetStatus));
        assert!(!allowed(&owner, Action::Refund));

        for action in [Action::Read, Action::Subscribe, Action::Pay] {
            assert_eq!(
                authorize(&other, action, Some(ORDER)),
                Err(AccessDenied { action })
            );
        }
        assert!(authorize(&other, Action::Create, None).is_ok());
    }

    #[test]
    fn test_merchant_limited_to_own_merchant() {
        let staff = Caller::merchant("m1", "bakery-one");
        let foreign = Caller::merchant("m2", "butcher-two");

        assert!(allowed(&staff, Action::Read));
        assert!(allowed(&staff, Action::SetStatus));
        assert!(!allowed(&staff, Action::Pay));
        assert!(!allowed(&staff, Action::Refund));
        assert!(!allowed(&foreign, Action::Read));
        assert!(!allowed(&foreign, Action::SetStatus));
        assert!(authorize(&staff, Action::Create, None).is_err());
    }

    #[test]
    fn test_role_check_ignores_ownership() {
        assert!(authorize_role(&Caller::consumer("bob"), Action::Read).is_ok());
        assert_eq!(
            authorize_role(&Caller::merchant("m1", "bakery-one"), Action::Refund),
            Err(AccessDenied {
                action: Action::Refund
            })
        );
        assert!(authorize_role(&Caller::staff("sam", StaffRole::Support), Action::Refund).is_ok());
    }

    #[test]
    fn test_missing_target_is_denied() {
        let admin = Caller::staff("root", StaffRole::Admin);
        assert!(authorize(&admin, Action::Read, None).is_err());
    }

    #[test]
    fn test_list_scope_follows_role() {
        assert_eq!(
            list_scope(&Caller::consumer("alice")),
            OrderScope::Consumer("alice".into())
        );
        assert_eq!(
            list_scope(&Caller::merchant("m1", "bakery-one")),
            OrderScope::Merchant("bakery-one".into())
        );
        assert_eq!(
            list_scope(&Caller::staff("root", StaffRole::Support)),
            OrderScope::All
        );
    }
}
