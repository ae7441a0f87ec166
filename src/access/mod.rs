//! Access policy: who may do what.
//!
//! A caller's [`Role`] is never stored. It is derived per request from the
//! caller's group memberships and superuser flag, carried in an [`Identity`]
//! that handlers pass explicitly into every check below. Checks return
//! [`Denied`] rather than an error; the HTTP layer turns it into a 403.

mod extract;

pub use extract::Manager;

use serde::Serialize;

use crate::utils::error::AppError;

pub const MANAGER_GROUP: &str = "Manager";
pub const DELIVERY_CREW_GROUP: &str = "Delivery Crew";

const GENERIC_DENIAL: &str = "You do not have permission to perform this action.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Manager,
    DeliveryCrew,
}

/// The two staff groups whose membership is administered over the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffGroup {
    Manager,
    DeliveryCrew,
}

impl StaffGroup {
    /// Maps the URL segment (`manager`, `delivery_crew`) to a group.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "manager" => Some(StaffGroup::Manager),
            "delivery_crew" => Some(StaffGroup::DeliveryCrew),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StaffGroup::Manager => MANAGER_GROUP,
            StaffGroup::DeliveryCrew => DELIVERY_CREW_GROUP,
        }
    }
}

/// The authenticated caller, as resolved for the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
    pub groups: Vec<String>,
}

impl Identity {
    fn in_group(&self, group: StaffGroup) -> bool {
        self.groups.iter().any(|g| g == group.name())
    }

    pub fn is_manager(&self) -> bool {
        self.is_superuser || self.in_group(StaffGroup::Manager)
    }

    pub fn is_delivery_crew(&self) -> bool {
        self.in_group(StaffGroup::DeliveryCrew)
    }

    /// Manager wins over delivery crew when a user holds both.
    pub fn role(&self) -> Role {
        if self.is_manager() {
            Role::Manager
        } else if self.is_delivery_crew() {
            Role::DeliveryCrew
        } else {
            Role::Customer
        }
    }

    /// Every role the caller holds, for display.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::new();
        if self.is_manager() {
            roles.push(Role::Manager);
        }
        if self.is_delivery_crew() {
            roles.push(Role::DeliveryCrew);
        }
        if roles.is_empty() {
            roles.push(Role::Customer);
        }
        roles
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denied {
    pub detail: &'static str,
}

impl Denied {
    fn generic() -> Self {
        Denied {
            detail: GENERIC_DENIAL,
        }
    }
}

impl From<Denied> for AppError {
    fn from(denied: Denied) -> Self {
        AppError::Forbidden(denied.detail.to_owned())
    }
}

/// Catalog writes and group administration.
pub fn require_manager(identity: &Identity) -> Result<(), Denied> {
    if identity.is_manager() {
        Ok(())
    } else {
        tracing::debug!(user_id = identity.id, "manager check failed");
        Err(Denied::generic())
    }
}

/// Which orders a caller's listing may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    AssignedTo(i32),
    OwnedBy(i32),
}

pub fn order_scope(identity: &Identity) -> OrderScope {
    match identity.role() {
        Role::Manager => OrderScope::All,
        Role::DeliveryCrew => OrderScope::AssignedTo(identity.id),
        Role::Customer => OrderScope::OwnedBy(identity.id),
    }
}

pub fn can_view_order(identity: &Identity, owner_id: i32) -> Result<(), Denied> {
    if identity.is_manager() || identity.id == owner_id {
        Ok(())
    } else {
        Err(Denied::generic())
    }
}

/// What a caller is allowed to change on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPatchGrant {
    /// Delivery crew assignment and status.
    Full,
    /// Status only.
    StatusOnly,
}

pub fn order_patch_grant(
    identity: &Identity,
    assigned_crew: Option<i32>,
) -> Result<OrderPatchGrant, Denied> {
    match identity.role() {
        Role::Manager => Ok(OrderPatchGrant::Full),
        Role::DeliveryCrew if assigned_crew == Some(identity.id) => {
            Ok(OrderPatchGrant::StatusOnly)
        }
        Role::DeliveryCrew => Err(Denied {
            detail: "This order is not assigned to you.",
        }),
        Role::Customer => Err(Denied::generic()),
    }
}

pub fn can_delete_order(identity: &Identity) -> Result<(), Denied> {
    require_manager(identity)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn identity(id: i32, groups: &[&str]) -> Identity {
        Identity {
            id,
            username: format!("user{id}"),
            is_superuser: false,
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn role_is_derived_from_groups() {
        assert_eq!(identity(1, &[]).role(), Role::Customer);
        assert_eq!(identity(2, &[MANAGER_GROUP]).role(), Role::Manager);
        assert_eq!(identity(3, &[DELIVERY_CREW_GROUP]).role(), Role::DeliveryCrew);
    }

    #[test]
    fn superuser_counts_as_manager() {
        let mut admin = identity(1, &[]);
        admin.is_superuser = true;
        assert_eq!(admin.role(), Role::Manager);
        assert!(require_manager(&admin).is_ok());
    }

    #[test]
    fn manager_takes_precedence_over_delivery_crew() {
        let both = identity(4, &[DELIVERY_CREW_GROUP, MANAGER_GROUP]);
        assert_eq!(both.role(), Role::Manager);
        assert_eq!(order_scope(&both), OrderScope::All);
        assert_eq!(both.roles(), vec![Role::Manager, Role::DeliveryCrew]);
    }

    #[test]
    fn unrelated_groups_do_not_grant_anything() {
        let user = identity(5, &["Kitchen"]);
        assert_eq!(user.role(), Role::Customer);
        assert!(require_manager(&user).is_err());
    }

    #[test]
    fn listing_scope_follows_role() {
        assert_eq!(order_scope(&identity(7, &[])), OrderScope::OwnedBy(7));
        assert_eq!(order_scope(&identity(9, &[DELIVERY_CREW_GROUP])), OrderScope::AssignedTo(9));
        assert_eq!(order_scope(&identity(2, &[MANAGER_GROUP])), OrderScope::All);
    }

    #[test]
    fn only_owner_or_manager_reads_an_order() {
        assert!(can_view_order(&identity(7, &[]), 7).is_ok());
        assert!(can_view_order(&identity(8, &[]), 7).is_err());
        assert!(can_view_order(&identity(9, &[DELIVERY_CREW_GROUP]), 7).is_err());
        assert!(can_view_order(&identity(2, &[MANAGER_GROUP]), 7).is_ok());
    }

    #[test]
    fn patch_grants() {
        let manager = identity(2, &[MANAGER_GROUP]);
        let crew = identity(9, &[DELIVERY_CREW_GROUP]);
        let customer = identity(7, &[]);

        assert_eq!(order_patch_grant(&manager, None), Ok(OrderPatchGrant::Full));
        assert_eq!(order_patch_grant(&crew, Some(9)), Ok(OrderPatchGrant::StatusOnly));
        assert!(order_patch_grant(&crew, Some(10)).is_err());
        assert!(order_patch_grant(&crew, None).is_err());
        assert!(order_patch_grant(&customer, None).is_err());
    }

    #[test]
    fn only_managers_delete_orders() {
        assert!(can_delete_order(&identity(2, &[MANAGER_GROUP])).is_ok());
        assert!(can_delete_order(&identity(9, &[DELIVERY_CREW_GROUP])).is_err());
    }

    #[test]
    fn denial_becomes_forbidden() {
        let err: AppError = require_manager(&identity(1, &[])).unwrap_err().into();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn staff_group_slugs() {
        assert_eq!(StaffGroup::from_slug("manager"), Some(StaffGroup::Manager));
        assert_eq!(StaffGroup::from_slug("delivery_crew"), Some(StaffGroup::DeliveryCrew));
        assert_eq!(StaffGroup::from_slug("kitchen"), None);
        assert_eq!(StaffGroup::DeliveryCrew.name(), "Delivery Crew");
    }
}
