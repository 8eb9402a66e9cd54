//! Caller identity as supplied by the upstream authentication layer.

use async_trait::async_trait;
use d2y_sdk::objects::{CallerInfo, Role as SdkRole};

/// Staff roles with unrestricted rights over every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaffRole {
    Admin,
    Support,
}

/// Closed set of caller roles.
///
/// Merchant staff always carry the merchant they work for, so "merchant
/// without affiliation" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Consumer,
    Merchant(String),
    AdminLike(StaffRole),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn consumer(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Consumer,
        }
    }

    pub fn merchant(user_id: impl Into<String>, merchant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Merchant(merchant_id.into()),
        }
    }

    pub fn staff(user_id: impl Into<String>, role: StaffRole) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::AdminLike(role),
        }
    }

    pub fn is_admin_like(&self) -> bool {
        matches!(self.role, Role::AdminLike(_))
    }

    pub fn merchant_id(&self) -> Option<&str> {
        match &self.role {
            Role::Merchant(id) => Some(id),
            _ => None,
        }
    }

    pub fn info(&self) -> CallerInfo {
        let role = match &self.role {
            Role::Consumer => SdkRole::Consumer,
            Role::Merchant(_) => SdkRole::Merchant,
            Role::AdminLike(StaffRole::Admin) => SdkRole::Admin,
            Role::AdminLike(StaffRole::Support) => SdkRole::Support,
        };
        CallerInfo {
            user_id: self.user_id.clone(),
            role,
            merchant_id: self.merchant_id().map(str::to_owned),
        }
    }
}

/// Maps an opaque credential to a caller.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns `None` when the credential is unknown.
    async fn resolve(&self, credential: &str) -> Option<Caller>;
}
