use std::fmt;

use d2y_sdk::objects::ErrorCode;
use thiserror::Error;

use crate::access::AccessDenied;
use crate::entities::OrderStatus;
use crate::store::{DuplicateKey, StoreError};

/// What a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Order,
    Merchant,
    Slot,
    Product,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Order => "order",
            Resource::Merchant => "merchant",
            Resource::Slot => "slot",
            Resource::Product => "product",
        })
    }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("forbidden")]
    Forbidden,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("slot is full")]
    SlotFull,
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("invalid refund amount")]
    InvalidRefundAmount,
    #[error("storage timed out")]
    StorageTimeout,
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

impl OrderError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::NotFound(_) => ErrorCode::NotFound,
            OrderError::Forbidden => ErrorCode::Forbidden,
            OrderError::InvalidInput(_) => ErrorCode::InvalidInput,
            OrderError::SlotFull => ErrorCode::SlotFull,
            OrderError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            OrderError::Conflict(_) => ErrorCode::Conflict,
            OrderError::InvalidRefundAmount => ErrorCode::InvalidRefundAmount,
            OrderError::StorageTimeout => ErrorCode::StorageTimeout,
            OrderError::Storage(_) => ErrorCode::Internal,
        }
    }
}

impl From<AccessDenied> for OrderError {
    fn from(_: AccessDenied) -> Self {
        OrderError::Forbidden
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => OrderError::StorageTimeout,
            StoreError::Duplicate(DuplicateKey::Refund) => {
                OrderError::Conflict("order already refunded")
            }
            StoreError::Duplicate(DuplicateKey::OrderCode) => {
                OrderError::Conflict("order code already in use")
            }
            other => OrderError::Storage(other),
        }
    }
}
