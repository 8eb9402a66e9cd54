//! Machine-readable error bodies.
//!
//! Every failed request carries an [`ErrorBody`] whose `error` field is one
//! of the stable [`ErrorCode`] strings. Clients branch on the code, never on
//! the human-readable message.

use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

/// Stable error codes returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Forbidden,
    InvalidInput,
    SlotFull,
    InvalidTransition,
    Conflict,
    InvalidRefundAmount,
    StorageTimeout,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::SlotFull => "slot_full",
            ErrorCode::InvalidTransition => "invalid_transition",
            ErrorCode::Conflict => "conflict",
            ErrorCode::InvalidRefundAmount => "invalid_refund_amount",
            ErrorCode::StorageTimeout => "storage_timeout",
            ErrorCode::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorCode,
    pub message: String,
    /// Set for `invalid_transition` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<OrderStatus>,
    /// Set for `invalid_transition` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<OrderStatus>,
}

impl ErrorBody {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            from: None,
            to: None,
        }
    }
}
