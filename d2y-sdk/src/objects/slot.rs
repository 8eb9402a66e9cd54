//! Delivery / pickup slot types.

use serde::{Deserialize, Serialize};

/// How the consumer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotType {
    /// Courier delivery to the order address.
    Delivery,
    /// Click and collect at the merchant.
    Cnc,
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotType::Delivery => write!(f, "DELIVERY"),
            SlotType::Cnc => write!(f, "CNC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    pub capacity: i32,
    pub remaining: i32,
}

/// The booked window as shown on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotWindowResponse {
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
}

/// Query parameters for `GET /slots`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSlotsQuery {
    pub date: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default = "default_only_available")]
    pub only_available: bool,
}

fn default_only_available() -> bool {
    true
}
