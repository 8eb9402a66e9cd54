use d2y_sdk::objects::{SlotResponse, SlotWindowResponse};

use crate::entities::SlotType;

/// A bookable delivery / pickup window.
///
/// `remaining` is only ever decremented, through
/// [`StoreTransaction::reserve_slot`](crate::store::StoreTransaction::reserve_slot).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Slot {
    pub id: String,
    pub date: time::Date,
    pub slot_type: SlotType,
    pub start_time: time::Time,
    pub end_time: time::Time,
    pub capacity: i32,
    pub remaining: i32,
}

impl Slot {
    pub fn is_available(&self) -> bool {
        self.remaining > 0
    }

    pub fn window(&self) -> SlotWindow {
        SlotWindow {
            date: self.date,
            slot_type: self.slot_type,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// When and how an order is handed over; the part of a slot an order shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub date: time::Date,
    pub slot_type: SlotType,
    pub start_time: time::Time,
    pub end_time: time::Time,
}

/// Filter for listing the slots of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    pub date: time::Date,
    pub slot_type: SlotType,
    pub only_available: bool,
}

fn hh_mm(t: time::Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

impl From<&Slot> for SlotResponse {
    fn from(slot: &Slot) -> Self {
        SlotResponse {
            id: slot.id.clone(),
            date: slot.date.to_string(),
            slot_type: slot.slot_type.into(),
            start_time: hh_mm(slot.start_time),
            end_time: hh_mm(slot.end_time),
            capacity: slot.capacity,
            remaining: slot.remaining,
        }
    }
}

impl From<&SlotWindow> for SlotWindowResponse {
    fn from(window: &SlotWindow) -> Self {
        SlotWindowResponse {
            date: window.date.to_string(),
            slot_type: window.slot_type.into(),
            start_time: hh_mm(window.start_time),
            end_time: hh_mm(window.end_time),
        }
    }
}
