//! Capacity Ledger.
//!
//! Slot capacity only ever goes down. There is no release
//! primitive: units consumed by an order stay consumed after cancel or
//! refund.

use crate::entities::slot::Slot;
use crate::lifecycle::{OrderError, Resource};
use crate::store::StoreTransaction;

/// Outcome of a conditional decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotReservation {
    /// One unit taken; carries the slot as it is after the decrement.
    Reserved(Slot),
    Full,
    NotFound,
}

/// Reserve one unit of `slot_id` inside `tx`.
///
/// A full slot is reported as is and never retried.
pub async fn reserve(tx: &mut dyn StoreTransaction, slot_id: &str) -> Result<Slot, OrderError> {
    match tx.reserve_slot(slot_id).await? {
        SlotReservation::Reserved(slot) => {
            tracing::debug!(slot_id, remaining = slot.remaining, "slot unit reserved");
            Ok(slot)
        }
        SlotReservation::Full => Err(OrderError::SlotFull),
        SlotReservation::NotFound => Err(OrderError::NotFound(Resource::Slot)),
    }
}
