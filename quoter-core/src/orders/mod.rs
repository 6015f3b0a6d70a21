//! A single outstanding order's local state: a [`Quote`] plus a lifecycle
//! flags bitmask, and the keyed, deferred-insert store of such records
//! ([`map::LimitOrdersMap`]) that `GridOrder` reconciles against.

pub mod map;

use crate::core::bitmask::{mask_of, BitMask};
use crate::core::txid::RoutingId;
use crate::core::{PriceT, Quote, Side, VolumeT};

/// Lifecycle flags. `EMPTY` is the absence of any flag.
///
/// `PENDING_NEW` and `PENDING_MODIFY` are mutually exclusive by
/// construction (nothing ever sets both on the same record); `WORKING` may
/// legitimately coexist with `PENDING_CANCEL` while a cancel is in flight
/// against an already-acknowledged order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OrderFlag {
    Working = 1 << 0,
    PendingNew = 1 << 1,
    PendingCancel = 1 << 2,
    PendingModify = 1 << 3,
}

impl From<OrderFlag> for u32 {
    fn from(f: OrderFlag) -> u32 {
        f as u32
    }
}

pub type OrderFlags = BitMask<OrderFlag>;

/// A single outstanding order: its quote plus lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitOrder {
    pub quote: Quote,
    pub flags: OrderFlags,
    /// For a record carrying `PENDING_MODIFY`, the `routing_id` of the
    /// order it supersedes (its companion record).
    pub prev_routing_id: Option<RoutingId>,
}

impl LimitOrder {
    pub fn new(quote: Quote) -> Self {
        Self {
            quote,
            flags: OrderFlags::empty(),
            prev_routing_id: None,
        }
    }

    pub fn with_flag(mut self, flag: OrderFlag) -> Self {
        self.flags.set(flag);
        self
    }

    pub fn side(&self) -> Side {
        self.quote.side
    }

    pub fn price(&self) -> PriceT {
        self.quote.price
    }

    pub fn quantity(&self) -> VolumeT {
        self.quote.quantity
    }

    pub fn is_pending(&self) -> bool {
        self.flags
            .any(mask_of(&[OrderFlag::PendingNew, OrderFlag::PendingModify]))
    }

    pub fn is_pending_cancel(&self) -> bool {
        self.flags.test(OrderFlag::PendingCancel)
    }

    pub fn is_working(&self) -> bool {
        self.flags.test(OrderFlag::Working)
    }

    /// `true` iff no flags are set — a garbage record eligible for removal.
    pub fn is_empty(&self) -> bool {
        self.flags.bits() == 0
    }

    pub fn reset(&mut self) {
        self.quote.reset();
        self.flags.clear();
        self.prev_routing_id = None;
    }
}
