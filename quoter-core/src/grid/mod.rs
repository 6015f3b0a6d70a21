//! The reconciliation engine: diffs desired vs. expected volume across a
//! side's `Levels` book and emits the minimum create/modify/cancel
//! transactions needed to converge, via a shared `LimitOrdersMap`.

use tracing::warn;

use crate::core::price::{compare, gt, lt};
use crate::core::{Dir, OrderTxId, Quote, Side};
use crate::error::FatalError;
use crate::events::{OrderStatus, OrderUpdateEvent};
use crate::levels::Levels;
use crate::orders::map::{LimitOrdersMap, OrderContext};
use crate::orders::{LimitOrder, OrderFlag};

/// Per-side reconciler. Owns its `Levels` book; the order map is shared
/// with the opposite side's `GridOrder` and passed in by reference to every
/// operation.
#[derive(Debug)]
pub struct GridOrder {
    dir: Dir,
    side: Side,
    levels: Levels,
}

impl GridOrder {
    pub fn new(dir: Dir) -> Self {
        Self {
            dir,
            side: Side::from(dir),
            levels: Levels::new(dir),
        }
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn set_tick_size(&mut self, tick_size: f64) {
        self.levels.set_tick_size(tick_size);
    }

    /// Snapshots desired volumes: zeroes every existing level, then sets
    /// `desired_volume` for each quote on this side. A level the caller
    /// stops mentioning is implicitly retracted.
    pub fn modify(&mut self, quotes: &[Quote]) -> Result<(), FatalError> {
        self.levels.retract_all();
        for q in quotes {
            if q.is_empty() {
                continue;
            }
            let level = self.levels.get_or_create(q.price)?;
            level.desired_volume = q.quantity;
        }
        Ok(())
    }

    /// Wipes every level's counters entirely (not just `desired_volume`)
    /// and drops empty levels. Used for a full instrument reset on
    /// disconnect, where outstanding orders are not expected to resolve
    /// normally — a stronger reset than `reset()`.
    pub fn hard_reset(&mut self) {
        for level in self.levels.iter_mut() {
            level.reset();
        }
        self.levels.shrink();
    }

    /// Forces every level's `desired_volume` to zero without touching the
    /// in-flight counters; outstanding orders drain on the next `execute`.
    pub fn reset(&mut self) {
        self.levels.retract_all();
    }

    /// Runs the two-pass diff, then flushes queued creates/modifies.
    /// Cancels are emitted inline during pass 1.
    pub fn execute<C: OrderContext>(
        &mut self,
        orders: &mut LimitOrdersMap,
        ctx: &mut C,
    ) -> Result<(), FatalError> {
        self.pass1_excess_and_relocate(orders, ctx)?;
        self.pass2_fill_shortages(orders, ctx)?;
        orders.flush_orders(ctx);
        Ok(())
    }

    fn pass1_excess_and_relocate<C: OrderContext>(
        &mut self,
        orders: &mut LimitOrdersMap,
        ctx: &mut C,
    ) -> Result<(), FatalError> {
        // Snapshot the txids for this side up front: `execute` must not act
        // twice on a record created by its own relocation/create passes,
        // and the map is shared with the opposite side's GridOrder.
        let txids: Vec<OrderTxId> = orders
            .iter()
            .filter(|(_, o)| o.side() == self.side)
            .map(|(id, _)| *id)
            .collect();

        for txid in txids {
            let Some(order) = orders.get(&txid).copied() else {
                continue;
            };
            if order.is_pending() {
                continue;
            }
            let price = order.price();
            let qty = order.quantity();
            let expected = self.levels.get_or_create(price)?.expected_volume();
            let desired = self.levels.get_or_create(price)?.desired_volume;

            if !gt(expected, desired) {
                continue;
            }

            let dest_price = self.levels.find_top(|l| {
                compare(l.expected_volume() + qty, l.desired_volume) != std::cmp::Ordering::Greater
            });

            match dest_price {
                Some(dest_price) => {
                    self.levels.get_or_create(price)?.canceling_volume += qty;
                    self.levels.get_or_create(dest_price)?.pending_volume += qty;
                    let new_order = LimitOrder::new(Quote::new(order.side(), dest_price, qty));
                    orders.modify_order(txid, new_order);
                }
                None => {
                    self.levels.get_or_create(price)?.canceling_volume += qty;
                    orders.cancel_order(txid, ctx);
                }
            }
        }
        Ok(())
    }

    fn pass2_fill_shortages<C: OrderContext>(
        &mut self,
        orders: &mut LimitOrdersMap,
        ctx: &mut C,
    ) -> Result<(), FatalError> {
        let side = self.side;
        for level in self.levels.iter_mut() {
            let expected = level.expected_volume();
            if lt(expected, level.desired_volume) {
                let qty = level.desired_volume - expected;
                level.pending_volume += qty;
                let txid = ctx.next_order_txid();
                let new_order = LimitOrder::new(Quote::new(side, level.price, qty));
                orders.create_order(txid, new_order);
            }
        }
        Ok(())
    }

    /// Reacts to an asynchronous venue lifecycle event for one of our
    /// orders, walking the WORKING/CANCELED/REJECTED/COMPLETED transition
    /// table against the record's current flags.
    pub fn order_updated(
        &mut self,
        orders: &mut LimitOrdersMap,
        update: &OrderUpdateEvent,
    ) -> Result<(), FatalError> {
        let Some(order) = orders.get(&update.id).copied() else {
            warn!(id = %update.id, "order update for unknown OrderTxId, ignoring");
            return Ok(());
        };

        match update.status {
            OrderStatus::Working => self.on_working(orders, update, order)?,
            OrderStatus::Canceled => self.on_canceled(orders, update, order)?,
            OrderStatus::Rejected => self.on_rejected(orders, update, order)?,
            OrderStatus::Completed => self.on_completed(orders, update, order)?,
            OrderStatus::Sent | OrderStatus::Accepted => {
                if !order.is_pending() {
                    return Err(FatalError::VenueProtocolViolation(format!(
                        "{:?} on non-pending order {}",
                        update.status, update.id
                    )));
                }
            }
            OrderStatus::Undefined => {
                return Err(FatalError::VenueProtocolViolation(format!(
                    "UNDEFINED order status for {}",
                    update.id
                )));
            }
        }
        Ok(())
    }

    fn on_working(
        &mut self,
        orders: &mut LimitOrdersMap,
        update: &OrderUpdateEvent,
        order: LimitOrder,
    ) -> Result<(), FatalError> {
        if order.flags.test(OrderFlag::PendingModify) {
            if let Some(prev_routing_id) = order.prev_routing_id {
                let companion_id = OrderTxId::new(update.id.order_id, prev_routing_id);
                if let Some(companion) = orders.get(&companion_id).copied() {
                    if companion.is_working() && companion.is_pending_cancel() {
                        let price = companion.price();
                        let qty = companion.quantity();
                        let level = self.levels.get_or_create(price)?;
                        level.canceling_volume -= qty;
                        level.working_volume -= qty;
                        orders.remove(&companion_id);
                        self.levels.shrink();
                    }
                }
            }
            let level = self.levels.get_or_create(order.price())?;
            level.pending_volume -= update.remaining_quantity;
            level.working_volume += update.remaining_quantity;
            let rec = orders.get_mut(&update.id).unwrap();
            rec.flags.reset(OrderFlag::PendingModify);
            rec.flags.set(OrderFlag::Working);
        } else if order.flags.test(OrderFlag::PendingNew) {
            let level = self.levels.get_or_create(order.price())?;
            level.pending_volume -= update.remaining_quantity;
            level.working_volume += update.remaining_quantity;
            let rec = orders.get_mut(&update.id).unwrap();
            rec.flags.reset(OrderFlag::PendingNew);
            rec.flags.set(OrderFlag::Working);
        }
        // A duplicate WORKING while already WORKING is a no-op: idempotence
        // of the state transition.
        Ok(())
    }

    fn on_canceled(
        &mut self,
        orders: &mut LimitOrdersMap,
        update: &OrderUpdateEvent,
        order: LimitOrder,
    ) -> Result<(), FatalError> {
        if !order.is_pending_cancel() {
            // A second CANCELED on an already-gone record is dropped.
            return Ok(());
        }
        let level = self.levels.get_or_create(order.price())?;
        level.canceling_volume -= order.quantity();
        level.working_volume -= update.remaining_quantity;
        orders.remove(&update.id);
        self.levels.shrink();
        Ok(())
    }

    fn on_rejected(
        &mut self,
        orders: &mut LimitOrdersMap,
        update: &OrderUpdateEvent,
        order: LimitOrder,
    ) -> Result<(), FatalError> {
        let level = self.levels.get_or_create(order.price())?;
        if order.is_pending_cancel() {
            level.canceling_volume -= order.quantity();
        }
        if order.flags.test(OrderFlag::PendingModify) || order.flags.test(OrderFlag::PendingNew) {
            level.pending_volume -= order.quantity();
        }
        orders.remove(&update.id);
        self.levels.shrink();
        Ok(())
    }

    fn on_completed(
        &mut self,
        orders: &mut LimitOrdersMap,
        update: &OrderUpdateEvent,
        order: LimitOrder,
    ) -> Result<(), FatalError> {
        if !order.is_working() {
            return Ok(());
        }
        let level = self.levels.get_or_create(order.price())?;
        level.working_volume -= update.remaining_quantity;
        orders.remove(&update.id);
        self.levels.shrink();
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use approx::abs_diff_eq;
    use proptest::prelude::*;

    use super::tests::MockCtx;
    use super::*;

    fn quotes_strategy() -> impl Strategy<Value = Vec<(i32, f64)>> {
        prop::collection::vec((-20i32..20, 1.0..50.0), 0..8)
    }

    proptest! {
        /// After any single `modify` + `execute` pass from a fresh grid,
        /// every level satisfies the non-negativity and
        /// `canceling <= working + pending` invariant —
        /// trivially true before any acks land (working/canceling are
        /// still zero), but this also exercises that `execute` never
        /// drives a counter negative while only issuing creates.
        #[test]
        fn fresh_grid_execute_keeps_counters_sane(levels in quotes_strategy()) {
            let mut grid = GridOrder::new(Dir::Buy);
            grid.set_tick_size(1.0);
            let mut orders = LimitOrdersMap::new();
            let mut ctx = MockCtx::default();

            let quotes: Vec<Quote> = levels
                .into_iter()
                .map(|(price, qty)| Quote::new(Side::Buy, price as f64, qty))
                .collect();
            grid.modify(&quotes).unwrap();
            grid.execute(&mut orders, &mut ctx).unwrap();

            for level in grid.levels().iter() {
                prop_assert!(level.working_volume >= -1e-9);
                prop_assert!(level.pending_volume >= -1e-9);
                prop_assert!(level.canceling_volume >= -1e-9);
                prop_assert!(level.canceling_volume <= level.working_volume + level.pending_volume + 1e-9);
            }

            let pending_sum: f64 = orders
                .iter()
                .filter(|(_, o)| o.is_pending())
                .map(|(_, o)| o.quantity())
                .sum();
            let level_pending_sum: f64 = grid.levels().iter().map(|l| l.pending_volume).sum();
            prop_assert!(abs_diff_eq!(pending_sum, level_pending_sum, epsilon = 1e-6));
        }

        /// Acking every pending creation as WORKING drives each level's
        /// `working_volume` to exactly its `desired_volume`, with zero
        /// pending/canceling left over — idempotence of reconciliation at
        /// quiescence.
        #[test]
        fn acking_all_creates_reaches_quiescence(levels in quotes_strategy()) {
            let mut grid = GridOrder::new(Dir::Buy);
            grid.set_tick_size(1.0);
            let mut orders = LimitOrdersMap::new();
            let mut ctx = MockCtx::default();

            let quotes: Vec<Quote> = levels
                .into_iter()
                .map(|(price, qty)| Quote::new(Side::Buy, price as f64, qty))
                .collect();
            grid.modify(&quotes).unwrap();
            grid.execute(&mut orders, &mut ctx).unwrap();

            let created: Vec<(OrderTxId, f64)> = ctx
                .creates
                .iter()
                .map(|(id, o)| (*id, o.quantity()))
                .collect();
            for (id, qty) in created {
                let update = OrderUpdateEvent {
                    id,
                    status: OrderStatus::Working,
                    side: Side::Buy,
                    remaining_quantity: qty,
                    traded_quantity: 0.0,
                };
                grid.order_updated(&mut orders, &update).unwrap();
            }

            for level in grid.levels().iter() {
                prop_assert!(abs_diff_eq!(level.working_volume, level.desired_volume, epsilon = 1e-6));
                prop_assert!(abs_diff_eq!(level.pending_volume, 0.0, epsilon = 1e-9));
                prop_assert!(abs_diff_eq!(level.canceling_volume, 0.0, epsilon = 1e-9));
            }
        }
    }
}
