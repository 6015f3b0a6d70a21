//! `OrderTxId -> LimitOrder` store with a FIFO pending-insert buffer, so
//! `GridOrder::execute` can schedule new creates/modifies while scanning the
//! map without invalidating its own traversal.

use std::collections::{HashMap, VecDeque};

use super::{LimitOrder, OrderFlag};
use crate::core::{OrderId, OrderTxId};

/// Venue I/O and id-allocation capability supplied to the order map by
/// whatever owns it (the Strategy dispatcher, in production; a mock in
/// tests).
pub trait OrderContext {
    fn create_order(&mut self, id: OrderTxId, order: &LimitOrder);
    fn modify_order(&mut self, id: OrderTxId, order: &LimitOrder);
    fn cancel_order(&mut self, id: OrderTxId, order: &LimitOrder);
    fn next_order_txid(&mut self) -> OrderTxId;
    fn next_txid_same_order(&mut self, order_id: OrderId) -> OrderTxId;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingKind {
    Create,
    Modify,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    id: OrderTxId,
    order: LimitOrder,
    kind: PendingKind,
}

/// Keyed store of order records, with deferred insertion for anything
/// authored mid-scan.
#[derive(Debug, Default)]
pub struct LimitOrdersMap {
    orders: HashMap<OrderTxId, LimitOrder>,
    pending: VecDeque<PendingEntry>,
}

impl LimitOrdersMap {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn get(&self, id: &OrderTxId) -> Option<&LimitOrder> {
        self.orders.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OrderTxId, &LimitOrder)> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Authors a create: buffers it as `PENDING_NEW`. Not sent until
    /// `flush_orders`.
    pub fn create_order(&mut self, id: OrderTxId, order: LimitOrder) {
        let order = order.with_flag(OrderFlag::PendingNew);
        self.pending.push_back(PendingEntry {
            id,
            order,
            kind: PendingKind::Create,
        });
    }

    /// Authors a modify: buffers it as `PENDING_MODIFY`. Not sent until
    /// `flush_orders`.
    pub fn modify_order(&mut self, id: OrderTxId, new_order: LimitOrder) {
        let order = new_order.with_flag(OrderFlag::PendingModify);
        self.pending.push_back(PendingEntry {
            id,
            order,
            kind: PendingKind::Modify,
        });
    }

    /// Marks the existing record `PENDING_CANCEL` and emits the cancel
    /// immediately — cancels are not buffered.
    pub fn cancel_order<C: OrderContext>(&mut self, id: OrderTxId, ctx: &mut C) {
        if let Some(order) = self.orders.get_mut(&id) {
            order.flags.set(OrderFlag::PendingCancel);
            ctx.cancel_order(id, order);
        }
    }

    /// Drains the pending buffer in FIFO order, turning each authored
    /// create/modify into an actual map insert plus outbound send.
    pub fn flush_orders<C: OrderContext>(&mut self, ctx: &mut C) {
        while let Some(entry) = self.pending.pop_front() {
            match entry.kind {
                PendingKind::Create => self.do_create(entry.id, entry.order, ctx),
                PendingKind::Modify => self.do_modify(entry.id, entry.order, ctx),
            }
        }
    }

    fn do_create<C: OrderContext>(&mut self, id: OrderTxId, order: LimitOrder, ctx: &mut C) {
        self.orders.insert(id, order);
        let inserted = &self.orders[&id];
        ctx.create_order(id, inserted);
    }

    fn do_modify<C: OrderContext>(&mut self, id: OrderTxId, new_order: LimitOrder, ctx: &mut C) {
        if let Some(existing) = self.orders.get_mut(&id) {
            existing.flags.set(OrderFlag::PendingCancel);
        }
        let new_id = ctx.next_txid_same_order(id.order_id);
        let mut new_record = new_order;
        new_record.prev_routing_id = Some(id.routing_id);
        self.orders.insert(new_id, new_record);
        let inserted = &self.orders[&new_id];
        ctx.modify_order(new_id, inserted);
    }

    /// Removes a record outright (used by the lifecycle state machine on
    /// terminal transitions: `CANCELED`, `REJECTED`, `COMPLETED`, and
    /// companion cleanup after a `PENDING_MODIFY` lands).
    pub fn remove(&mut self, id: &OrderTxId) -> Option<LimitOrder> {
        self.orders.remove(id)
    }

    pub fn get_mut(&mut self, id: &OrderTxId) -> Option<&mut LimitOrder> {
        self.orders.get_mut(id)
    }

    /// Full wipe on disconnect: every record is reset to `EMPTY` in place
    /// (rather than removed) and any unflushed buffered entries are
    /// dropped, since the venue session they targeted is gone.
    pub fn reset_all(&mut self) {
        for order in self.orders.values_mut() {
            order.reset();
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dir, OrderTxId, Quote, Side};

    #[derive(Default)]
    struct MockCtx {
        creates: Vec<OrderTxId>,
        modifies: Vec<OrderTxId>,
        cancels: Vec<OrderTxId>,
        next_order_id: OrderId,
        next_routing_id: u64,
    }

    impl OrderContext for MockCtx {
        fn create_order(&mut self, id: OrderTxId, _order: &LimitOrder) {
            self.creates.push(id);
        }
        fn modify_order(&mut self, id: OrderTxId, _order: &LimitOrder) {
            self.modifies.push(id);
        }
        fn cancel_order(&mut self, id: OrderTxId, _order: &LimitOrder) {
            self.cancels.push(id);
        }
        fn next_order_txid(&mut self) -> OrderTxId {
            self.next_order_id += 1;
            self.next_routing_id += 1;
            OrderTxId::new(self.next_order_id, self.next_routing_id)
        }
        fn next_txid_same_order(&mut self, order_id: OrderId) -> OrderTxId {
            self.next_routing_id += 1;
            OrderTxId::new(order_id, self.next_routing_id)
        }
    }

    fn quote(price: f64, qty: f64) -> Quote {
        Quote::new(Side::Buy, price, qty)
    }

    #[test]
    fn create_is_buffered_until_flush() {
        let mut map = LimitOrdersMap::new();
        let mut ctx = MockCtx::default();
        let id = OrderTxId::new(1, 1);
        map.create_order(id, LimitOrder::new(quote(100.0, 10.0)));
        assert!(map.get(&id).is_none());
        assert!(ctx.creates.is_empty());
        map.flush_orders(&mut ctx);
        assert_eq!(ctx.creates, vec![id]);
        assert!(map.get(&id).unwrap().flags.test(OrderFlag::PendingNew));
    }

    #[test]
    fn modify_flags_old_record_pending_cancel_and_pairs_new_one() {
        let mut map = LimitOrdersMap::new();
        let mut ctx = MockCtx::default();
        let old_id = OrderTxId::new(1, 1);
        map.create_order(old_id, LimitOrder::new(quote(100.0, 10.0)));
        map.flush_orders(&mut ctx);
        map.get_mut(&old_id).unwrap().flags.set(OrderFlag::Working);
        map.get_mut(&old_id)
            .unwrap()
            .flags
            .reset(OrderFlag::PendingNew);

        map.modify_order(old_id, LimitOrder::new(quote(99.0, 10.0)));
        map.flush_orders(&mut ctx);

        let old = map.get(&old_id).unwrap();
        assert!(old.is_working());
        assert!(old.is_pending_cancel());

        assert_eq!(ctx.modifies.len(), 1);
        let new_id = ctx.modifies[0];
        let new_record = map.get(&new_id).unwrap();
        assert!(new_record.flags.test(OrderFlag::PendingModify));
        assert_eq!(new_record.prev_routing_id, Some(old_id.routing_id));
    }

    #[test]
    fn cancel_is_immediate_not_buffered() {
        let mut map = LimitOrdersMap::new();
        let mut ctx = MockCtx::default();
        let id = OrderTxId::new(1, 1);
        map.create_order(id, LimitOrder::new(quote(100.0, 10.0)));
        map.flush_orders(&mut ctx);
        map.cancel_order(id, &mut ctx);
        assert_eq!(ctx.cancels, vec![id]);
        assert!(map.get(&id).unwrap().is_pending_cancel());
    }

    #[test]
    fn fifo_order_preserved_across_mixed_entries() {
        let mut map = LimitOrdersMap::new();
        let mut ctx = MockCtx::default();
        let a = OrderTxId::new(1, 1);
        let b = OrderTxId::new(2, 2);
        map.create_order(a, LimitOrder::new(quote(100.0, 10.0)));
        map.create_order(b, LimitOrder::new(quote(99.0, 5.0)));
        map.flush_orders(&mut ctx);
        assert_eq!(ctx.creates, vec![a, b]);
    }
}
