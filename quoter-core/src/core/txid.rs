/// A per-instrument monotonic id identifying an order's *lineage*: a modify
/// keeps the same `order_id` as the order it supersedes.
pub type OrderId = u64;

/// A monotonic id uniquely labelling a single transaction against the venue.
/// Every create and every modify is issued a fresh `routing_id`.
pub type RoutingId = u64;

/// `(order_id, routing_id)` pair identifying one venue transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OrderTxId {
    pub order_id: OrderId,
    pub routing_id: RoutingId,
}

impl OrderTxId {
    pub fn new(order_id: OrderId, routing_id: RoutingId) -> Self {
        Self {
            order_id,
            routing_id,
        }
    }
}

impl std::fmt::Display for OrderTxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.order_id, self.routing_id)
    }
}

/// Allocates fresh `OrderTxId`s for one instrument.
///
/// `next_order_txid()` mints a brand-new lineage (fresh `order_id` and
/// `routing_id`); `next_txid_same_order(order_id)` mints a fresh `routing_id`
/// against an existing lineage, used when modifying an order.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next_order_id: OrderId,
    next_routing_id: RoutingId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_order_id: 1,
            next_routing_id: 1,
        }
    }

    pub fn next_order_txid(&mut self) -> OrderTxId {
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        let routing_id = self.next_routing_id;
        self.next_routing_id += 1;
        OrderTxId::new(order_id, routing_id)
    }

    pub fn next_txid_same_order(&mut self, order_id: OrderId) -> OrderTxId {
        let routing_id = self.next_routing_id;
        self.next_routing_id += 1;
        OrderTxId::new(order_id, routing_id)
    }

    /// Advances the `order_id` counter past `max_order_id`, so ids minted
    /// after a venue replay never collide with downloaded history. A no-op
    /// if the counter is already past `max_order_id`.
    pub fn advance_past(&mut self, max_order_id: OrderId) {
        if self.next_order_id <= max_order_id {
            self.next_order_id = max_order_id + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lineage_advances_both_counters() {
        let mut alloc = IdAllocator::new();
        let a = alloc.next_order_txid();
        let b = alloc.next_order_txid();
        assert_ne!(a.order_id, b.order_id);
        assert_ne!(a.routing_id, b.routing_id);
    }

    #[test]
    fn same_order_advances_only_routing_id() {
        let mut alloc = IdAllocator::new();
        let a = alloc.next_order_txid();
        let b = alloc.next_txid_same_order(a.order_id);
        assert_eq!(a.order_id, b.order_id);
        assert_ne!(a.routing_id, b.routing_id);
    }

    #[test]
    fn advance_past_skips_downloaded_history() {
        let mut alloc = IdAllocator::new();
        alloc.advance_past(100);
        let txid = alloc.next_order_txid();
        assert_eq!(txid.order_id, 101);
        // Does not move the counter backward.
        alloc.advance_past(50);
        let txid2 = alloc.next_order_txid();
        assert_eq!(txid2.order_id, 102);
    }
}
