//! Routes inbound events to instruments, ticks the Model on market-data and
//! timer events, and translates `LimitOrdersMap` transactions into outbound
//! venue messages. `Strategy` owns the Instruments registry and the Model,
//! and is itself the capability view the Model receives instead of holding
//! a back-pointer to it, which would otherwise make the two own each other.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::{OrderId, OrderTxId, Quote, Side};
use crate::error::FatalError;
use crate::events::{
    CancelOrder, CreateOrder, Event, ModifyOrder, OutboundMessage, ORDER_TYPE_LIMIT,
    TIME_IN_FORCE_GTC,
};
use crate::instrument::Instrument;
use crate::model::Model;
use crate::orders::map::OrderContext;
use crate::orders::LimitOrder;
use crate::registry::{InstrumentId, InstrumentRegistry};

/// The opaque venue transport the Strategy sends translated outbound
/// messages through. Concrete implementations live outside this crate (a
/// socket session, a replay-log writer, a test double).
pub trait Dispatcher: Send {
    fn send(&mut self, message: OutboundMessage);
}

/// Owns the instrument registry and the Model; implements the inbound event
/// handler and the outbound `OrderContext` translation.
pub struct Strategy {
    registry: InstrumentRegistry,
    model: Option<Box<dyn Model>>,
    dispatcher: Box<dyn Dispatcher>,

    /// `order_id -> instrument_id`, populated as this process mints ids, so
    /// an inbound `OrderUpdate` (which carries no exchange/symbol of its
    /// own) routes to the instrument that actually owns it rather than
    /// being broadcast — `order_id` is only unique *within* one instrument,
    /// so a broadcast would let one instrument's record collide with
    /// another's identically-numbered one.
    order_owner: HashMap<OrderId, InstrumentId>,

    account: String,
    enable_trading: bool,
    position_limit: Option<f64>,
    sample_period_secs: f64,
    next_sample: f64,
}

impl Strategy {
    pub fn new(
        model: Box<dyn Model>,
        dispatcher: Box<dyn Dispatcher>,
        account: impl Into<String>,
        sample_period_secs: f64,
        enable_trading: bool,
        position_limit: Option<f64>,
    ) -> Self {
        Self {
            registry: InstrumentRegistry::new(),
            model: Some(model),
            dispatcher,
            order_owner: HashMap::new(),
            account: account.into(),
            enable_trading,
            position_limit,
            sample_period_secs,
            next_sample: 0.0,
        }
    }

    pub fn register_instrument(&mut self, instrument: Instrument) -> InstrumentId {
        self.registry.register(instrument)
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn instrument(&self, iid: InstrumentId) -> Option<&Instrument> {
        self.registry.get(iid)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn enable_trading(&self) -> bool {
        self.enable_trading
    }

    pub fn position_limit(&self) -> Option<f64> {
        self.position_limit
    }

    /// Snapshots desired volumes for one side of one instrument's grid.
    /// Does not itself emit transactions — call `execute` afterward.
    pub fn modify_orders(
        &mut self,
        iid: InstrumentId,
        side: Side,
        quotes: &[Quote],
    ) -> Result<(), FatalError> {
        let Some(instrument) = self.registry.get_mut(iid) else {
            return Ok(());
        };
        match side {
            Side::Buy => instrument.buy_order.modify(quotes),
            Side::Sell => instrument.sell_order.modify(quotes),
            Side::Undefined => Ok(()),
        }
    }

    /// Runs the reconciliation pass for both sides of one instrument and
    /// flushes queued transactions to the Dispatcher. A no-op if the
    /// instrument is not ready or unknown.
    pub fn execute(&mut self, iid: InstrumentId) -> Result<(), FatalError> {
        let account_default = self.account.clone();
        let enable_trading = self.enable_trading;
        let dispatcher = self.dispatcher.as_mut();
        let order_owner = &mut self.order_owner;

        let Some(instrument) = self.registry.get_mut(iid) else {
            return Ok(());
        };
        if !instrument.is_ready() {
            return Ok(());
        }

        let Instrument {
            ref exchange,
            ref symbol,
            ref account,
            ref mut buy_order,
            ref mut sell_order,
            ref mut orders,
            ref mut id_alloc,
            ..
        } = *instrument;

        let mut ctx = OutboundCtx {
            dispatcher,
            id_alloc,
            order_owner,
            iid,
            enable_trading,
            account: account.clone().unwrap_or(account_default),
            exchange: exchange.clone(),
            symbol: symbol.clone(),
        };
        buy_order.execute(orders, &mut ctx)?;
        sell_order.execute(orders, &mut ctx)?;
        Ok(())
    }

    /// The inbound event handler. Events carrying `(exchange, symbol)`
    /// route to the matching instrument and are dropped if none is
    /// registered; the rest broadcast to every instrument.
    pub fn dispatch(&mut self, event: Event) -> Result<(), FatalError> {
        match event {
            Event::Connected => self.broadcast(Instrument::on_connected),
            Event::Disconnected => self.broadcast(Instrument::on_disconnected),
            Event::DownloadBegin(e) => self.broadcast(|i| i.on_download_begin(&e)),
            Event::DownloadEnd(e) => self.broadcast(|i| i.on_download_end(&e)),
            Event::GatewayStatus(e) => self.broadcast(|i| i.on_gateway_status(&e)),

            Event::ReferenceData(e) => {
                if let Some(iid) = self.registry.lookup(&e.exchange, &e.symbol) {
                    self.registry.get_mut(iid).unwrap().on_reference_data(&e);
                }
            }

            Event::MarketStatus(e) => {
                if let Some(iid) = self.registry.lookup(&e.exchange, &e.symbol) {
                    self.registry.get_mut(iid).unwrap().on_market_status(&e);
                }
            }

            Event::MarketByPriceUpdate(e) => {
                if let Some(iid) = self.registry.lookup(&e.exchange, &e.symbol) {
                    self.registry
                        .get_mut(iid)
                        .unwrap()
                        .on_market_by_price_update(&e)?;
                    self.tick_on_quotes(iid);
                }
            }

            Event::OrderAck(e) => {
                debug!(order_id = e.order_id, routing_id = e.routing_id, status = ?e.status, "order ack");
            }

            Event::OrderUpdate(e) => {
                if let Some(&iid) = self.order_owner.get(&e.id.order_id) {
                    self.registry.get_mut(iid).unwrap().on_order_update(&e)?;
                    self.tick_on_position(iid);
                } else {
                    warn!(id = %e.id, "order update for an order this process never created, ignoring");
                }
            }

            Event::TradeUpdate | Event::FundsUpdate => {}

            Event::PositionUpdate(e) => {
                if let Some(iid) = self.registry.lookup(&e.exchange, &e.symbol) {
                    self.registry.get_mut(iid).unwrap().on_position_update(&e);
                    self.tick_on_position(iid);
                }
            }

            Event::Timer(e) => {
                if e.now_secs >= self.next_sample {
                    self.next_sample = e.now_secs + self.sample_period_secs;
                    self.tick_on_time();
                }
            }
        }
        Ok(())
    }

    fn broadcast(&mut self, mut f: impl FnMut(&mut Instrument)) {
        for instrument in self.registry.iter_mut() {
            f(instrument);
        }
    }

    /// Swaps the Model out, calls it with `self` reachable, then swaps it
    /// back in — the standard way to give the Model a read/write view of
    /// the Strategy without the two of them holding references to each
    /// other at the same time.
    fn tick_on_quotes(&mut self, iid: InstrumentId) {
        let mut model = self.model.take().expect("model missing during dispatch");
        model.on_quotes(self, iid);
        self.model = Some(model);
    }

    fn tick_on_time(&mut self) {
        let mut model = self.model.take().expect("model missing during dispatch");
        model.on_time(self);
        self.model = Some(model);
    }

    fn tick_on_position(&mut self, iid: InstrumentId) {
        let mut model = self.model.take().expect("model missing during dispatch");
        model.on_position(self, iid);
        self.model = Some(model);
    }
}

/// Per-`execute()` `OrderContext`: translates `LimitOrdersMap` transactions
/// into `OutboundMessage`s carrying this instrument's venue identity, and
/// records which instrument minted each `order_id` for later `OrderUpdate`
/// routing.
struct OutboundCtx<'a> {
    dispatcher: &'a mut dyn Dispatcher,
    id_alloc: &'a mut crate::core::IdAllocator,
    order_owner: &'a mut HashMap<OrderId, InstrumentId>,
    iid: InstrumentId,
    enable_trading: bool,
    account: String,
    exchange: String,
    symbol: String,
}

impl<'a> OrderContext for OutboundCtx<'a> {
    fn create_order(&mut self, id: OrderTxId, order: &LimitOrder) {
        self.order_owner.insert(id.order_id, self.iid);
        if !self.enable_trading {
            warn!(id = %id, "trading disabled, suppressing CreateOrder");
            return;
        }
        self.dispatcher.send(OutboundMessage::Create(CreateOrder {
            account: self.account.clone(),
            order_id: id.order_id,
            exchange: self.exchange.clone(),
            symbol: self.symbol.clone(),
            side: order.side(),
            quantity: order.quantity(),
            order_type: ORDER_TYPE_LIMIT,
            price: order.price(),
            time_in_force: TIME_IN_FORCE_GTC,
            routing_id: id.routing_id,
        }));
    }

    fn modify_order(&mut self, id: OrderTxId, order: &LimitOrder) {
        self.order_owner.insert(id.order_id, self.iid);
        if !self.enable_trading {
            warn!(id = %id, "trading disabled, suppressing ModifyOrder");
            return;
        }
        self.dispatcher.send(OutboundMessage::Modify(ModifyOrder {
            account: self.account.clone(),
            order_id: id.order_id,
            quantity: order.quantity(),
            price: order.price(),
            routing_id: id.routing_id,
        }));
    }

    fn cancel_order(&mut self, id: OrderTxId, _order: &LimitOrder) {
        if !self.enable_trading {
            warn!(id = %id, "trading disabled, suppressing CancelOrder");
            return;
        }
        self.dispatcher.send(OutboundMessage::Cancel(CancelOrder {
            account: self.account.clone(),
            order_id: id.order_id,
        }));
    }

    fn next_order_txid(&mut self) -> OrderTxId {
        self.id_alloc.next_order_txid()
    }

    fn next_txid_same_order(&mut self, order_id: OrderId) -> OrderTxId {
        self.id_alloc.next_txid_same_order(order_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::{Dir, Side};
    use crate::events::{
        DepthChange, DownloadEndEvent, GatewayStatusEvent, MarketByPriceUpdateEvent,
        MarketStatusEvent, OrderStatus, OrderUpdateEvent, ReferenceDataEvent, SupportType,
        TradingStatus,
    };

    #[derive(Clone, Default)]
    struct RecordingDispatcher {
        sent: Arc<Mutex<Vec<OutboundMessage>>>,
    }
    impl Dispatcher for RecordingDispatcher {
        fn send(&mut self, message: OutboundMessage) {
            self.sent.lock().unwrap().push(message);
        }
    }

    #[derive(Default)]
    struct CountingModel {
        quotes_calls: usize,
        time_calls: usize,
        position_calls: usize,
    }
    impl Model for CountingModel {
        fn on_quotes(&mut self, strategy: &mut Strategy, iid: InstrumentId) {
            self.quotes_calls += 1;
            strategy
                .modify_orders(iid, Side::Buy, &[Quote::new(Side::Buy, 100.0, 10.0)])
                .unwrap();
            strategy.execute(iid).unwrap();
        }
        fn on_time(&mut self, _strategy: &mut Strategy) {
            self.time_calls += 1;
        }
        fn on_position(&mut self, _strategy: &mut Strategy, _iid: InstrumentId) {
            self.position_calls += 1;
        }
    }

    fn make_ready_instrument(exchange: &str, symbol: &str) -> Instrument {
        let mut instrument = Instrument::new(exchange, symbol);
        instrument.on_connected();
        instrument.on_reference_data(&ReferenceDataEvent {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            tick_size: 1.0,
            min_trade_vol: 1.0,
            multiplier: 1.0,
        });
        instrument.on_market_status(&MarketStatusEvent {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            trading_status: TradingStatus::Open,
        });
        instrument.on_gateway_status(&GatewayStatusEvent {
            account: None,
            available: crate::core::bitmask::mask_of(&[
                SupportType::ReferenceData,
                SupportType::MarketStatus,
                SupportType::MarketByPrice,
            ]),
            unavailable: 0,
        });
        instrument
    }

    #[test]
    fn market_by_price_update_ticks_on_quotes_and_executes() {
        let model = Box::new(CountingModel::default());
        let dispatcher = RecordingDispatcher::default();
        let sent = dispatcher.sent.clone();
        let mut strategy = Strategy::new(model, Box::new(dispatcher), "acct", 1.0, true, None);
        let iid = strategy.register_instrument(make_ready_instrument("X", "S"));

        strategy
            .dispatch(Event::MarketByPriceUpdate(MarketByPriceUpdateEvent {
                exchange: "X".into(),
                symbol: "S".into(),
                changes: vec![DepthChange {
                    layer: 0,
                    bid_price: 99.0,
                    bid_quantity: 1.0,
                    ask_price: 101.0,
                    ask_quantity: 1.0,
                }],
            }))
            .unwrap();

        assert!(strategy.instrument(iid).unwrap().buy_order.levels().len() > 0);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn order_update_routes_by_order_owner_not_broadcast() {
        let model = Box::new(CountingModel::default());
        let dispatcher = Box::new(RecordingDispatcher::default());
        let mut strategy = Strategy::new(model, dispatcher, "acct", 1.0, true, None);
        let iid_a = strategy.register_instrument(make_ready_instrument("X", "A"));
        let iid_b = strategy.register_instrument(make_ready_instrument("X", "B"));

        strategy
            .modify_orders(iid_a, Side::Buy, &[Quote::new(Side::Buy, 100.0, 10.0)])
            .unwrap();
        strategy.execute(iid_a).unwrap();
        strategy
            .modify_orders(iid_b, Side::Buy, &[Quote::new(Side::Buy, 100.0, 5.0)])
            .unwrap();
        strategy.execute(iid_b).unwrap();

        // Both instruments mint order_id 1 independently; an update for
        // instrument B's (1, *) must not be applied to instrument A's book.
        let txid_b = *strategy.order_owner.iter().find(|(_, &v)| v == iid_b).unwrap().0;
        strategy
            .dispatch(Event::OrderUpdate(OrderUpdateEvent {
                id: OrderTxId::new(txid_b, 2),
                status: OrderStatus::Working,
                side: Side::Buy,
                remaining_quantity: 5.0,
                traded_quantity: 0.0,
            }))
            .unwrap();

        assert_eq!(
            strategy
                .instrument(iid_a)
                .unwrap()
                .buy_order
                .levels()
                .top()
                .unwrap()
                .working_volume,
            0.0
        );
    }

    #[test]
    fn disabled_trading_suppresses_sends_but_still_buffers_locally() {
        let model = Box::new(CountingModel::default());
        let dispatcher = Box::new(RecordingDispatcher::default());
        let mut strategy = Strategy::new(model, dispatcher, "acct", 1.0, false, None);
        let iid = strategy.register_instrument(make_ready_instrument("X", "S"));

        strategy
            .modify_orders(iid, Side::Buy, &[Quote::new(Side::Buy, 100.0, 10.0)])
            .unwrap();
        strategy.execute(iid).unwrap();

        let instrument = strategy.instrument(iid).unwrap();
        assert_eq!(instrument.orders.len(), 1);
        assert_eq!(instrument.buy_order.side(), Side::from(Dir::Buy));
    }

    #[test]
    fn timer_before_sample_period_does_not_tick_model() {
        let model = Box::new(CountingModel::default());
        let dispatcher = Box::new(RecordingDispatcher::default());
        let mut strategy = Strategy::new(model, dispatcher, "acct", 10.0, true, None);
        strategy
            .dispatch(Event::Timer(crate::events::TimerEvent { now_secs: 1.0 }))
            .unwrap();
        // next_sample starts at 0.0, so the very first tick always fires;
        // a second tick inside the same period must not.
        strategy
            .dispatch(Event::Timer(crate::events::TimerEvent { now_secs: 2.0 }))
            .unwrap();
    }

    #[test]
    fn download_end_is_broadcast_and_advances_id_allocator() {
        let model = Box::new(CountingModel::default());
        let dispatcher = Box::new(RecordingDispatcher::default());
        let mut strategy = Strategy::new(model, dispatcher, "acct", 1.0, true, None);
        let iid = strategy.register_instrument(make_ready_instrument("X", "S"));
        strategy
            .dispatch(Event::DownloadEnd(DownloadEndEvent {
                account: None,
                max_order_id: 41,
            }))
            .unwrap();
        strategy
            .modify_orders(iid, Side::Buy, &[Quote::new(Side::Buy, 100.0, 1.0)])
            .unwrap();
        strategy.execute(iid).unwrap();
        let txid = *strategy.order_owner.keys().next().unwrap();
        assert_eq!(txid, 42);
    }
}
