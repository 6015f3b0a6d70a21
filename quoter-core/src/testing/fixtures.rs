use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::core::{price::is_undefined_price, Quote, Side};
use crate::dispatcher::{Dispatcher, Strategy};
use crate::events::OutboundMessage;
use crate::model::Model;
use crate::registry::InstrumentId;

/// Discards every outbound message, logging it at debug. Useful for replay
/// runs where there is nowhere real to send orders.
#[derive(Debug, Default)]
pub struct NullDispatcher;

impl Dispatcher for NullDispatcher {
    fn send(&mut self, message: OutboundMessage) {
        debug!(?message, "null dispatcher discarding outbound message");
    }
}

/// Captures every outbound message behind a shared handle, for assertions
/// in tests that construct a `Strategy` and drive it through `dispatch`.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone-able handle to the captured messages, taken before the
    /// dispatcher is moved into a `Strategy`.
    pub fn handle(&self) -> Arc<Mutex<Vec<OutboundMessage>>> {
        self.sent.clone()
    }

    pub fn drain(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.sent.lock().unwrap())
    }
}

impl Dispatcher for RecordingDispatcher {
    fn send(&mut self, message: OutboundMessage) {
        self.sent.lock().unwrap().push(message);
    }
}

/// A fixed-spread-around-mid model: quotes a single rung on each side,
/// `spread_ticks` away from the best opposite price, `quantity` deep.
/// Exists for the replay demo binary and integration tests — it is
/// deliberately the simplest possible model, not a pricing strategy this
/// crate claims to recommend.
#[derive(Debug, Clone, Copy)]
pub struct StaticSpreadModel {
    pub spread_ticks: f64,
    pub tick_size: f64,
    pub quantity: f64,
}

impl StaticSpreadModel {
    pub fn new(spread_ticks: f64, tick_size: f64, quantity: f64) -> Self {
        Self {
            spread_ticks,
            tick_size,
            quantity,
        }
    }
}

impl Model for StaticSpreadModel {
    fn on_quotes(&mut self, strategy: &mut Strategy, iid: InstrumentId) {
        let Some(instrument) = strategy.instrument(iid) else {
            return;
        };
        let top = &instrument.depth[0];
        if is_undefined_price(top.bid_price) || is_undefined_price(top.ask_price) {
            return;
        }
        let mid = (top.bid_price + top.ask_price) / 2.0;
        let offset = self.spread_ticks * self.tick_size;
        let position = instrument.position;
        let limit = strategy.position_limit();

        let mut buy_quotes = [Quote::new(Side::Buy, mid - offset, self.quantity)];
        let mut sell_quotes = [Quote::new(Side::Sell, mid + offset, self.quantity)];
        self.validate(&mut buy_quotes, position, limit);
        self.validate(&mut sell_quotes, position, limit);

        let _ = strategy.modify_orders(iid, Side::Buy, &buy_quotes);
        let _ = strategy.modify_orders(iid, Side::Sell, &sell_quotes);
        let _ = strategy.execute(iid);
    }

    fn on_time(&mut self, strategy: &mut Strategy) {
        for iid in 0..strategy.registry().len() {
            self.on_quotes(strategy, iid);
        }
    }

    fn on_position(&mut self, _strategy: &mut Strategy, _iid: InstrumentId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{
        DepthChange, GatewayStatusEvent, MarketByPriceUpdateEvent, MarketStatusEvent,
        ReferenceDataEvent, SupportType, TradingStatus,
    };
    use crate::instrument::Instrument;

    fn ready_instrument() -> Instrument {
        let mut instrument = Instrument::new("X", "S");
        instrument.on_connected();
        instrument.on_reference_data(&ReferenceDataEvent {
            exchange: "X".into(),
            symbol: "S".into(),
            tick_size: 1.0,
            min_trade_vol: 1.0,
            multiplier: 1.0,
        });
        instrument.on_market_status(&MarketStatusEvent {
            exchange: "X".into(),
            symbol: "S".into(),
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
    fn static_spread_model_quotes_around_mid() {
        let dispatcher = RecordingDispatcher::new();
        let handle = dispatcher.handle();
        let model = Box::new(StaticSpreadModel::new(1.0, 1.0, 5.0));
        let mut strategy = Strategy::new(model, Box::new(dispatcher), "acct", 1.0, true, None);
        let iid = strategy.register_instrument(ready_instrument());

        strategy
            .dispatch(crate::events::Event::MarketByPriceUpdate(
                MarketByPriceUpdateEvent {
                    exchange: "X".into(),
                    symbol: "S".into(),
                    changes: vec![DepthChange {
                        layer: 0,
                        bid_price: 99.0,
                        bid_quantity: 10.0,
                        ask_price: 101.0,
                        ask_quantity: 10.0,
                    }],
                },
            ))
            .unwrap();

        assert_eq!(handle.lock().unwrap().len(), 2);
        let buy_price = strategy
            .instrument(iid)
            .unwrap()
            .buy_order
            .levels()
            .top_price()
            .unwrap();
        assert_eq!(buy_price, 99.0);
    }
}
