//! Inbound event kinds the core consumes and outbound messages it emits.
//! Wire format is out of scope — these are the behavioural shapes the
//! Strategy dispatcher routes and the GridOrder/Instrument state machines
//! react to.

use serde::{Deserialize, Serialize};

use crate::core::bitmask::BitMask;
use crate::core::{OrderId, OrderTxId, PriceT, Side, VolumeT};

/// A venue trading-status value for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradingStatus {
    #[default]
    Undefined,
    Open,
    Closed,
    Auction,
}

/// Capability bits advertised/consumed via `GatewayStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SupportType {
    ReferenceData = 1 << 0,
    MarketStatus = 1 << 1,
    MarketByPrice = 1 << 2,
    CreateOrder = 1 << 3,
    CancelOrder = 1 << 4,
    Order = 1 << 5,
    Position = 1 << 6,
}

impl From<SupportType> for u32 {
    fn from(s: SupportType) -> u32 {
        s as u32
    }
}

pub type SupportMask = BitMask<SupportType>;

/// Status carried by an inbound `OrderUpdate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Undefined,
    Sent,
    Accepted,
    Working,
    Completed,
    Canceled,
    Rejected,
}

/// An incremental change to one layer of an instrument's public depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthChange {
    pub layer: usize,
    pub bid_price: PriceT,
    pub bid_quantity: VolumeT,
    pub ask_price: PriceT,
    pub ask_quantity: VolumeT,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataEvent {
    pub exchange: String,
    pub symbol: String,
    pub tick_size: f64,
    pub min_trade_vol: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatusEvent {
    pub exchange: String,
    pub symbol: String,
    pub trading_status: TradingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketByPriceUpdateEvent {
    pub exchange: String,
    pub symbol: String,
    pub changes: Vec<DepthChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderAckEvent {
    pub order_id: OrderId,
    pub routing_id: u64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdateEvent {
    pub id: OrderTxId,
    pub status: OrderStatus,
    pub side: Side,
    pub remaining_quantity: VolumeT,
    pub traded_quantity: VolumeT,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdateEvent {
    pub account: String,
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadBeginEvent {
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadEndEvent {
    pub account: Option<String>,
    pub max_order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GatewayStatusEvent {
    pub account: Option<String>,
    pub available: u32,
    pub unavailable: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub now_secs: f64,
}

/// Every inbound event kind the core consumes. Variants carrying
/// `(exchange, symbol)` are routed to a single Instrument; the rest are
/// broadcast to all instruments (see `dispatcher::Strategy::dispatch`).
/// `#[serde(tag = "kind")]` gives the replay harness's event log a readable
/// JSON-lines shape: `{"kind": "MarketByPriceUpdate", "exchange": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    Connected,
    Disconnected,
    DownloadBegin(DownloadBeginEvent),
    DownloadEnd(DownloadEndEvent),
    GatewayStatus(GatewayStatusEvent),
    ReferenceData(ReferenceDataEvent),
    MarketStatus(MarketStatusEvent),
    MarketByPriceUpdate(MarketByPriceUpdateEvent),
    OrderAck(OrderAckEvent),
    OrderUpdate(OrderUpdateEvent),
    TradeUpdate,
    FundsUpdate,
    PositionUpdate(PositionUpdateEvent),
    Timer(TimerEvent),
}

impl Event {
    /// The `(exchange, symbol)` this event targets, if any. Events without
    /// one are broadcast to every instrument.
    pub fn symbol_key(&self) -> Option<(&str, &str)> {
        match self {
            Event::ReferenceData(e) => Some((e.exchange.as_str(), e.symbol.as_str())),
            Event::MarketStatus(e) => Some((e.exchange.as_str(), e.symbol.as_str())),
            Event::MarketByPriceUpdate(e) => Some((e.exchange.as_str(), e.symbol.as_str())),
            Event::PositionUpdate(e) => Some((e.exchange.as_str(), e.symbol.as_str())),
            _ => None,
        }
    }
}

pub const ORDER_TYPE_LIMIT: &str = "LIMIT";
pub const TIME_IN_FORCE_GTC: &str = "GTC";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrder {
    pub account: String,
    pub order_id: OrderId,
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: VolumeT,
    pub order_type: &'static str,
    pub price: PriceT,
    pub time_in_force: &'static str,
    pub routing_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifyOrder {
    pub account: String,
    pub order_id: OrderId,
    pub quantity: VolumeT,
    pub price: PriceT,
    pub routing_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelOrder {
    pub account: String,
    pub order_id: OrderId,
}

/// Outbound venue message, as translated by the Strategy dispatcher from a
/// `LimitOrdersMap` transaction. `Serialize`-only: nothing in this crate
/// deserializes an outbound message back in, this just lets a `Dispatcher`
/// log or replay-record it as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum OutboundMessage {
    Create(CreateOrder),
    Modify(ModifyOrder),
    Cancel(CancelOrder),
}
