//! Connection/download/reference-data/market-status readiness gate for one
//! (exchange, symbol[, account]), plus the two per-side `GridOrder`s and
//! the shared order map it owns.

pub mod depth;

use tracing::{info, warn};

use crate::core::bitmask::{mask_of, BitMask};
use crate::core::{Dir, IdAllocator, Side};
use crate::error::FatalError;
use crate::events::{
    DownloadBeginEvent, DownloadEndEvent, GatewayStatusEvent, MarketByPriceUpdateEvent,
    MarketStatusEvent, OrderUpdateEvent, PositionUpdateEvent, ReferenceDataEvent, SupportType,
    TradingStatus,
};
use crate::grid::GridOrder;
use crate::orders::map::LimitOrdersMap;

pub use depth::{Depth, DepthBuilder, Layer, SimpleDepthBuilder};

/// Readiness bitmask flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum InstrumentFlag {
    Connected = 1 << 0,
    Downloading = 1 << 1,
    Realtime = 1 << 2,
    MarketData = 1 << 3,
    Trading = 1 << 4,
    Ready = 1 << 5,
}

impl From<InstrumentFlag> for u32 {
    fn from(f: InstrumentFlag) -> u32 {
        f as u32
    }
}

pub type InstrumentFlags = BitMask<InstrumentFlag>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceData {
    pub tick_size: f64,
    pub min_trade_vol: f64,
    pub multiplier: f64,
}

impl ReferenceData {
    pub fn is_ready(&self) -> bool {
        self.tick_size > 0.0 && self.min_trade_vol > 0.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Status {
    pub trading_status: TradingStatus,
}

impl Status {
    pub fn is_ready(&self) -> bool {
        self.trading_status == TradingStatus::Open
    }

    pub fn is_trading_open(&self) -> bool {
        self.trading_status == TradingStatus::Open
    }

    pub fn is_auction(&self) -> bool {
        self.trading_status == TradingStatus::Auction
    }

    pub fn is_trading_closed(&self) -> bool {
        self.trading_status == TradingStatus::Closed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

const MARKETDATA_REQUIRED: &[SupportType] = &[
    SupportType::ReferenceData,
    SupportType::MarketStatus,
    SupportType::MarketByPrice,
];
const TRADING_REQUIRED: &[SupportType] = &[
    SupportType::CreateOrder,
    SupportType::CancelOrder,
    SupportType::Order,
    SupportType::Position,
];

/// Identified by (exchange, symbol, optional account); owns its Depth,
/// ReferenceData, Status, Position, the two per-side GridOrders, and the
/// order map they share.
pub struct Instrument {
    pub exchange: String,
    pub symbol: String,
    pub account: Option<String>,

    pub depth: Depth,
    pub refdata: ReferenceData,
    pub status: Status,
    pub position: f64,
    pub flags: InstrumentFlags,

    pub buy_order: GridOrder,
    pub sell_order: GridOrder,
    pub orders: LimitOrdersMap,
    pub id_alloc: IdAllocator,

    depth_builder: Box<dyn DepthBuilder + Send>,
}

impl Instrument {
    pub fn new(exchange: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
            account: None,
            depth: Depth::default(),
            refdata: ReferenceData::default(),
            status: Status::default(),
            position: 0.0,
            flags: InstrumentFlags::empty(),
            buy_order: GridOrder::new(Dir::Buy),
            sell_order: GridOrder::new(Dir::Sell),
            orders: LimitOrdersMap::new(),
            id_alloc: IdAllocator::new(),
            depth_builder: Box::new(SimpleDepthBuilder),
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn is_ready(&self) -> bool {
        self.flags.test(InstrumentFlag::Ready)
    }

    pub fn set_tick_size(&mut self, tick_size: f64) {
        self.buy_order.set_tick_size(tick_size);
        self.sell_order.set_tick_size(tick_size);
    }

    fn account_matches(&self, event_account: &Option<String>) -> bool {
        match (&self.account, event_account) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn account_is_empty(event_account: &Option<String>) -> bool {
        matches!(event_account, None) || matches!(event_account, Some(s) if s.is_empty())
    }

    pub fn on_connected(&mut self) {
        self.flags.set(InstrumentFlag::Connected);
        self.check_ready();
    }

    /// Full local-state wipe: clears readiness flags, reference data,
    /// status, depth, position, and both grids down to empty levels. Order
    /// records are reset to `EMPTY` in place rather than removed.
    pub fn on_disconnected(&mut self) {
        self.flags.reset(InstrumentFlag::Connected);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.flags.clear();
        self.refdata.reset();
        self.status.reset();
        self.depth_builder.reset(&mut self.depth);
        self.position = 0.0;
        self.buy_order.hard_reset();
        self.sell_order.hard_reset();
        self.orders.reset_all();
    }

    pub fn on_download_begin(&mut self, event: &DownloadBeginEvent) {
        if !Self::account_is_empty(&event.account) {
            return;
        }
        self.flags.set(InstrumentFlag::Downloading);
        self.flags.reset(InstrumentFlag::Realtime);
        self.check_ready();
    }

    pub fn on_download_end(&mut self, event: &DownloadEndEvent) {
        if !Self::account_is_empty(&event.account) {
            return;
        }
        self.flags.reset(InstrumentFlag::Downloading);
        self.flags.set(InstrumentFlag::Realtime);
        self.id_alloc.advance_past(event.max_order_id);
        self.check_ready();
    }

    pub fn on_gateway_status(&mut self, event: &GatewayStatusEvent) {
        let available = BitMask::<SupportType>::from_bits(event.available);
        let unavailable = BitMask::<SupportType>::from_bits(event.unavailable);

        if Self::account_is_empty(&event.account) {
            let required = mask_of(MARKETDATA_REQUIRED);
            let ready = available.all(required) && unavailable.none(required);
            self.flags.set_to(InstrumentFlag::MarketData, ready);
        } else if self.account_matches(&event.account) {
            let required = mask_of(TRADING_REQUIRED);
            let ready = available.all(required) && unavailable.none(required);
            self.flags.set_to(InstrumentFlag::Trading, ready);
        }
        self.check_ready();
    }

    pub fn on_reference_data(&mut self, event: &ReferenceDataEvent) {
        self.refdata.tick_size = event.tick_size;
        self.refdata.min_trade_vol = event.min_trade_vol;
        self.refdata.multiplier = event.multiplier;
        if self.refdata.is_ready() {
            self.set_tick_size(self.refdata.tick_size);
        }
        self.check_ready();
    }

    pub fn on_market_status(&mut self, event: &MarketStatusEvent) {
        self.status.trading_status = event.trading_status;
        self.check_ready();
    }

    pub fn on_market_by_price_update(
        &mut self,
        event: &MarketByPriceUpdateEvent,
    ) -> Result<(), FatalError> {
        self.depth_builder.apply(&mut self.depth, &event.changes);
        if let Some((bid, ask)) = depth::is_crossed(&self.depth) {
            return Err(FatalError::CrossedBook { bid, ask });
        }
        Ok(())
    }

    pub fn on_order_update(&mut self, event: &OrderUpdateEvent) -> Result<(), FatalError> {
        match event.side {
            Side::Buy => self.buy_order.order_updated(&mut self.orders, event),
            Side::Sell => self.sell_order.order_updated(&mut self.orders, event),
            Side::Undefined => {
                warn!(id = %event.id, "order update with undefined side, ignoring");
                Ok(())
            }
        }
    }

    /// During `REALTIME` the engine trusts its own fill-derived accounting;
    /// `PositionUpdate` only overrides `position` while `DOWNLOADING`, since
    /// the venue's position feed can lag or gap live.
    pub fn on_position_update(&mut self, event: &PositionUpdateEvent) {
        if self.flags.test(InstrumentFlag::Downloading) {
            self.position = event.position;
        } else {
            tracing::debug!(
                exchange = %self.exchange,
                symbol = %self.symbol,
                "ignoring live PositionUpdate, trusting internal accounting"
            );
        }
    }

    fn check_ready(&mut self) {
        let ready = self.flags.test(InstrumentFlag::Connected)
            && !self.flags.test(InstrumentFlag::Downloading)
            && self.refdata.is_ready()
            && self.status.is_ready()
            && self.flags.test(InstrumentFlag::MarketData);
        let was_ready = self.flags.test(InstrumentFlag::Ready);
        self.flags.set_to(InstrumentFlag::Ready, ready);
        if ready && !was_ready {
            info!(exchange = %self.exchange, symbol = %self.symbol, "instrument became ready");
        } else if !ready && was_ready {
            info!(exchange = %self.exchange, symbol = %self.symbol, "instrument no longer ready");
        }
    }
}
