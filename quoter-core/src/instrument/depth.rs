//! Public order book depth: up to 3 layers, and the pluggable component
//! that applies incremental `MarketByPriceUpdate` changes to it.

use crate::core::price::{is_undefined_price, UNDEFINED_PRICE};
use crate::core::{PriceT, VolumeT};
use crate::events::DepthChange;

pub const DEPTH_LAYERS: usize = 3;

/// One rung of the venue's public book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub bid_price: PriceT,
    pub bid_quantity: VolumeT,
    pub ask_price: PriceT,
    pub ask_quantity: VolumeT,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            bid_price: UNDEFINED_PRICE,
            bid_quantity: 0.0,
            ask_price: UNDEFINED_PRICE,
            ask_quantity: 0.0,
        }
    }
}

pub type Depth = [Layer; DEPTH_LAYERS];

/// `true` iff `depth`'s best layer has a defined bid at or above a defined
/// ask — a crossed or locked book.
pub fn is_crossed(depth: &Depth) -> Option<(PriceT, PriceT)> {
    let top = &depth[0];
    if is_undefined_price(top.bid_price) || is_undefined_price(top.ask_price) {
        return None;
    }
    if top.bid_price >= top.ask_price {
        Some((top.bid_price, top.ask_price))
    } else {
        None
    }
}

/// Applies incremental depth changes to an instrument's book. Left as a
/// swappable trait so a venue adapter can supply its own merge strategy;
/// this crate ships one straightforward implementation that overwrites
/// the addressed layer wholesale, which is sufficient for the event kinds
/// this core consumes.
pub trait DepthBuilder {
    fn apply(&mut self, depth: &mut Depth, changes: &[DepthChange]);
    fn reset(&mut self, depth: &mut Depth) {
        *depth = Depth::default();
    }
}

#[derive(Debug, Default)]
pub struct SimpleDepthBuilder;

impl DepthBuilder for SimpleDepthBuilder {
    fn apply(&mut self, depth: &mut Depth, changes: &[DepthChange]) {
        for change in changes {
            if let Some(layer) = depth.get_mut(change.layer) {
                layer.bid_price = change.bid_price;
                layer.bid_quantity = change.bid_quantity;
                layer.ask_price = change.ask_price;
                layer.ask_quantity = change.ask_quantity;
            }
        }
    }
}
