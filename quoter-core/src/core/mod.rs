//! Core numeric and identity types shared by every other module: the
//! price/volume domain, side/direction, quotes, transaction ids, and the
//! generic bitmask wrapper used for both order and instrument flags.

pub mod bitmask;
pub mod price;
pub mod quote;
pub mod side;
pub mod txid;

pub use bitmask::BitMask;
pub use price::{compare, Dir, PriceT, VolumeT, EPS};
pub use quote::Quote;
pub use side::Side;
pub use txid::{IdAllocator, OrderId, OrderTxId, RoutingId};
