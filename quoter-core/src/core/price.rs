//! Price/volume numeric domain: `f64` with a `NaN`-as-undefined sentinel and
//! epsilon-aware comparisons, plus the per-side `Dir` used to generically
//! parametrize "top"/"bottom" across the book.

/// Tolerance used for all price/volume equality and ordering comparisons.
/// Prices and volumes accumulate floating-point noise on the order of
/// 1e-12 through arithmetic (tick multiplication, repeated increments of
/// level counters); this sits comfortably above that noise floor while
/// staying far below any real tick size or order quantity.
pub const EPS: f64 = 1e-9;

/// Price, in venue-native units. `NaN` means "undefined".
pub type PriceT = f64;

/// Volume/quantity, always conceptually non-negative. `NaN` means "undefined".
pub type VolumeT = f64;

/// The undefined-price sentinel.
pub const UNDEFINED_PRICE: PriceT = f64::NAN;

pub fn is_undefined_price(price: PriceT) -> bool {
    price.is_nan()
}

/// Epsilon-aware comparison, returning an `Ordering`-like tri-state via `f64`.
/// Mirrors the source's `utils::compare`: values within `EPS` of each other
/// compare equal regardless of magnitude.
pub fn compare(a: f64, b: f64) -> std::cmp::Ordering {
    let diff = a - b;
    if diff.abs() < EPS {
        std::cmp::Ordering::Equal
    } else if diff < 0.0 {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Greater
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    compare(a, b) == std::cmp::Ordering::Equal
}

pub fn approx_zero(a: f64) -> bool {
    approx_eq(a, 0.0)
}

/// `true` iff `a` is strictly greater than `b`, outside epsilon.
pub fn gt(a: f64, b: f64) -> bool {
    compare(a, b) == std::cmp::Ordering::Greater
}

pub fn lt(a: f64, b: f64) -> bool {
    compare(a, b) == std::cmp::Ordering::Less
}

/// Signed direction derived from `Side`: Buy -> +1, Sell -> -1.
///
/// Used to generically express "top" (most competitive) and "bottom" (least
/// competitive) price comparisons without duplicating the `Levels`/`GridOrder`
/// logic per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Buy,
    Sell,
}

impl Dir {
    pub fn sign(self) -> f64 {
        match self {
            Dir::Buy => 1.0,
            Dir::Sell => -1.0,
        }
    }

    /// `true` iff `a` is more competitive than `b` for this direction
    /// (higher for Buy, lower for Sell).
    pub fn better(self, a: PriceT, b: PriceT) -> bool {
        match self {
            Dir::Buy => gt(a, b),
            Dir::Sell => lt(a, b),
        }
    }

    /// Round `price` down toward the "bottom" of this direction to the
    /// nearest multiple of `tick_size`, guaranteeing the contiguous-grid
    /// invariant Levels relies on.
    pub fn round_toward_bottom(self, price: PriceT, tick_size: f64) -> PriceT {
        let units = price / tick_size;
        let rounded = match self {
            Dir::Buy => units.floor(),
            Dir::Sell => units.ceil(),
        };
        rounded * tick_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_price_is_nan() {
        assert!(is_undefined_price(UNDEFINED_PRICE));
        assert!(!is_undefined_price(100.0));
    }

    #[test]
    fn epsilon_compare_treats_near_equal_as_equal() {
        assert!(approx_eq(100.0, 100.0 + EPS / 10.0));
        assert!(gt(100.0, 99.0));
        assert!(lt(99.0, 100.0));
    }

    #[test]
    fn round_toward_bottom_buy_floors() {
        assert_eq!(Dir::Buy.round_toward_bottom(100.7, 1.0), 100.0);
    }

    #[test]
    fn round_toward_bottom_sell_ceils() {
        assert_eq!(Dir::Sell.round_toward_bottom(100.3, 1.0), 101.0);
    }

    #[test]
    fn better_reflects_competitiveness() {
        assert!(Dir::Buy.better(101.0, 100.0));
        assert!(Dir::Sell.better(99.0, 100.0));
    }
}
