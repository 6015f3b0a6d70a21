use super::price::{approx_zero, is_undefined_price, PriceT, VolumeT};
use super::side::Side;

/// A desired `(side, price, quantity)` triple, as produced by the model or
/// carried by a `LimitOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quote {
    pub side: Side,
    pub price: PriceT,
    pub quantity: VolumeT,
}

impl Quote {
    pub fn new(side: Side, price: PriceT, quantity: VolumeT) -> Self {
        Self {
            side,
            price,
            quantity,
        }
    }

    /// A quote is empty iff its price is undefined or its quantity is <= 0.
    pub fn is_empty(&self) -> bool {
        is_undefined_price(self.price) || self.quantity <= 0.0 || approx_zero(self.quantity)
    }

    pub fn reset(&mut self) {
        *self = Quote::default();
        self.price = super::price::UNDEFINED_PRICE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_on_undefined_price_or_nonpositive_qty() {
        assert!(Quote::new(Side::Buy, f64::NAN, 10.0).is_empty());
        assert!(Quote::new(Side::Buy, 100.0, 0.0).is_empty());
        assert!(Quote::new(Side::Buy, 100.0, -1.0).is_empty());
        assert!(!Quote::new(Side::Buy, 100.0, 10.0).is_empty());
    }
}
