//! The opaque quote-producing capability the Strategy dispatcher ticks on
//! market-data and timer events. What prices and quantities a model actually
//! wants live is out of scope here — this crate only fixes the boundary it
//! operates across.

use tracing::info;

use crate::core::{Quote, Side};
use crate::dispatcher::Strategy;
use crate::registry::InstrumentId;

/// Implemented by whatever signal/pricing logic decides desired quotes.
/// Every method receives the `Strategy` as a capability view rather than
/// holding a back-pointer to it, which would otherwise make the Strategy
/// and its Model own each other.
pub trait Model: Send {
    /// Called after an instrument's depth changes and the instrument is
    /// market-data-ready. Implementations call `strategy.modify_orders` for
    /// whichever sides they want to update, then typically `strategy.execute`.
    fn on_quotes(&mut self, strategy: &mut Strategy, iid: InstrumentId);

    /// Called when the sample-period timer fires (`Strategy::dispatch`
    /// reschedules `next_sample` around this call).
    fn on_time(&mut self, strategy: &mut Strategy);

    /// Called after an instrument's position changes, following an
    /// `OrderUpdate` or `PositionUpdate`.
    fn on_position(&mut self, strategy: &mut Strategy, iid: InstrumentId);

    /// Clamps a batch of quotes against a per-instrument position limit:
    /// zeroes (does not reject) the quantity of any quote that would push
    /// the projected position past `limit` in absolute value, logging at
    /// info rather than rejecting. Clamps symmetrically on both sides
    /// rather than favoring one.
    fn validate(&mut self, quotes: &mut [Quote], position: f64, limit: Option<f64>) {
        let Some(limit) = limit else { return };
        for quote in quotes.iter_mut() {
            if quote.is_empty() {
                continue;
            }
            let projected = match quote.side {
                Side::Buy => position + quote.quantity,
                Side::Sell => position - quote.quantity,
                Side::Undefined => position,
            };
            if projected.abs() > limit {
                info!(
                    side = %quote.side,
                    price = quote.price,
                    quantity = quote.quantity,
                    position,
                    limit,
                    "clamping quote to zero, would exceed position limit"
                );
                quote.quantity = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;

    struct NullModel;
    impl Model for NullModel {
        fn on_quotes(&mut self, _strategy: &mut Strategy, _iid: InstrumentId) {}
        fn on_time(&mut self, _strategy: &mut Strategy) {}
        fn on_position(&mut self, _strategy: &mut Strategy, _iid: InstrumentId) {}
    }

    #[test]
    fn validate_clamps_quote_that_would_exceed_limit() {
        let mut model = NullModel;
        let mut quotes = [Quote::new(Side::Buy, 100.0, 10.0)];
        model.validate(&mut quotes, 95.0, Some(100.0));
        assert_eq!(quotes[0].quantity, 0.0);
    }

    #[test]
    fn validate_leaves_quote_within_limit_untouched() {
        let mut model = NullModel;
        let mut quotes = [Quote::new(Side::Buy, 100.0, 5.0)];
        model.validate(&mut quotes, 0.0, Some(100.0));
        assert_eq!(quotes[0].quantity, 5.0);
    }

    #[test]
    fn validate_is_a_no_op_with_no_limit_configured() {
        let mut model = NullModel;
        let mut quotes = [Quote::new(Side::Sell, 100.0, 1_000_000.0)];
        model.validate(&mut quotes, 0.0, None);
        assert_eq!(quotes[0].quantity, 1_000_000.0);
    }
}
