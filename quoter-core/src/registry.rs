//! `(exchange, symbol) -> instrument_id` lookup plus the dense vector of
//! `Instrument`s it indexes.

use std::collections::HashMap;

use crate::instrument::Instrument;

/// A small dense index into the registry's instrument vector.
pub type InstrumentId = usize;

/// Reserved sentinel for "no such instrument".
pub const UNDEFINED_INSTRUMENT: InstrumentId = usize::MAX;

#[derive(Default)]
pub struct InstrumentRegistry {
    instruments: Vec<Instrument>,
    index: HashMap<(String, String), InstrumentId>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, instrument: Instrument) -> InstrumentId {
        let key = (instrument.exchange.clone(), instrument.symbol.clone());
        let id = self.instruments.len();
        self.instruments.push(instrument);
        self.index.insert(key, id);
        id
    }

    pub fn lookup(&self, exchange: &str, symbol: &str) -> Option<InstrumentId> {
        self.index
            .get(&(exchange.to_string(), symbol.to_string()))
            .copied()
    }

    pub fn get(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(id)
    }

    pub fn get_mut(&mut self, id: InstrumentId) -> Option<&mut Instrument> {
        self.instruments.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Instrument> {
        self.instruments.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_round_trips() {
        let mut registry = InstrumentRegistry::new();
        let id = registry.register(Instrument::new("binance", "BTCUSD"));
        assert_eq!(registry.lookup("binance", "BTCUSD"), Some(id));
        assert_eq!(registry.lookup("binance", "ETHUSD"), None);
        assert!(registry.get(id).is_some());
    }
}
