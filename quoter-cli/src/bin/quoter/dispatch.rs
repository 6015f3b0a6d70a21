//! Simulation-mode `Dispatcher`: logs every outbound message as JSON to
//! stdout rather than a real venue connection. There is no fill matcher
//! here — this is strictly an observation sink for replay runs.

use quoter_core::events::OutboundMessage;
use quoter_core::Dispatcher;
use tracing::info;

#[derive(Debug, Default)]
pub struct SimulationDispatcher;

impl Dispatcher for SimulationDispatcher {
    fn send(&mut self, message: OutboundMessage) {
        match serde_json::to_string(&message) {
            Ok(line) => info!(target: "quoter::outbound", "{line}"),
            Err(err) => tracing::warn!(error = %err, "failed to serialize outbound message"),
        }
    }
}
