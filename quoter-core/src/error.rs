//! Typed errors for conditions that halt the engine: a fatal internal
//! invariant violation, or a configuration mistake. These propagate with
//! `?` up to `Strategy::execute` (or the CLI's `main`), which logs at
//! `error!` and aborts the process — they are not used as `panic!`/
//! `unwrap()` substitutes in hot-path code.

use std::fmt;

/// A condition that halts the engine: either a configuration mistake
/// caught at first use, or a venue/local state-machine invariant
/// violation.
#[derive(Debug, Clone, PartialEq)]
pub enum FatalError {
    /// `Levels::get_or_create` called before `set_tick_size`.
    MissingTickSize,
    /// A price handed to the Levels book is not finite.
    NonFinitePrice { price: f64 },
    /// A price handed to the Levels book is not a multiple of the tick size.
    PriceNotOnTick { price: f64, tick_size: f64 },
    /// Best bid >= best ask on an instrument's depth.
    CrossedBook { bid: f64, ask: f64 },
    /// An inbound `OrderUpdate` violated the lifecycle state machine's
    /// preconditions (e.g. `WORKING` on a record that is neither
    /// `PENDING_NEW` nor `PENDING_MODIFY`, or status `UNDEFINED`).
    VenueProtocolViolation(String),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::MissingTickSize => {
                write!(f, "tick size accessed before being set")
            }
            FatalError::NonFinitePrice { price } => {
                write!(f, "non-finite price: {price}")
            }
            FatalError::PriceNotOnTick { price, tick_size } => {
                write!(f, "price {price} is not a multiple of tick size {tick_size}")
            }
            FatalError::CrossedBook { bid, ask } => {
                write!(f, "crossed book detected: bid {bid} >= ask {ask}")
            }
            FatalError::VenueProtocolViolation(msg) => {
                write!(f, "venue protocol violation: {msg}")
            }
        }
    }
}

impl std::error::Error for FatalError {}

/// A configuration error caught at startup or on first use.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyExchange,
    InvalidRegex { field: &'static str, pattern: String },
    ZeroSampleFreq,
    NoEndpoints,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyExchange => write!(f, "`exchange` must not be empty"),
            ConfigError::InvalidRegex { field, pattern } => {
                write!(f, "`{field}` is not a valid regex: {pattern}")
            }
            ConfigError::ZeroSampleFreq => write!(f, "`sample_freq_secs` must be > 0"),
            ConfigError::NoEndpoints => {
                write!(f, "no sockets or replay files configured")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
