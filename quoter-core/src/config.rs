//! Runtime configuration for the quoting engine binary: the `(exchange,
//! symbol, account)` scope it trades, its sample period, and whether
//! trading is actually enabled. Loaded from a TOML file with `serde`.

use std::path::Path;

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_sample_freq_secs() -> u64 {
    1
}

/// Runtime surface: venue scope, trading gate, and the sockets or
/// replay files the binary reads events from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub exchange: String,

    /// A regex pattern; an instrument is in scope iff its symbol matches.
    #[serde(default = "default_symbol_pattern")]
    pub symbol: String,

    #[serde(default)]
    pub account: String,

    /// A regex pattern over currency/quote-asset names, for venues that
    /// report them (unused by the core itself, carried through for the
    /// model/dispatcher to consult).
    #[serde(default = "default_currencies_pattern")]
    pub currencies: String,

    #[serde(default = "default_sample_freq_secs")]
    pub sample_freq_secs: u64,

    /// Trading is opt-in: absent or `false` means every outbound send is
    /// suppressed and logged instead.
    #[serde(default)]
    pub enable_trading: bool,

    #[serde(default)]
    pub simulation: bool,

    /// UNIX-domain socket paths (live mode) or event-log file paths
    /// (simulation mode), depending on `simulation`.
    #[serde(default)]
    pub endpoints: Vec<String>,
}

fn default_symbol_pattern() -> String {
    ".*".to_string()
}

fn default_currencies_pattern() -> String {
    ".*".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exchange: String::new(),
            symbol: default_symbol_pattern(),
            account: String::new(),
            currencies: default_currencies_pattern(),
            sample_freq_secs: default_sample_freq_secs(),
            enable_trading: false,
            simulation: true,
            endpoints: Vec::new(),
        }
    }
}

impl Config {
    /// Reads a TOML file from disk and deserializes it. I/O-boundary
    /// failures (missing file, malformed TOML) are `anyhow` errors; the
    /// result is not validated here, callers should call `validate()`.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Compiles `symbol` as a regex, for filtering which instruments this
    /// process scopes itself to.
    pub fn symbol_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.symbol).map_err(|_| ConfigError::InvalidRegex {
            field: "symbol",
            pattern: self.symbol.clone(),
        })
    }

    /// Compiles `currencies` as a regex.
    pub fn currencies_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.currencies).map_err(|_| ConfigError::InvalidRegex {
            field: "currencies",
            pattern: self.currencies.clone(),
        })
    }

    /// Structural checks only — this is the typed, library-internal tier
    /// of error handling; I/O-boundary failures belong to `load`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange.is_empty() {
            return Err(ConfigError::EmptyExchange);
        }
        self.symbol_regex()?;
        self.currencies_regex()?;
        if self.sample_freq_secs == 0 {
            return Err(ConfigError::ZeroSampleFreq);
        }
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            exchange: "binance".to_string(),
            symbol: "^BTC.*".to_string(),
            account: "acct-1".to_string(),
            currencies: "USD|USDT".to_string(),
            sample_freq_secs: 1,
            enable_trading: false,
            simulation: true,
            endpoints: vec!["replay.jsonl".to_string()],
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_exchange_is_rejected() {
        let mut config = valid_config();
        config.exchange.clear();
        assert_eq!(config.validate().unwrap_err(), ConfigError::EmptyExchange);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let mut config = valid_config();
        config.symbol = "(unclosed".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidRegex { field: "symbol", .. }
        ));
    }

    #[test]
    fn zero_sample_freq_is_rejected() {
        let mut config = valid_config();
        config.sample_freq_secs = 0;
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroSampleFreq);
    }

    #[test]
    fn no_endpoints_is_rejected() {
        let mut config = valid_config();
        config.endpoints.clear();
        assert_eq!(config.validate().unwrap_err(), ConfigError::NoEndpoints);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = valid_config();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
