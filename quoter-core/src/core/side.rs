use serde::{Deserialize, Serialize};

use super::price::Dir;

/// Order side. `Undefined` shows up on the wire (e.g. a malformed venue
/// message) but never on a record the core itself constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Undefined,
    Buy,
    Sell,
}

impl Side {
    pub fn dir(self) -> Option<Dir> {
        match self {
            Side::Buy => Some(Dir::Buy),
            Side::Sell => Some(Dir::Sell),
            Side::Undefined => None,
        }
    }
}

impl From<Dir> for Side {
    fn from(dir: Dir) -> Self {
        match dir {
            Dir::Buy => Side::Buy,
            Dir::Sell => Side::Sell,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Undefined => write!(f, "undefined"),
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}
