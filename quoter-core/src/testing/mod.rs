//! Test doubles for `Dispatcher` and `Model`, gated behind the `testing`
//! feature so the replay binary and integration tests can depend on them
//! without shipping them in the default build.

pub mod fixtures;

pub use fixtures::{NullDispatcher, RecordingDispatcher, StaticSpreadModel};
