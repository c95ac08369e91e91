// src/stats/mod.rs - PV/UV visit analytics
//
// Flow: service -> cache -> aggregator -> event log store. Read-path
// failures never surface to the client; they degrade to empty results.

pub mod aggregate;
pub mod cache;
pub mod event_log;
pub mod render;
pub mod service;

pub use aggregate::{AggregateResult, View};
pub use cache::StatsCache;
pub use event_log::ReadEvent;
pub use service::RefreshGate;
