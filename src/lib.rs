// Library target holds the whole module tree so the binary, the integration
// tests and the criterion benchmarks share one copy of it.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod schedule;
pub mod scramble;
pub mod session;
pub mod stats;
pub mod store;
pub mod timer;
pub mod ui;
