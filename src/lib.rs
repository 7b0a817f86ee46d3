// Library target exists for integration tests and criterion benchmarks.
// The binary entry point is main.rs; this file re-declares the module tree so
// that harnesses can import types via `earstaff::engine::*` / `earstaff::store::*`.
// Most UI code is only exercised through the binary, so suppress dead_code warnings.
#![allow(dead_code)]

// Public: used directly by tests and benchmarks
pub mod config;
pub mod engine;
pub mod session;
pub mod store;

// Private: required transitively by the app shell
mod app;
mod event;
mod ui;
