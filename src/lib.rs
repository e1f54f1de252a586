//! CodeXI PAT service — library crate for integration testing.
//!
//! Re-exports modules needed by integration tests in `tests/`.

pub mod config;
pub mod errors;
pub mod service;
pub mod store;
pub mod token;
