//! Shared storage integration tests.
//!
//! Tests the DataStore contract against every implementation. Each backend's
//! test binary builds a store and runs `run_data_store_tests!` over it.

pub mod data_store_tests;
