//! Dataset Catalog - version publishing workflow
//!
//! Core of a dataset metadata catalog: moves dataset versions through a
//! publishing lifecycle driven by a per-type transition table, with
//! conflict-aware writes and per-resource locking.

pub mod config;
pub mod downloads;
pub mod error;
pub mod locks;
pub mod models;
pub mod storage;
pub mod utils;
pub mod workflow;

pub use error::{CatalogError, ErrorKind, Result};
pub use workflow::{AmendOptions, StateMachine};
