//! Linear programs over a pluggable solver, plus a Monte Carlo
//! expected-value allocation model.
//!
//! The [`domain`] module holds the modeling layer (expressions, models,
//! sampling, objective assembly) and the solver backends. The remaining
//! modules wire it to the HTTP API and the console report.

pub mod api;
pub mod cache;
pub mod config;
pub mod convert;
pub mod domain;
pub mod models;
pub mod report;
pub mod solve;
