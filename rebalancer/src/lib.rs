//! nanofolio-rebalancer: command-line front end for the nanofolio search.
//!
//! Reads a portfolio and a security catalog from JSON, runs the rebalance
//! search with settings from config.toml, prints the plan, and keeps an
//! audit trail.

pub mod audit;
pub mod config;
pub mod dump;
pub mod error;
pub mod input;
pub mod plan;
pub mod report;
