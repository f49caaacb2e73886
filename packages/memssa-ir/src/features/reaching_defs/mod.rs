//! Reaching-definition queries
//!
//! Flattens Phi nodes into their inputs and classifies whether the value a
//! use reads was written on every path.

pub mod application;
pub mod domain;
pub mod ports;

pub use domain::{flatten_phis, value_facts, Initialization, ValueFacts};
pub use ports::ReachingDefinitions;
