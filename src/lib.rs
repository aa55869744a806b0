//! triplescreen: Elder Triple Screen stock screener.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The domain never logs or touches
//! the filesystem; [`cli`] wires the pieces together.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
