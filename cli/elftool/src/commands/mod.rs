//! CLI command implementations.

pub mod abi;
pub mod dump;
pub mod generate;
