//! Tamper-evident append log: hash-linked blocks sealed by a parallel
//! proof-of-work search, with integrity verification and simulated
//! tampering.

pub mod blockchain;
pub mod config;
pub mod error;

pub use blockchain::{Block, Blockchain, Fault, IntegrityReport, Sealer};
pub use config::ChainConfig;
pub use error::{ChainError, Result};
