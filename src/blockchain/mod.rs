pub mod block;
pub mod hash;
pub mod integrity;
pub mod model;
pub mod seal;

pub use block::Block;
pub use integrity::{Fault, IntegrityReport};
pub use model::Blockchain;
pub use seal::{Header, Seal, Sealer};

/// Default Proof-of-Work difficulty (number of leading zero hex digits).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Attempts between per-worker progress traces while sealing.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Payload every chain starts with.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";
