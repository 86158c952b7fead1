use thiserror::Error;

/// Errors returned by chain and sealing operations.
///
/// All of them are recoverable: the chain is left exactly as it was before
/// the rejected call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("block index {index} out of range (chain length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("the genesis block cannot be removed")]
    GenesisProtected,

    #[error("no nonce meeting difficulty {difficulty} found within {budget_ms} ms")]
    SealTimeout { difficulty: u32, budget_ms: u128 },

    #[error("nothing to purge: chain only holds the genesis block")]
    NothingToPurge,
}

pub type Result<T> = std::result::Result<T, ChainError>;
