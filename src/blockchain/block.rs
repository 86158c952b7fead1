use std::time::Duration;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use super::hash::{compute_hash, meets_difficulty};
use super::seal::{Header, Sealer};
use super::GENESIS_PREVIOUS_HASH;
use crate::error::Result;

/// A single sealed record in the chain.
///
/// Fields are read-only from outside the crate. The only public mutations
/// are [`Block::edit_payload`], which reseals, and the two tamper methods,
/// which deliberately leave the block or its successor inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    position: u64,
    timestamp: i64, // Unix milliseconds (UTC), captured at seal time
    previous_hash: String,
    nonce: u64,
    difficulty: u32,
    hash: String,
    payload: String,
}

impl Block {
    /// Create a block linked to `previous` (or to the sentinel when `None`)
    /// and seal it at `difficulty`.
    pub fn create(
        position: u64,
        payload: impl Into<String>,
        previous: Option<&Block>,
        sealer: &Sealer,
        difficulty: u32,
    ) -> Self {
        let mut block = Self::unsealed(position, payload, previous);
        let timestamp = Utc::now().timestamp_millis();
        let seal = sealer.seal(&block.header_at(timestamp), difficulty);
        block.timestamp = timestamp;
        block.nonce = seal.nonce;
        block.hash = seal.hash;
        block.difficulty = difficulty;
        block
    }

    /// Bounded variant of [`Block::create`]; fails with `SealTimeout` when
    /// `budget` is set and elapses.
    pub(crate) fn create_within(
        position: u64,
        payload: impl Into<String>,
        previous: Option<&Block>,
        sealer: &Sealer,
        difficulty: u32,
        budget: Option<Duration>,
    ) -> Result<Self> {
        let mut block = Self::unsealed(position, payload, previous);
        block.reseal(sealer, difficulty, budget)?;
        Ok(block)
    }

    fn unsealed(position: u64, payload: impl Into<String>, previous: Option<&Block>) -> Self {
        let previous_hash = previous
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());
        Self {
            position,
            timestamp: 0,
            previous_hash,
            nonce: 0,
            difficulty: 0,
            hash: String::new(),
            payload: payload.into(),
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Difficulty this block was last sealed at.
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Hash of the block's current fields (excluding the cached `hash`).
    pub fn compute_hash(&self) -> String {
        compute_hash(
            self.position,
            &self.previous_hash,
            &self.payload,
            self.timestamp,
            self.nonce,
        )
    }

    /// Whether the cached hash still matches the block's own fields.
    pub fn has_consistent_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether the cached hash satisfies the difficulty it was sealed at.
    pub fn meets_difficulty(&self) -> bool {
        meets_difficulty(&self.hash, self.difficulty)
    }

    /// Replace the payload and reseal at this block's own difficulty.
    ///
    /// This only repairs this block; the successor's link is the chain's
    /// concern. On a seal timeout the block is left untouched.
    pub fn edit_payload(
        &mut self,
        payload: impl Into<String>,
        sealer: &Sealer,
        budget: Option<Duration>,
    ) -> Result<()> {
        let difficulty = self.difficulty;
        self.replace_payload(payload, sealer, difficulty, budget)
    }

    /// Replace the payload and reseal at `difficulty`, restoring the old
    /// payload if the seal fails.
    pub(crate) fn replace_payload(
        &mut self,
        payload: impl Into<String>,
        sealer: &Sealer,
        difficulty: u32,
        budget: Option<Duration>,
    ) -> Result<()> {
        let previous = std::mem::replace(&mut self.payload, payload.into());
        if let Err(e) = self.reseal(sealer, difficulty, budget) {
            self.payload = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Overwrite the payload and timestamp and rehash with the existing
    /// nonce, without any search. The block stays self-consistent but its
    /// successor's link no longer matches.
    pub fn tamper_payload(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
        self.timestamp = Utc::now().timestamp_millis();
        self.recompute_hash();
        warn!("block #{} payload tampered", self.position);
    }

    /// Overwrite the timestamp and keep the old hash, so the block no longer
    /// hashes to what it claims.
    pub fn tamper_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
        warn!("block #{} timestamp tampered", self.position);
    }

    pub(crate) fn set_previous_hash(&mut self, previous_hash: impl Into<String>) {
        self.previous_hash = previous_hash.into();
    }

    pub(crate) fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    pub(crate) fn recompute_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Run a fresh nonce search at `difficulty`, stamping the current time.
    /// Nothing is written unless the search succeeds.
    pub(crate) fn reseal(
        &mut self,
        sealer: &Sealer,
        difficulty: u32,
        budget: Option<Duration>,
    ) -> Result<()> {
        let timestamp = Utc::now().timestamp_millis();
        let seal = sealer.seal_with_budget(&self.header_at(timestamp), difficulty, budget)?;
        self.timestamp = timestamp;
        self.nonce = seal.nonce;
        self.hash = seal.hash;
        self.difficulty = difficulty;
        Ok(())
    }

    fn header_at(&self, timestamp: i64) -> Header<'_> {
        Header {
            position: self.position,
            previous_hash: &self.previous_hash,
            payload: &self.payload,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;

    fn sealer() -> Sealer {
        Sealer::new(2)
    }

    #[test]
    fn root_block_links_to_sentinel() {
        let b = Block::create(0, "root", None, &sealer(), 1);
        assert_eq!(b.previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(b.has_consistent_hash());
        assert!(b.meets_difficulty());
    }

    #[test]
    fn create_links_to_predecessor() {
        let s = sealer();
        let first = Block::create(0, "root", None, &s, 1);
        let second = Block::create(1, "next", Some(&first), &s, 2);
        assert_eq!(second.previous_hash(), first.hash());
        assert!(second.hash().starts_with("00"));
        assert_eq!(second.difficulty(), 2);
    }

    #[test]
    fn edit_payload_reseals() {
        let s = sealer();
        let mut b = Block::create(1, "before", None, &s, 2);
        let old_hash = b.hash().to_string();
        b.edit_payload("after", &s, None).unwrap();
        assert_eq!(b.payload(), "after");
        assert_ne!(b.hash(), old_hash);
        assert!(b.has_consistent_hash());
        assert!(b.meets_difficulty());
    }

    #[test]
    fn failed_edit_leaves_block_untouched() {
        let s = sealer();
        let mut b = Block::create(1, "before", None, &s, 1);
        b.difficulty = 65;
        let snapshot = b.clone();
        let err = b
            .edit_payload("after", &s, Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, ChainError::SealTimeout { .. }));
        assert_eq!(b, snapshot);
    }

    #[test]
    fn payload_tamper_stays_self_consistent() {
        let mut b = Block::create(1, "honest", None, &sealer(), 0);
        let old_hash = b.hash().to_string();
        b.tamper_payload("HACKED");
        assert_eq!(b.payload(), "HACKED");
        assert_ne!(b.hash(), old_hash);
        assert!(b.has_consistent_hash());
    }

    #[test]
    fn timestamp_tamper_breaks_self_consistency() {
        let mut b = Block::create(1, "honest", None, &sealer(), 1);
        let old_hash = b.hash().to_string();
        b.tamper_timestamp(b.timestamp() - 1_000);
        assert_eq!(b.hash(), old_hash);
        assert!(!b.has_consistent_hash());
    }
}
