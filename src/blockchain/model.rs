use std::time::Duration;

use log::{debug, info, warn};

use super::{Block, Fault, GENESIS_PAYLOAD, IntegrityReport, Sealer};
use crate::config::ChainConfig;
use crate::error::{ChainError, Result};

/// Simple in-memory tamper-evident chain with Proof-of-Work seals.
///
/// Not meant for concurrent callers: wrap it in a lock if it has to be
/// shared. Cloning produces a fully independent copy.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
    difficulty: u32,
    sealer: Sealer,
    seal_timeout: Option<Duration>,
}

impl Blockchain {
    /// Initialize a new chain with a sealed genesis block, using one sealer
    /// worker per CPU and unbounded seals.
    pub fn new(difficulty: u32) -> Self {
        let sealer = Sealer::default();
        let genesis = Block::create(0, GENESIS_PAYLOAD, None, &sealer, difficulty);
        Self {
            chain: vec![genesis],
            difficulty,
            sealer,
            seal_timeout: None,
        }
    }

    /// Initialize from a config. Fails only when a seal timeout is
    /// configured and the genesis seal exceeds it.
    pub fn with_config(config: &ChainConfig) -> Result<Self> {
        let sealer = Sealer::from_config(config);
        let genesis = Block::create_within(
            0,
            GENESIS_PAYLOAD,
            None,
            &sealer,
            config.difficulty,
            config.seal_timeout,
        )?;
        info!(
            "genesis sealed: difficulty={} workers={} hash={}",
            config.difficulty,
            sealer.workers(),
            genesis.hash()
        );
        Ok(Self {
            chain: vec![genesis],
            difficulty: config.difficulty,
            sealer,
            seal_timeout: config.seal_timeout,
        })
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: u32) {
        // NOTE: applies to future seals only, cascades included; sealed
        // blocks keep their own difficulty.
        self.difficulty = difficulty;
    }

    /// Seal and append a block carrying `payload` after the current tip.
    pub fn append(&mut self, payload: impl Into<String>) -> Result<&Block> {
        let position = self.chain.len() as u64;
        let block = Block::create_within(
            position,
            payload,
            Some(self.last_block()),
            &self.sealer,
            self.difficulty,
            self.seal_timeout,
        )?;
        info!(
            "appended block #{} nonce={} hash={}",
            position,
            block.nonce(),
            block.hash()
        );
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Replace the payload at `index`, reseal it, then relink and reseal
    /// every following block in ascending order.
    pub fn edit_at(&mut self, index: usize, payload: impl Into<String>) -> Result<()> {
        self.check_index(index)?;

        let mut suffix = self.chain[index..].to_vec();
        let Some((edited, rest)) = suffix.split_first_mut() else {
            return Err(self.out_of_range(index));
        };
        edited.replace_payload(payload, &self.sealer, self.difficulty, self.seal_timeout)?;
        self.relink(rest, edited.hash(), index as u64 + 1)?;

        self.chain.truncate(index);
        self.chain.extend(suffix);
        info!(
            "edited block #{} and resealed {} following block(s)",
            index,
            self.chain.len() - index - 1
        );
        Ok(())
    }

    /// Remove the block at `index` and relink the tail onto its
    /// predecessor, renumbering positions. Returns the removed block.
    pub fn delete_at(&mut self, index: usize) -> Result<Block> {
        if index == 0 {
            return Err(ChainError::GenesisProtected);
        }
        self.check_index(index)?;

        let mut suffix = self.chain[index + 1..].to_vec();
        let previous_hash = self.chain[index - 1].hash().to_string();
        self.relink(&mut suffix, &previous_hash, index as u64)?;

        let removed = self.chain.remove(index);
        self.chain.truncate(index);
        self.chain.extend(suffix);
        info!(
            "deleted block #{} ({} block(s) remain)",
            index,
            self.chain.len()
        );
        Ok(removed)
    }

    /// Overwrite the payload at `index` without any cascade. The block
    /// rehashes itself, so the break shows up at the next link.
    pub fn tamper_at(&mut self, index: usize, payload: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        warn!("tampering payload of block #{index} without cascade");
        self.chain[index].tamper_payload(payload);
        Ok(())
    }

    /// Overwrite the timestamp at `index` without rehashing or cascading.
    pub fn tamper_timestamp_at(&mut self, index: usize, timestamp: i64) -> Result<()> {
        self.check_index(index)?;
        warn!("tampering timestamp of block #{index} without rehash");
        self.chain[index].tamper_timestamp(timestamp);
        Ok(())
    }

    /// Drop everything but genesis. Returns how many blocks were removed.
    pub fn purge(&mut self) -> Result<usize> {
        if self.chain.len() <= 1 {
            return Err(ChainError::NothingToPurge);
        }
        let removed = self.chain.len() - 1;
        self.chain.truncate(1);
        info!("purged {removed} block(s)");
        Ok(removed)
    }

    /// Walk the whole chain and report every integrity fault: a successor
    /// not pointing at its predecessor's hash, a hash that does not match
    /// its block's fields, and a hash below its recorded difficulty.
    pub fn verify(&self) -> IntegrityReport {
        let mut faults = Vec::new();

        for (i, block) in self.chain.iter().enumerate() {
            if i > 0 && block.previous_hash() != self.chain[i - 1].hash() {
                faults.push(Fault::BrokenLink { index: i - 1 });
            }
            if !block.has_consistent_hash() {
                faults.push(Fault::HashMismatch { index: i });
            }
            if !block.meets_difficulty() {
                faults.push(Fault::InsufficientWork {
                    index: i,
                    difficulty: block.difficulty(),
                });
            }
        }

        let report = IntegrityReport {
            checked: self.chain.len(),
            faults,
        };
        if !report.is_intact() {
            debug!("verify found {} fault(s)", report.faults.len());
        }
        report
    }

    /// Relink `blocks` onto `previous_hash` starting at `first_position`,
    /// resealing each in order so every block sees its predecessor's new
    /// hash.
    fn relink(&self, blocks: &mut [Block], previous_hash: &str, first_position: u64) -> Result<()> {
        let mut previous_hash = previous_hash.to_string();
        for (offset, block) in blocks.iter_mut().enumerate() {
            block.set_position(first_position + offset as u64);
            block.set_previous_hash(previous_hash);
            block.reseal(&self.sealer, self.difficulty, self.seal_timeout)?;
            debug!("cascade resealed block #{}", block.position());
            previous_hash = block.hash().to_string();
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.chain.len() {
            Ok(())
        } else {
            Err(self.out_of_range(index))
        }
    }

    fn out_of_range(&self, index: usize) -> ChainError {
        ChainError::IndexOutOfRange {
            index,
            len: self.chain.len(),
        }
    }
}
