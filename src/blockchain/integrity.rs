use std::fmt;

use serde::Serialize;

/// One integrity problem found while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    /// `blocks[index + 1]` no longer points at `blocks[index].hash`.
    BrokenLink { index: usize },
    /// `blocks[index].hash` does not match the block's own fields.
    HashMismatch { index: usize },
    /// `blocks[index].hash` does not meet the difficulty it was sealed at.
    InsufficientWork { index: usize, difficulty: u32 },
}

impl Fault {
    pub fn index(&self) -> usize {
        match self {
            Fault::BrokenLink { index }
            | Fault::HashMismatch { index }
            | Fault::InsufficientWork { index, .. } => *index,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::BrokenLink { index } => {
                write!(f, "link broken between block {} and {}", index, index + 1)
            }
            Fault::HashMismatch { index } => {
                write!(f, "block {index} hash does not match its contents")
            }
            Fault::InsufficientWork { index, difficulty } => {
                write!(f, "block {index} hash does not meet difficulty {difficulty}")
            }
        }
    }
}

/// Result of [`Blockchain::verify`](super::Blockchain::verify). A broken
/// chain is a normal value here, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Number of blocks inspected.
    pub checked: usize,
    /// Every fault found, in index order.
    pub faults: Vec<Fault>,
}

impl IntegrityReport {
    pub fn is_intact(&self) -> bool {
        self.faults.is_empty()
    }

    /// Index `i - 1` of the first predecessor link that fails.
    pub fn first_break(&self) -> Option<usize> {
        self.link_breaks().next()
    }

    pub fn link_breaks(&self) -> impl Iterator<Item = usize> + '_ {
        self.faults.iter().filter_map(|f| match f {
            Fault::BrokenLink { index } => Some(*index),
            _ => None,
        })
    }

    pub fn hash_mismatches(&self) -> impl Iterator<Item = usize> + '_ {
        self.faults.iter().filter_map(|f| match f {
            Fault::HashMismatch { index } => Some(*index),
            _ => None,
        })
    }

    pub fn work_failures(&self) -> impl Iterator<Item = usize> + '_ {
        self.faults.iter().filter_map(|f| match f {
            Fault::InsufficientWork { index, .. } => Some(*index),
            _ => None,
        })
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_intact() {
            return write!(f, "chain intact ({} blocks)", self.checked);
        }
        write!(f, "chain broken ({} blocks checked)", self.checked)?;
        for fault in &self.faults {
            write!(f, "\n  - {fault}")?;
        }
        Ok(())
    }
}
