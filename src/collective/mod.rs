//! Collective operations over a fixed group of ranks.
//!
//! Every rank in a group calls the same collectives in the same order; the
//! root rank owns full buffers and the others only see their own block.
//! [`LocalGroup`] runs a group in-process, one thread per rank.

pub mod local;
pub mod triangle;

pub use local::{LocalCommunicator, LocalGroup};
pub use triangle::{validate_triangle_series, TriangleReport};

use crate::error::{Error, Result};

/// Rank that owns full buffers and receives reductions.
pub const ROOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
}

impl ReduceOp {
    pub fn apply(self, a: u64, b: u64) -> Result<u64> {
        match self {
            ReduceOp::Sum => a.checked_add(b).ok_or(Error::Overflow),
            ReduceOp::Min => Ok(a.min(b)),
            ReduceOp::Max => Ok(a.max(b)),
        }
    }
}

/// Blocking collectives for one rank of a group.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    /// Splits `send` (significant on `root` only, length `block_len * size`)
    /// into equal contiguous blocks and returns this rank's block.
    fn scatter(&self, root: usize, send: Option<&[u64]>, block_len: usize) -> Result<Vec<u64>>;

    /// Concatenates every rank's block in rank order on `root`; `None` elsewhere.
    fn gather(&self, root: usize, send: &[u64]) -> Result<Option<Vec<u64>>>;

    /// Combines one value per rank with `op` on `root`; `None` elsewhere.
    fn reduce(&self, root: usize, value: u64, op: ReduceOp) -> Result<Option<u64>>;
}
