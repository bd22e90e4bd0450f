//! SSA value identifiers and definition sites.
//!
//! Every value in an [`SsaFunction`](crate::analysis::SsaFunction) is
//! identified by an [`SsaVarId`], an index into the function's value space.
//! A value is defined exactly once: as a function argument, by a phi node, or
//! by an instruction. [`DefSite`] records which, and where.

use std::fmt;

/// Unique identifier for an SSA value.
///
/// The identifier is unique within a single function but not across
/// functions. Function arguments occupy the first `num_args` indices.
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::SsaVarId;
///
/// let id = SsaVarId::new(42);
/// assert_eq!(id.index(), 42);
/// assert_eq!(id.to_string(), "v42");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SsaVarId(usize);

impl SsaVarId {
    /// Creates a new SSA value identifier.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into the function's value space
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for SsaVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for SsaVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Where an SSA value is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefSite {
    /// A function argument; available on entry to every block.
    Argument(usize),
    /// The phi node at `index` in `block`.
    Phi {
        /// Block containing the phi node
        block: usize,
        /// Position among the block's phi nodes
        index: usize,
    },
    /// The instruction at `index` in `block`.
    Instruction {
        /// Block containing the instruction
        block: usize,
        /// Position among the block's instructions
        index: usize,
    },
}

impl DefSite {
    /// Returns the defining block, or `None` for arguments.
    #[must_use]
    pub const fn block(&self) -> Option<usize> {
        match self {
            DefSite::Argument(_) => None,
            DefSite::Phi { block, .. } | DefSite::Instruction { block, .. } => Some(*block),
        }
    }
}

impl fmt::Display for DefSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefSite::Argument(index) => write!(f, "arg{index}"),
            DefSite::Phi { block, index } => write!(f, "B{block}:phi{index}"),
            DefSite::Instruction { block, index } => write!(f, "B{block}:{index}"),
        }
    }
}
