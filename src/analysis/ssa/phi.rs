//! Phi node representation for SSA form.
//!
//! A phi node `v3 = phi(v1 from B1, v2 from B2)` selects `v1` if control
//! reached its block from `B1` and `v2` if it came from `B2`. Phi nodes are
//! evaluated on block entry, before any instruction of the block runs.
//!
//! The important consequence for code motion: a phi *uses* each operand at the
//! end of the associated predecessor block, not inside the phi's own block.
//! [`PhiNode::incoming_blocks`] exposes exactly those use points.

use std::fmt;

use crate::analysis::ssa::SsaVarId;

/// An operand of a phi node: a value arriving from a specific predecessor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhiOperand {
    /// The SSA value providing the operand.
    value: SsaVarId,
    /// The predecessor block from which this value comes.
    predecessor: usize,
}

impl PhiOperand {
    /// Creates a new phi operand.
    ///
    /// # Arguments
    ///
    /// * `value` - The SSA value providing the operand
    /// * `predecessor` - The block index the value arrives from
    #[must_use]
    pub const fn new(value: SsaVarId, predecessor: usize) -> Self {
        Self { value, predecessor }
    }

    /// Returns the SSA value providing the operand.
    #[must_use]
    pub const fn value(&self) -> SsaVarId {
        self.value
    }

    /// Returns the predecessor block index.
    #[must_use]
    pub const fn predecessor(&self) -> usize {
        self.predecessor
    }
}

impl fmt::Display for PhiOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from B{}", self.value, self.predecessor)
    }
}

/// A phi node that merges values at a control flow join point.
///
/// # Invariants
///
/// - Each phi node has one operand per incoming edge of its block
/// - The result value is defined by this phi node only
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::{PhiNode, PhiOperand, SsaVarId};
///
/// // v3 = phi(v1 from B1, v2 from B2)
/// let mut phi = PhiNode::new(SsaVarId::new(3));
/// phi.add_operand(PhiOperand::new(SsaVarId::new(1), 1));
/// phi.add_operand(PhiOperand::new(SsaVarId::new(2), 2));
///
/// let from_v1: Vec<usize> = phi.incoming_blocks(SsaVarId::new(1)).collect();
/// assert_eq!(from_v1, vec![1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiNode {
    /// The SSA value defined by this phi node.
    result: SsaVarId,
    /// Operands from each predecessor block.
    operands: Vec<PhiOperand>,
}

impl PhiNode {
    /// Creates a new phi node with no operands.
    ///
    /// # Arguments
    ///
    /// * `result` - The SSA value this phi node defines
    #[must_use]
    pub fn new(result: SsaVarId) -> Self {
        Self {
            result,
            operands: Vec::new(),
        }
    }

    /// Creates a phi node from a list of `(value, predecessor)` pairs.
    #[must_use]
    pub fn with_operands(result: SsaVarId, operands: &[(SsaVarId, usize)]) -> Self {
        Self {
            result,
            operands: operands
                .iter()
                .map(|&(value, pred)| PhiOperand::new(value, pred))
                .collect(),
        }
    }

    /// Returns the SSA value defined by this phi node.
    #[must_use]
    pub const fn result(&self) -> SsaVarId {
        self.result
    }

    /// Returns the operands of this phi node.
    #[must_use]
    pub fn operands(&self) -> &[PhiOperand] {
        &self.operands
    }

    /// Adds an operand to this phi node.
    pub fn add_operand(&mut self, operand: PhiOperand) {
        self.operands.push(operand);
    }

    /// Returns the number of operands.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Returns the predecessor blocks on whose edges `value` flows into this phi.
    ///
    /// A value can arrive on several edges, so this may yield more than one
    /// block (or the same block twice for a duplicated edge).
    pub fn incoming_blocks(&self, value: SsaVarId) -> impl Iterator<Item = usize> + '_ {
        self.operands
            .iter()
            .filter(move |operand| operand.value == value)
            .map(PhiOperand::predecessor)
    }

    /// Returns `true` if `value` is one of this phi's operands.
    #[must_use]
    pub fn uses_value(&self, value: SsaVarId) -> bool {
        self.operands.iter().any(|operand| operand.value == value)
    }
}

impl fmt::Display for PhiNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = phi(", self.result)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{operand}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phi_display() {
        let phi = PhiNode::with_operands(
            SsaVarId::new(4),
            &[(SsaVarId::new(1), 0), (SsaVarId::new(3), 2)],
        );
        assert_eq!(phi.to_string(), "v4 = phi(v1 from B0, v3 from B2)");
        assert_eq!(phi.operand_count(), 2);
    }

    #[test]
    fn test_phi_incoming_blocks_multiple_edges() {
        let v = SsaVarId::new(1);
        let phi = PhiNode::with_operands(
            SsaVarId::new(9),
            &[(v, 2), (SsaVarId::new(5), 3), (v, 4)],
        );
        let blocks: Vec<usize> = phi.incoming_blocks(v).collect();
        assert_eq!(blocks, vec![2, 4]);
        assert!(phi.uses_value(SsaVarId::new(5)));
        assert!(!phi.uses_value(SsaVarId::new(9)));
    }
}
