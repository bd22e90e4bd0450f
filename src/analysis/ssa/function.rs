//! SSA function representation: one function body in SSA form.
//!
//! ```text
//! SsaFunction
//! ├── name: String            // for diagnostics and event logs
//! ├── num_args: usize         // arguments are values v0..v{num_args-1}
//! ├── blocks: Vec<SsaBlock>   // block 0 is the entry
//! └── value_count: usize      // size of the value space
//! ```

use std::fmt;

use crate::analysis::ssa::{DefSite, SsaBlock, SsaVarId};

/// A function body in SSA (Static Single Assignment) form.
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::{SsaBlock, SsaFunction};
///
/// let mut func = SsaFunction::new(2);
/// func.add_block(SsaBlock::new(0));
///
/// // Arguments occupy the first value indices
/// assert_eq!(func.value_count(), 2);
/// let fresh = func.new_value();
/// assert_eq!(fresh.index(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SsaFunction {
    /// Function name, used in diagnostics.
    name: String,
    /// SSA basic blocks, indexed by block ID.
    blocks: Vec<SsaBlock>,
    /// Number of function arguments.
    num_args: usize,
    /// Number of allocated SSA values, arguments included.
    value_count: usize,
}

impl SsaFunction {
    /// Creates a new empty SSA function with `num_args` argument values.
    #[must_use]
    pub fn new(num_args: usize) -> Self {
        Self {
            name: String::new(),
            blocks: Vec::new(),
            num_args,
            value_count: num_args,
        }
    }

    /// Sets the function name, builder style.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the function name (empty if unnamed).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of arguments.
    #[must_use]
    pub const fn num_args(&self) -> usize {
        self.num_args
    }

    /// Returns the SSA value bound to argument `index`.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<SsaVarId> {
        (index < self.num_args).then(|| SsaVarId::new(index))
    }

    /// Returns all blocks.
    #[must_use]
    pub fn blocks(&self) -> &[SsaBlock] {
        &self.blocks
    }

    /// Returns a mutable reference to the block list.
    pub fn blocks_mut(&mut self) -> &mut Vec<SsaBlock> {
        &mut self.blocks
    }

    /// Returns the block at `index`.
    #[must_use]
    pub fn block(&self, index: usize) -> Option<&SsaBlock> {
        self.blocks.get(index)
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the function has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends a block.
    pub fn add_block(&mut self, block: SsaBlock) {
        self.blocks.push(block);
    }

    /// Returns the number of allocated SSA values.
    #[must_use]
    pub const fn value_count(&self) -> usize {
        self.value_count
    }

    /// Allocates a fresh SSA value.
    pub fn new_value(&mut self) -> SsaVarId {
        let id = SsaVarId::new(self.value_count);
        self.value_count += 1;
        id
    }

    /// Returns the total number of phi nodes across all blocks.
    #[must_use]
    pub fn total_phi_count(&self) -> usize {
        self.blocks.iter().map(SsaBlock::phi_count).sum()
    }

    /// Returns the total number of instructions across all blocks.
    #[must_use]
    pub fn total_instruction_count(&self) -> usize {
        self.blocks.iter().map(SsaBlock::instruction_count).sum()
    }

    /// Computes the definition site of every value.
    ///
    /// The result is indexed by [`SsaVarId::index`]; values that are never
    /// defined map to `None`. If a value is (illegally) defined twice, the
    /// last definition wins.
    #[must_use]
    pub fn definitions(&self) -> Vec<Option<DefSite>> {
        let mut defs = vec![None; self.value_count];
        for (index, slot) in defs.iter_mut().enumerate().take(self.num_args) {
            *slot = Some(DefSite::Argument(index));
        }

        for block in &self.blocks {
            let block_id = block.id();
            for (index, phi) in block.phi_nodes().iter().enumerate() {
                if let Some(slot) = defs.get_mut(phi.result().index()) {
                    *slot = Some(DefSite::Phi {
                        block: block_id,
                        index,
                    });
                }
            }
            for (index, instr) in block.instructions().iter().enumerate() {
                let Some(def) = instr.def() else {
                    continue;
                };
                if let Some(slot) = defs.get_mut(def.index()) {
                    *slot = Some(DefSite::Instruction {
                        block: block_id,
                        index,
                    });
                }
            }
        }

        defs
    }

    /// Returns the block index and position of the instruction defining `var`.
    #[must_use]
    pub fn find_instruction_def(&self, var: SsaVarId) -> Option<(usize, usize)> {
        self.blocks.iter().find_map(|block| {
            block
                .instructions()
                .iter()
                .position(|instr| instr.def() == Some(var))
                .map(|index| (block.id(), index))
        })
    }
}

impl fmt::Display for SsaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "<anonymous>"
        } else {
            &self.name
        };
        writeln!(f, "SSA Function {name} ({} args):", self.num_args)?;
        writeln!(f, "  Values: {}", self.value_count)?;
        writeln!(f, "  Blocks: {}", self.blocks.len())?;
        writeln!(f)?;

        for block in &self.blocks {
            write!(f, "{block}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SsaFunctionBuilder;

    #[test]
    fn test_definitions() {
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            f.block(0, |b| {
                let c = b.const_i32(1);
                let _ = b.add(SsaVarId::new(0), c);
                b.jump(1);
            });
            f.block(1, |b| b.ret());
        });

        let defs = ssa.definitions();
        assert_eq!(defs[0], Some(DefSite::Argument(0)));
        assert_eq!(defs[1], Some(DefSite::Instruction { block: 0, index: 0 }));
        assert_eq!(defs[2], Some(DefSite::Instruction { block: 0, index: 1 }));
        assert_eq!(ssa.find_instruction_def(SsaVarId::new(2)), Some((0, 1)));
        assert_eq!(ssa.total_instruction_count(), 4);
    }

    #[test]
    fn test_display_names_function() {
        let ssa = SsaFunctionBuilder::new(0)
            .build_with(|f| f.block(0, |b| b.ret()))
            .with_name("main");
        let text = ssa.to_string();
        assert!(text.starts_with("SSA Function main (0 args):"));
        assert!(text.contains("B0:\n  ret\n"));
    }
}
