//! Tuning knobs for global code motion.

/// Configuration for [`GlobalCodeMotion`](super::GlobalCodeMotion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcmConfig {
    /// Walk from the use LCA up towards the early block looking for a block
    /// with smaller loop depth.
    ///
    /// When disabled every movable operation is placed at the LCA of its
    /// uses, i.e. as late as possible.
    pub hoist_out_of_loops: bool,

    /// Rebuild the order of every block around its pinned operations, each
    /// movable operation placed right before its first use in the block.
    ///
    /// When disabled only operations that changed block are placed that way;
    /// the ones that stayed keep their original order. Either way the final
    /// order depends only on the function, so a second run changes nothing.
    pub place_near_uses: bool,

    /// Functions with more instructions than this are skipped by the pass.
    pub max_instructions: usize,
}

impl Default for GcmConfig {
    fn default() -> Self {
        Self {
            hoist_out_of_loops: true,
            place_near_uses: true,
            max_instructions: 50_000,
        }
    }
}

impl GcmConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sinks every operation to the LCA of its uses, ignoring loop depth.
    #[must_use]
    pub fn sink_only() -> Self {
        Self {
            hoist_out_of_loops: false,
            ..Self::default()
        }
    }

    /// Moves operations between blocks but leaves the operations that stay
    /// in a block in their original order.
    #[must_use]
    pub fn keep_block_order() -> Self {
        Self {
            place_near_uses: false,
            ..Self::default()
        }
    }

    /// Sets the instruction limit.
    #[must_use]
    pub fn with_max_instructions(mut self, max_instructions: usize) -> Self {
        self.max_instructions = max_instructions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = GcmConfig::new();
        assert!(default.hoist_out_of_loops);
        assert!(default.place_near_uses);

        assert!(!GcmConfig::sink_only().hoist_out_of_loops);
        assert!(GcmConfig::sink_only().place_near_uses);
        assert!(!GcmConfig::keep_block_order().place_near_uses);
        assert_eq!(
            GcmConfig::new().with_max_instructions(8).max_instructions,
            8
        );
    }
}
