//! `BlockDescriptor` and the builder's per-block scratch state.

/// Describes a finalized block. Owned conceptually by the block-cache
/// collaborator; this core fills it in at finalize time and hands it over.
#[derive(Debug, Clone)]
pub struct BlockDescriptor {
    pub entry_pc: u32,
    pub start: usize,
    pub end: usize,
    pub num_instructions: u32,
    pub physical_addresses: Vec<u32>,
}

/// Per-block accumulated state, reset at block entry.
#[derive(Debug, Clone, Default)]
pub struct BuilderScratch {
    pub block_start_pc: u32,
    pub downcount_amount: u64,
    pub num_load_store: u32,
    pub num_floating_point: u32,
    /// Set once the first FP instruction of this block has emitted a
    /// `CheckFPU` guard, so the guard is emitted at most once per block.
    pub fpu_guarded: bool,
}

impl BuilderScratch {
    pub fn reset(&mut self, block_start_pc: u32) {
        *self = Self { block_start_pc, ..Default::default() };
    }
}
