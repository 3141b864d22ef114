//! Narrow interfaces to every external system this core depends on but does
//! not own: the PowerPC analyzer, the interpreter's per-opcode semantics,
//! the HLE replacement table, the block-cache index, timing, and CPU
//! run-state.
//!
//! This core never constructs a concrete implementation of any of these; it
//! only borrows one for the duration of a build or a dispatch. `testkit`
//! supplies toy implementations for the test suite.

use crate::block::BlockDescriptor;
use crate::context::CoreContext;
pub use crate::handlers::CuratedOp;

/// Signature of a per-opcode (or HLE-hook) semantic function.
pub type SemanticFn = fn(&mut dyn Runtime, &mut CoreContext, u64);

/// Decoded-instruction flags the analyzer attaches to each instruction in a
/// block.
#[derive(Debug, Clone, Copy)]
pub struct DecodedInstruction {
    pub address: u32,
    pub opcode: u32,
    pub num_cycles: u32,
    pub load_store: bool,
    pub use_fpu: bool,
    pub end_block: bool,
    pub skip: bool,
    pub branch_is_idle_loop: bool,
}

/// Block-level flags the analyzer fills in alongside the instruction list.
#[derive(Debug, Clone, Default)]
pub struct BlockMeta {
    pub memory_exception: bool,
    pub broken: bool,
    pub num_instructions: u32,
    pub physical_addresses: Vec<u32>,
}

/// Decodes a straight-line run of guest instructions starting at `pc`.
///
/// Returns the block's natural fallthrough NPC. `capacity` bounds how many
/// instructions may be appended to `out` (the builder's arena safety margin
/// ultimately bounds this, not the analyzer itself).
pub trait Analyzer {
    fn analyze(
        &self,
        pc: u32,
        meta: &mut BlockMeta,
        out: &mut Vec<DecodedInstruction>,
        capacity: usize,
    ) -> u32;
}

/// The kind of HLE hook found at a guest address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HleKind {
    /// Replaces the guest function entirely; the block ends here.
    Replace,
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct HleProbe {
    pub hook_index: u64,
    pub kind: HleKind,
}

/// The HLE replacement table, probed once per decoded instruction address.
pub trait Hle {
    fn probe(&self, address: u32) -> Option<HleProbe>;
}

/// The debugger's breakpoint registry, consulted by the builder to decide
/// whether a `CheckBreakpoint` guard is worth emitting for a given address.
pub trait BreakpointRegistry {
    fn is_set(&self, address: u32) -> bool;
}

/// Opaque handle returned by [`BlockCacheBackend::allocate`] and passed back
/// to [`BlockCacheBackend::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle(pub u64);

/// The block-cache index: maps guest addresses to cached block descriptors.
/// This core allocates, finalizes, dispatches through, and clears it; it
/// does not own invalidation policy.
pub trait BlockCacheBackend {
    fn allocate(&mut self, pc: u32) -> BlockHandle;
    fn finalize(&mut self, handle: BlockHandle, desc: BlockDescriptor);
    /// Returns the record range of the cached block entered by `pc`, if any.
    fn dispatch(&self, pc: u32) -> Option<(usize, usize)>;
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The cycle-budget scheduler: advances the host-side clock once per
/// dispatch slice. Idle-loop notification is deliberately not part of this
/// trait — it fires from inside the handler chain (see `check_idle` in
/// `handlers.rs`), which only ever holds a `Runtime`, so that
/// notification goes through [`Runtime::idle`] instead.
pub trait Timing {
    fn advance(&mut self);
}

/// The guest CPU's run-state.
pub trait CpuRunState {
    fn is_running(&self) -> bool;
}

/// In-process configuration knobs. Plain data, not a file format — there is
/// nothing here worth a serde/toml dependency.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub no_block_cache: bool,
    pub debugging_enabled: bool,
    pub memcheck_enabled: bool,
    pub should_handle_fp_exception: fn(&DecodedInstruction) -> bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_block_cache: false,
            debugging_enabled: false,
            memcheck_enabled: false,
            should_handle_fp_exception: |_| false,
        }
    }
}

/// The single collaborator handed to every handler at dispatch time:
/// resolves per-opcode semantics, bridges HLE calls, and fronts the
/// PowerPC runtime's exception, breakpoint, and performance-monitor
/// machinery.
pub trait Runtime {
    fn lookup_semantic(&self, opcode: u32) -> SemanticFn;
    fn hle_semantic(&self) -> SemanticFn;
    /// The named semantic for one of the curated direct-dispatch opcodes.
    fn curated(&self, op: CuratedOp) -> SemanticFn;

    /// Invoke the collaborator's exception check; redirects `pc`/`npc` if a
    /// bit is pending in `ctx.exceptions`.
    fn check_exceptions(&mut self, ctx: &mut CoreContext);
    /// Invoke the debugger's breakpoint check. Returns `false` once the CPU
    /// has left the Running state as a result.
    fn check_breakpoints(&mut self, ctx: &mut CoreContext) -> bool;
    fn update_performance_monitor(&mut self, instructions: u32, load_store: u32, fp: u32);

    /// Called by `check_idle` when a block branches back to its own start:
    /// lets the host skip the idle spin instead of burning real cycles on
    /// it.
    fn idle(&mut self);

    fn config(&self) -> &Config;
}
