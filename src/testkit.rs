/*!
testkit.rs - Minimal fakes for the collaborator traits, used only by the
test suites in this crate. Rather than a real PowerPC analyzer, HLE table,
or block cache, these build minimal decoded-instruction lists and canned
analyzer output so the builder and dispatcher tests can run standalone.
*/

use std::collections::HashMap;

use crate::block::BlockDescriptor;
use crate::collaborators::{
    Analyzer, BlockCacheBackend, BlockHandle, BlockMeta, BreakpointRegistry, Config, CpuRunState,
    DecodedInstruction, Hle, HleKind, HleProbe, Runtime, SemanticFn, Timing,
};
use crate::context::CoreContext;
use crate::handlers::CuratedOp;

/// A `SemanticFn` that isn't one of the curated opcodes; used to exercise
/// the indirect/miss path in `direct_table` and `builder` tests.
pub fn fallback_semantic(_rt: &mut dyn Runtime, ctx: &mut CoreContext, data: u64) {
    ctx.pc = ctx.pc.wrapping_add(data as u32);
}

macro_rules! curated_semantic {
    ($name:ident) => {
        #[inline(never)]
        pub fn $name(_rt: &mut dyn Runtime, ctx: &mut CoreContext, data: u64) {
            ctx.downcount = ctx.downcount.wrapping_sub(data as i64);
        }
    };
}

curated_semantic!(semantic_bx);
curated_semantic!(semantic_bcx);
curated_semantic!(semantic_bclrx);
curated_semantic!(semantic_bcctrx);
curated_semantic!(semantic_sc);
curated_semantic!(semantic_addx);
curated_semantic!(semantic_subfx);
curated_semantic!(semantic_mulli);
curated_semantic!(semantic_andx);
curated_semantic!(semantic_orx);
curated_semantic!(semantic_xorx);
curated_semantic!(semantic_rlwinmx);
curated_semantic!(semantic_srawx);
curated_semantic!(semantic_cmpx);
curated_semantic!(semantic_twi);
curated_semantic!(semantic_faddsx);
curated_semantic!(semantic_faddx);
curated_semantic!(semantic_fmulsx);
curated_semantic!(semantic_fmulx);
curated_semantic!(semantic_fcmpo);

fn semantic_for(op: CuratedOp) -> SemanticFn {
    match op {
        CuratedOp::Bx => semantic_bx,
        CuratedOp::Bcx => semantic_bcx,
        CuratedOp::Bclrx => semantic_bclrx,
        CuratedOp::Bcctrx => semantic_bcctrx,
        CuratedOp::Sc => semantic_sc,
        CuratedOp::Addx => semantic_addx,
        CuratedOp::Subfx => semantic_subfx,
        CuratedOp::Mulli => semantic_mulli,
        CuratedOp::Andx => semantic_andx,
        CuratedOp::Orx => semantic_orx,
        CuratedOp::Xorx => semantic_xorx,
        CuratedOp::Rlwinmx => semantic_rlwinmx,
        CuratedOp::Srawx => semantic_srawx,
        CuratedOp::Cmpx => semantic_cmpx,
        CuratedOp::Twi => semantic_twi,
        CuratedOp::Faddsx => semantic_faddsx,
        CuratedOp::Faddx => semantic_faddx,
        CuratedOp::Fmulsx => semantic_fmulsx,
        CuratedOp::Fmulx => semantic_fmulx,
        CuratedOp::Fcmpo => semantic_fcmpo,
    }
}

/// Fake [`Runtime`]: records every call a handler makes into it so tests can
/// assert on call counts/arguments instead of observable side effects alone.
pub struct FakeRuntime {
    pub perfmon_calls: Vec<(u32, u32, u32)>,
    pub exception_checks: u32,
    pub running_after_breakpoint: bool,
    pub idle_calls: u32,
    pub config: Config,
    collapse_curated: bool,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            perfmon_calls: Vec::new(),
            exception_checks: 0,
            running_after_breakpoint: true,
            idle_calls: 0,
            config: Config::default(),
            collapse_curated: false,
        }
    }

    /// A variant where `Bx` and `Bcx` resolve to the same semantic function,
    /// to exercise `DirectDispatchTable::build`'s duplicate rejection.
    pub fn with_collapsed_curated() -> Self {
        Self { collapse_curated: true, ..Self::new() }
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for FakeRuntime {
    fn lookup_semantic(&self, _opcode: u32) -> SemanticFn {
        fallback_semantic
    }

    fn hle_semantic(&self) -> SemanticFn {
        fallback_semantic
    }

    fn curated(&self, op: CuratedOp) -> SemanticFn {
        if self.collapse_curated && op == CuratedOp::Bcx {
            return semantic_for(CuratedOp::Bx);
        }
        semantic_for(op)
    }

    fn check_exceptions(&mut self, _ctx: &mut CoreContext) {
        self.exception_checks += 1;
    }

    fn check_breakpoints(&mut self, _ctx: &mut CoreContext) -> bool {
        self.running_after_breakpoint
    }

    fn update_performance_monitor(&mut self, instructions: u32, load_store: u32, fp: u32) {
        self.perfmon_calls.push((instructions, load_store, fp));
    }

    fn idle(&mut self) {
        self.idle_calls += 1;
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

/// Fake [`Analyzer`] that replays a scripted instruction list (or a memory
/// exception) regardless of the requested `pc`.
pub struct FakeAnalyzer {
    fallthrough_npc: u32,
    instructions: Vec<DecodedInstruction>,
    memory_exception: bool,
    broken: bool,
}

impl FakeAnalyzer {
    pub fn scripted(fallthrough_npc: u32, instructions: Vec<DecodedInstruction>) -> Self {
        Self { fallthrough_npc, instructions, memory_exception: false, broken: false }
    }

    pub fn broken(fallthrough_npc: u32, instructions: Vec<DecodedInstruction>) -> Self {
        Self { fallthrough_npc, instructions, memory_exception: false, broken: true }
    }

    pub fn memory_exception(fallthrough_npc: u32) -> Self {
        Self { fallthrough_npc, instructions: Vec::new(), memory_exception: true, broken: false }
    }
}

impl Analyzer for FakeAnalyzer {
    fn analyze(
        &self,
        _pc: u32,
        meta: &mut BlockMeta,
        out: &mut Vec<DecodedInstruction>,
        _capacity: usize,
    ) -> u32 {
        meta.memory_exception = self.memory_exception;
        meta.broken = self.broken;
        meta.num_instructions = self.instructions.len() as u32;
        out.extend_from_slice(&self.instructions);
        self.fallthrough_npc
    }
}

/// Fake [`Hle`]: at most one scripted probe address.
#[derive(Default)]
pub struct FakeHle {
    probe_at: Option<(u32, HleProbe)>,
}

impl FakeHle {
    pub fn replace_at(address: u32, hook_index: u64) -> Self {
        Self { probe_at: Some((address, HleProbe { hook_index, kind: HleKind::Replace })) }
    }
}

impl Hle for FakeHle {
    fn probe(&self, address: u32) -> Option<HleProbe> {
        self.probe_at.and_then(|(a, p)| if a == address { Some(p) } else { None })
    }
}

/// Fake [`BreakpointRegistry`]: a plain set of addresses.
#[derive(Default)]
pub struct FakeBreakpoints {
    set: Vec<u32>,
}

impl FakeBreakpoints {
    pub fn with(addresses: impl IntoIterator<Item = u32>) -> Self {
        Self { set: addresses.into_iter().collect() }
    }
}

impl BreakpointRegistry for FakeBreakpoints {
    fn is_set(&self, address: u32) -> bool {
        self.set.contains(&address)
    }
}

/// Fake [`BlockCacheBackend`]: an in-memory map from entry PC to descriptor.
#[derive(Default)]
pub struct FakeBlockCache {
    blocks: HashMap<u32, BlockDescriptor>,
    next_handle: u64,
    pending: HashMap<u64, u32>,
    pub last: Option<BlockDescriptor>,
}

impl BlockCacheBackend for FakeBlockCache {
    fn allocate(&mut self, pc: u32) -> BlockHandle {
        let handle = BlockHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle.0, pc);
        handle
    }

    fn finalize(&mut self, handle: BlockHandle, desc: BlockDescriptor) {
        let pc = self.pending.remove(&handle.0).expect("finalize without allocate");
        self.last = Some(desc.clone());
        self.blocks.insert(pc, desc);
    }

    fn dispatch(&self, pc: u32) -> Option<(usize, usize)> {
        self.blocks.get(&pc).map(|d| (d.start, d.end))
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.last = None;
    }

    fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Fake [`Timing`]: counts calls instead of actually scheduling anything.
#[derive(Default)]
pub struct FakeTiming {
    pub advances: u32,
}

impl Timing for FakeTiming {
    fn advance(&mut self) {
        self.advances += 1;
    }
}

/// Fake [`CpuRunState`] that reports running for a fixed number of checks,
/// then stops — lets a `run()` test terminate without an infinite loop.
pub struct FakeCpuRunState {
    remaining: std::cell::Cell<u32>,
}

impl FakeCpuRunState {
    pub fn for_iterations(n: u32) -> Self {
        Self { remaining: std::cell::Cell::new(n) }
    }
}

impl CpuRunState for FakeCpuRunState {
    fn is_running(&self) -> bool {
        let n = self.remaining.get();
        if n == 0 {
            return false;
        }
        self.remaining.set(n - 1);
        true
    }
}
