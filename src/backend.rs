/*!
backend.rs - `ThreadedInterpreter`, the lifecycle façade over
[`crate::builder`] and [`crate::dispatch`]. Everything else in this crate
is reachable only through this type once a caller has collaborators to
hand it.
*/

use crate::arena::RecordArena;
use crate::block::BuilderScratch;
use crate::builder::{build_block, BuildInputs, BuildOutcome};
use crate::collaborators::{
    Analyzer, BlockCacheBackend, BreakpointRegistry, CpuRunState, Hle, Runtime, Timing,
};
use crate::context::CoreContext;
use crate::dispatch::{self, DispatchInputs, StepOutcome};
use crate::direct_table::DirectDispatchTable;
use crate::error::BuildError;

/// The threaded-code interpreter backend: owns the record arena and the
/// direct-dispatch table, and borrows every external collaborator for its
/// own lifetime.
pub struct ThreadedInterpreter<'a> {
    arena: RecordArena,
    cache: Box<dyn BlockCacheBackend + 'a>,
    direct_table: DirectDispatchTable,
    scratch: BuilderScratch,
    analyzer: Box<dyn Analyzer + 'a>,
    hle: Box<dyn Hle + 'a>,
    breakpoints: Box<dyn BreakpointRegistry + 'a>,
    runtime: Box<dyn Runtime + 'a>,
    timing: Box<dyn Timing + 'a>,
    cpu: Box<dyn CpuRunState + 'a>,
}

impl<'a> ThreadedInterpreter<'a> {
    /// Builds the direct-dispatch table against `runtime` and reserves the
    /// record arena. Fails only on construction-time validation: arena
    /// sizing and duplicate curated-opcode entries.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        arena_capacity: usize,
        arena_safety_margin: usize,
        cache: Box<dyn BlockCacheBackend + 'a>,
        analyzer: Box<dyn Analyzer + 'a>,
        hle: Box<dyn Hle + 'a>,
        breakpoints: Box<dyn BreakpointRegistry + 'a>,
        runtime: Box<dyn Runtime + 'a>,
        timing: Box<dyn Timing + 'a>,
        cpu: Box<dyn CpuRunState + 'a>,
    ) -> Result<Self, BuildError> {
        let arena = RecordArena::new(arena_capacity, arena_safety_margin)?;
        let direct_table = DirectDispatchTable::build(runtime.as_ref())?;
        log::info!("threaded interpreter initialized, arena capacity {arena_capacity}");
        Ok(Self {
            arena,
            cache,
            direct_table,
            scratch: BuilderScratch::default(),
            analyzer,
            hle,
            breakpoints,
            runtime,
            timing,
            cpu,
        })
    }

    fn build_inputs(&mut self) -> BuildInputs<'_> {
        BuildInputs {
            arena: &mut self.arena,
            cache: self.cache.as_mut(),
            analyzer: self.analyzer.as_ref(),
            hle: self.hle.as_ref(),
            breakpoints: self.breakpoints.as_ref(),
            direct_table: &self.direct_table,
            runtime: self.runtime.as_mut(),
            scratch: &mut self.scratch,
        }
    }

    fn dispatch_inputs(&mut self) -> DispatchInputs<'_> {
        DispatchInputs {
            arena: &mut self.arena,
            cache: self.cache.as_mut(),
            analyzer: self.analyzer.as_ref(),
            hle: self.hle.as_ref(),
            breakpoints: self.breakpoints.as_ref(),
            direct_table: &self.direct_table,
            runtime: self.runtime.as_mut(),
            scratch: &mut self.scratch,
        }
    }

    /// Shuts the interpreter down. Nothing to flush; dropping the
    /// interpreter is enough.
    pub fn shutdown(self) {
        log::info!("threaded interpreter shut down");
    }

    /// Wipes the arena and block cache together, exactly as the builder
    /// does under arena pressure.
    pub fn clear_cache(&mut self) {
        self.arena.clear();
        self.cache.clear();
    }

    /// Executes exactly one block.
    pub fn single_step(&mut self, ctx: &mut CoreContext) -> StepOutcome {
        let inputs = self.dispatch_inputs();
        dispatch::single_step(ctx, inputs)
    }

    /// Drives blocks until `cpu` reports the guest has stopped.
    pub fn run(&mut self, ctx: &mut CoreContext) {
        let timing = self.timing.as_mut();
        let cpu = self.cpu.as_ref();
        let inputs = DispatchInputs {
            arena: &mut self.arena,
            cache: self.cache.as_mut(),
            analyzer: self.analyzer.as_ref(),
            hle: self.hle.as_ref(),
            breakpoints: self.breakpoints.as_ref(),
            direct_table: &self.direct_table,
            runtime: self.runtime.as_mut(),
            scratch: &mut self.scratch,
        };
        dispatch::run(ctx, inputs, timing, cpu);
    }

    /// Force-builds (or rebuilds) the block entered at `pc` without
    /// executing it.
    pub fn jit(&mut self, ctx: &mut CoreContext, pc: u32) -> BuildOutcome {
        let inputs = self.build_inputs();
        build_block(pc, ctx, inputs)
    }

    /// Returns the underlying block cache.
    pub fn get_block_cache(&self) -> &dyn BlockCacheBackend {
        self.cache.as_ref()
    }

    /// This backend never claims a host fault as its own.
    pub fn handle_fault(&self, _pc: u32, _fault_code: u32) -> bool {
        false
    }

    /// Returns this backend's display name.
    pub fn get_name(&self) -> &'static str {
        "Threaded Interpreter"
    }

    /// No assembly trampolines; everything runs through the handler table.
    pub fn get_asm_routines(&self) -> Option<()> {
        None
    }
}
