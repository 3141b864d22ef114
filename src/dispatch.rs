/*!
dispatch.rs - The dispatch loop: `ExecuteOneBlock`, `SingleStep`, and `Run`.

`run_record_chain` is the driver loop that replaces tail-call threading with
an explicit walk: it steps a block's record slice from index 0, invoking
each handler, stopping at the first [`Flow::Terminate`] or when the slice
is exhausted.
*/

use crate::arena::RecordArena;
use crate::block::BuilderScratch;
use crate::builder::{build_block, BuildInputs, BuildOutcome};
use crate::collaborators::{
    Analyzer, BlockCacheBackend, BreakpointRegistry, CpuRunState, Hle, Runtime, Timing,
};
use crate::context::CoreContext;
use crate::direct_table::DirectDispatchTable;
use crate::record::{Flow, Record};

/// Everything `execute_one_block` borrows for the duration of one call.
pub struct DispatchInputs<'a> {
    pub arena: &'a mut RecordArena,
    pub cache: &'a mut dyn BlockCacheBackend,
    pub analyzer: &'a dyn Analyzer,
    pub hle: &'a dyn Hle,
    pub breakpoints: &'a dyn BreakpointRegistry,
    pub direct_table: &'a DirectDispatchTable,
    pub runtime: &'a mut dyn Runtime,
    pub scratch: &'a mut BuilderScratch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    /// The builder hit a guest memory exception while servicing a cache
    /// miss; `ctx.pc`/`ctx.npc` already point at the handler, no block ran.
    MemoryException,
}

/// Runs the block entered by `ctx.pc`, building and caching it first on a
/// miss.
pub fn execute_one_block(ctx: &mut CoreContext, inputs: DispatchInputs<'_>) -> StepOutcome {
    let DispatchInputs { arena, cache, analyzer, hle, breakpoints, direct_table, runtime, scratch } =
        inputs;

    let pc = ctx.pc;
    let range = match cache.dispatch(pc) {
        Some(range) => range,
        None => {
            let outcome = build_block(
                pc,
                ctx,
                BuildInputs {
                    arena: &mut *arena,
                    cache: &mut *cache,
                    analyzer,
                    hle,
                    breakpoints,
                    direct_table,
                    runtime: &mut *runtime,
                    scratch: &mut *scratch,
                },
            );
            if outcome == BuildOutcome::MemoryException {
                return StepOutcome::MemoryException;
            }
            cache.dispatch(pc).expect("block was just finalized for this pc")
        }
    };

    run_record_chain(arena.slice(range.0, range.1), ctx, runtime);
    StepOutcome::Executed
}

fn run_record_chain(records: &[Record], ctx: &mut CoreContext, runtime: &mut dyn Runtime) {
    let mut i = 0;
    while i < records.len() {
        match (records[i].handler)(&records[i], ctx, runtime) {
            Flow::Continue => i += 1,
            Flow::Terminate => break,
        }
    }
}

/// Executes exactly one block and returns. Does not touch [`Timing`] —
/// single-stepping is a debugger operation and should not consume the
/// scheduler's timeslice accounting the way [`run`]'s loop does.
pub fn single_step(ctx: &mut CoreContext, inputs: DispatchInputs<'_>) -> StepOutcome {
    execute_one_block(ctx, inputs)
}

/// Drives `execute_one_block` until `cpu` reports the guest has stopped
/// running: each timing slice advances `timing` exactly once, then executes
/// blocks until `downcount` goes non-positive or the CPU leaves Running. If
/// `downcount` is already non-positive when a slice begins, that slice
/// executes zero blocks.
pub fn run(
    ctx: &mut CoreContext,
    inputs: DispatchInputs<'_>,
    timing: &mut dyn Timing,
    cpu: &dyn CpuRunState,
) {
    let DispatchInputs { arena, cache, analyzer, hle, breakpoints, direct_table, runtime, scratch } =
        inputs;

    while cpu.is_running() {
        timing.advance();
        while ctx.downcount > 0 && cpu.is_running() {
            let outcome = execute_one_block(
                ctx,
                DispatchInputs {
                    arena: &mut *arena,
                    cache: &mut *cache,
                    analyzer,
                    hle,
                    breakpoints,
                    direct_table,
                    runtime: &mut *runtime,
                    scratch: &mut *scratch,
                },
            );
            if outcome == StepOutcome::MemoryException {
                continue;
            }
        }
    }
}
