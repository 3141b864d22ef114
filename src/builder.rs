/*!
builder.rs - The block builder.

Given a guest entry PC, decodes a straight-line run of instructions via the
[`Analyzer`] collaborator and emits a flat run of handler [`Record`]s into
the [`RecordArena`], interleaving guard records around each instruction
according to the analyzer's flags, the HLE probe, and debugger state. The
ordering here is load-bearing: `WritePC` precedes any guard that might
surface a fault to the guest; `CheckFPU` gates execution of the instruction
it protects; `CheckDSI` and `CheckPE` follow it; idle-loop detection runs
after the branch has logically committed but before end-of-block
accounting.
*/

use crate::arena::RecordArena;
use crate::block::{BlockDescriptor, BuilderScratch};
use crate::collaborators::{
    Analyzer, BlockCacheBackend, BreakpointRegistry, DecodedInstruction, Hle, HleKind, Runtime,
};
use crate::context::{CoreContext, Exceptions};
use crate::direct_table::DirectDispatchTable;
use crate::handlers as h;
use crate::record::Record;

/// A block cannot grow past this many decoded instructions; it bounds the
/// analyzer's per-instruction buffer independently of arena capacity.
pub const MAX_BLOCK_INSTRUCTIONS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    /// The analyzer hit a guest memory exception; no block was produced.
    /// `ctx.pc`/`ctx.npc` have already been redirected by the exception
    /// check, and the dispatch loop should simply retry.
    MemoryException,
}

/// Everything the builder borrows from the rest of the system for the
/// duration of one `build_block` call (bundled so the function signature
/// doesn't grow every time a new collaborator shows up).
pub struct BuildInputs<'a> {
    pub arena: &'a mut RecordArena,
    pub cache: &'a mut dyn BlockCacheBackend,
    pub analyzer: &'a dyn Analyzer,
    pub hle: &'a dyn Hle,
    pub breakpoints: &'a dyn BreakpointRegistry,
    pub direct_table: &'a DirectDispatchTable,
    pub runtime: &'a mut dyn Runtime,
    pub scratch: &'a mut BuilderScratch,
}

pub fn build_block(pc: u32, ctx: &mut CoreContext, inputs: BuildInputs<'_>) -> BuildOutcome {
    let BuildInputs { arena, cache, analyzer, hle, breakpoints, direct_table, runtime, scratch } =
        inputs;

    // 1. Arena pressure / caching disabled -> clear arena and block cache together.
    let cfg = *runtime.config();
    if cfg.no_block_cache || arena.near_capacity() {
        arena.clear();
        cache.clear();
    }

    // 2. Decode the block.
    let mut meta = crate::collaborators::BlockMeta::default();
    let mut instructions: Vec<DecodedInstruction> = Vec::new();
    let fallthrough_npc = analyzer.analyze(pc, &mut meta, &mut instructions, MAX_BLOCK_INSTRUCTIONS);

    if meta.memory_exception {
        ctx.npc = fallthrough_npc;
        ctx.raise(Exceptions::ISI);
        runtime.check_exceptions(ctx);
        log::warn!("analyzer reported a memory exception building a block at {pc:#010x}");
        return BuildOutcome::MemoryException;
    }

    // 3. Allocate the descriptor; reset per-block scratch.
    let handle = cache.allocate(pc);
    let start = arena.len();
    scratch.reset(pc);

    let mut emitted_end_block = false;
    let mut terminated_early = false;

    // 4. Emit one group of records per decoded instruction.
    for inst in &instructions {
        scratch.downcount_amount += inst.num_cycles as u64;
        if inst.load_store {
            scratch.num_load_store += 1;
        }
        if inst.use_fpu {
            scratch.num_floating_point += 1;
        }

        // 4b. HLE probe.
        if let Some(probe) = hle.probe(inst.address) {
            arena.push(Record::new(h::write_pc, inst.address as u64));
            arena.push(Record::new(h::hle_bridge, probe.hook_index));
            if probe.kind == HleKind::Replace {
                arena.push(Record::new(h::end_block, scratch.downcount_amount));
                arena.push(Record::new(h::return_, 0));
                terminated_early = true;
                break;
            }
            continue;
        }

        // 4c. Analyzer folded this instruction away.
        if inst.skip {
            continue;
        }

        // 4d. The five guard booleans.
        let check_fpu = inst.use_fpu && !scratch.fpu_guarded;
        let endblock = inst.end_block;
        let memcheck = inst.load_store && cfg.memcheck_enabled;
        let check_pe = !endblock && (cfg.should_handle_fp_exception)(inst);
        let breakpoint = cfg.debugging_enabled && breakpoints.is_set(inst.address);

        // 4e. WritePC precedes whichever guard might surface to the guest.
        if check_fpu || endblock || memcheck || check_pe || breakpoint {
            arena.push(Record::new(h::write_pc, inst.address as u64));
        }

        // 4f.
        if breakpoint {
            arena.push(Record::new(h::check_breakpoint, scratch.downcount_amount));
        }
        // 4g.
        if check_fpu {
            arena.push(Record::new(h::check_fpu, scratch.downcount_amount));
            scratch.fpu_guarded = true;
        }

        // 4h. Emit the instruction itself.
        let semantic = runtime.lookup_semantic(inst.opcode);
        match direct_table.lookup(semantic) {
            Some(direct_handler) => {
                arena.push(Record::new(direct_handler, inst.opcode as u64));
            }
            None => {
                arena.push(Record::with_thunk(h::indirect, inst.opcode as u64, semantic));
            }
        }

        // 4i.
        if memcheck {
            arena.push(Record::new(h::check_dsi, scratch.downcount_amount));
        }
        // 4j.
        if check_pe {
            arena.push(Record::new(h::check_pe, scratch.downcount_amount));
        }
        // 4k.
        if inst.branch_is_idle_loop {
            arena.push(Record::new(h::check_idle, scratch.block_start_pc as u64));
        }
        // 4l.
        if endblock {
            arena.push(Record::new(h::end_block, scratch.downcount_amount));
            emit_counters(arena, scratch);
            emitted_end_block = true;
        }
    }

    if !terminated_early {
        // 5. A block that never naturally ended still needs its trailer;
        // if the analyzer flagged it broken, the NPC correction comes first.
        if !emitted_end_block {
            if meta.broken {
                arena.push(Record::new(h::write_broken_block_npc, fallthrough_npc as u64));
            }
            arena.push(Record::new(h::end_block, scratch.downcount_amount));
            emit_counters(arena, scratch);
        }
        // 6. Terminal Return.
        arena.push(Record::new(h::return_, 0));
    }

    // 7. Finalize and register.
    let end = arena.len();
    let desc = BlockDescriptor {
        entry_pc: pc,
        start,
        end,
        num_instructions: meta.num_instructions,
        physical_addresses: meta.physical_addresses,
    };
    cache.finalize(handle, desc);

    BuildOutcome::Built
}

fn emit_counters(arena: &mut RecordArena, scratch: &BuilderScratch) {
    if scratch.num_load_store > 0 {
        arena.push(Record::new(h::update_ls, scratch.num_load_store as u64));
    }
    if scratch.num_floating_point > 0 {
        arena.push(Record::new(h::update_fp, scratch.num_floating_point as u64));
    }
}
