/*!
handlers.rs - The fixed handler table.

Every handler shares [`crate::record::HandlerFn`]'s signature and returns a
[`Flow`] telling [`crate::dispatch`]'s driver loop whether to advance to the
next record or stop. A classic threaded interpreter tail-calls
`self[1].fn(...)` directly; here each handler returns `Flow::Continue` and
lets the caller advance, since Rust gives no tail-call guarantee.

The curated per-opcode `Direct<op>` family lives at the bottom of this file,
generated by [`define_direct_handler`] — one small function per curated
opcode, each skipping straight to that opcode's semantic without going
through [`crate::collaborators::Runtime::lookup_semantic`]. [`Indirect`]
is the fallback for every opcode *not* in the curated set: it carries the
resolved semantic function pointer in the record itself (`thunk`).
*/

use crate::collaborators::Runtime;
use crate::context::{CoreContext, Exceptions};
use crate::record::{Flow, Record};

pub fn return_(_rec: &Record, _ctx: &mut CoreContext, _rt: &mut dyn Runtime) -> Flow {
    Flow::Terminate
}

/// `data` = guest address A. `pc <- A; npc <- A + 4`.
pub fn write_pc(rec: &Record, ctx: &mut CoreContext, _rt: &mut dyn Runtime) -> Flow {
    let a = rec.data as u32;
    ctx.pc = a;
    ctx.npc = a.wrapping_add(4);
    Flow::Continue
}

/// `data` = guest address A. `npc <- A`. Emitted once at the end of a block
/// whose analyzer-determined fallthrough differs from sequential execution.
pub fn write_broken_block_npc(rec: &Record, ctx: &mut CoreContext, _rt: &mut dyn Runtime) -> Flow {
    ctx.npc = rec.data as u32;
    Flow::Continue
}

/// `data` = HLE hook index. Dispatches the registered HLE function.
pub fn hle_bridge(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    let f = rt.hle_semantic();
    f(rt, ctx, rec.data);
    Flow::Continue
}

/// `data` = raw opcode word. `thunk` = the resolved semantic. No table
/// lookup: the function pointer already lives in the record.
pub fn indirect(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    let thunk = rec.thunk.expect("Indirect record built without a thunk");
    thunk(rt, ctx, rec.data);
    Flow::Continue
}

/// `data` = cumulative cycles C. `pc <- npc`, `downcount -= C`, perf monitor
/// updated with (C instructions, 0, 0).
pub fn end_block(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    let cycles = rec.data;
    ctx.pc = ctx.npc;
    ctx.downcount -= cycles as i64;
    rt.update_performance_monitor(cycles as u32, 0, 0);
    Flow::Continue
}

/// `data` = load/store count N. Perf-monitor update (0, N, 0).
pub fn update_ls(rec: &Record, _ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    rt.update_performance_monitor(0, rec.data as u32, 0);
    Flow::Continue
}

/// `data` = floating-point instruction count N. Perf-monitor update (0, 0, N).
pub fn update_fp(rec: &Record, _ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    rt.update_performance_monitor(0, 0, rec.data as u32);
    Flow::Continue
}

/// `data` = cumulative cycles C (inclusive of the instruction this guard
/// protects). If MSR.FP is clear, raises
/// `FPU_UNAVAILABLE`, runs the exception check, charges `downcount`, and
/// terminates the chain.
pub fn check_fpu(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    if ctx.msr_fp {
        return Flow::Continue;
    }
    ctx.raise(Exceptions::FPU_UNAVAILABLE);
    rt.check_exceptions(ctx);
    ctx.downcount -= rec.data as i64;
    Flow::Terminate
}

/// `data` = cumulative cycles C. If a `DSI` exception is pending, runs the
/// exception check, charges `downcount`, and terminates.
pub fn check_dsi(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    if !ctx.has_pending(Exceptions::DSI) {
        return Flow::Continue;
    }
    rt.check_exceptions(ctx);
    ctx.downcount -= rec.data as i64;
    Flow::Terminate
}

/// `data` = cumulative cycles C. If a `PROGRAM` exception is pending, runs
/// the exception check, charges `downcount`, and terminates.
pub fn check_pe(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    if !ctx.has_pending(Exceptions::PROGRAM) {
        return Flow::Continue;
    }
    rt.check_exceptions(ctx);
    ctx.downcount -= rec.data as i64;
    Flow::Terminate
}

/// `data` = cumulative cycles C. Invokes the breakpoint check; if the CPU
/// is no longer running as a result, charges `downcount` and terminates.
pub fn check_breakpoint(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    if rt.check_breakpoints(ctx) {
        return Flow::Continue;
    }
    ctx.downcount -= rec.data as i64;
    Flow::Terminate
}

/// `data` = block-start PC B. If the block branched back to itself
/// (`npc == B`), notifies the timing collaborator to skip idle cycles.
pub fn check_idle(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
    if ctx.npc == rec.data as u32 {
        rt.idle();
    }
    Flow::Continue
}

/// The curated set of opcodes specialized into their own `Direct<op>`
/// handler: branches, syscall, all single- and double-precision FP
/// arithmetic and comparisons, integer
/// arithmetic/logical/rotate/shift, compare, and trap immediate. Widening or
/// narrowing this set is a performance tuning knob, not a correctness one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum CuratedOp {
    Bx,
    Bcx,
    Bclrx,
    Bcctrx,
    Sc,
    Addx,
    Subfx,
    Mulli,
    Andx,
    Orx,
    Xorx,
    Rlwinmx,
    Srawx,
    Cmpx,
    Twi,
    Faddsx,
    Faddx,
    Fmulsx,
    Fmulx,
    Fcmpo,
}

impl CuratedOp {
    pub const ALL: [CuratedOp; 20] = [
        CuratedOp::Bx,
        CuratedOp::Bcx,
        CuratedOp::Bclrx,
        CuratedOp::Bcctrx,
        CuratedOp::Sc,
        CuratedOp::Addx,
        CuratedOp::Subfx,
        CuratedOp::Mulli,
        CuratedOp::Andx,
        CuratedOp::Orx,
        CuratedOp::Xorx,
        CuratedOp::Rlwinmx,
        CuratedOp::Srawx,
        CuratedOp::Cmpx,
        CuratedOp::Twi,
        CuratedOp::Faddsx,
        CuratedOp::Faddx,
        CuratedOp::Fmulsx,
        CuratedOp::Fmulx,
        CuratedOp::Fcmpo,
    ];
}

/// Generates a `Direct<op>` handler: fetch the curated semantic straight
/// from the runtime (no opcode lookup) and invoke it with this record's
/// operand.
macro_rules! define_direct_handler {
    ($name:ident, $op:expr) => {
        pub fn $name(rec: &Record, ctx: &mut CoreContext, rt: &mut dyn Runtime) -> Flow {
            let f = rt.curated($op);
            f(rt, ctx, rec.data);
            Flow::Continue
        }
    };
}

define_direct_handler!(direct_bx, CuratedOp::Bx);
define_direct_handler!(direct_bcx, CuratedOp::Bcx);
define_direct_handler!(direct_bclrx, CuratedOp::Bclrx);
define_direct_handler!(direct_bcctrx, CuratedOp::Bcctrx);
define_direct_handler!(direct_sc, CuratedOp::Sc);
define_direct_handler!(direct_addx, CuratedOp::Addx);
define_direct_handler!(direct_subfx, CuratedOp::Subfx);
define_direct_handler!(direct_mulli, CuratedOp::Mulli);
define_direct_handler!(direct_andx, CuratedOp::Andx);
define_direct_handler!(direct_orx, CuratedOp::Orx);
define_direct_handler!(direct_xorx, CuratedOp::Xorx);
define_direct_handler!(direct_rlwinmx, CuratedOp::Rlwinmx);
define_direct_handler!(direct_srawx, CuratedOp::Srawx);
define_direct_handler!(direct_cmpx, CuratedOp::Cmpx);
define_direct_handler!(direct_twi, CuratedOp::Twi);
define_direct_handler!(direct_faddsx, CuratedOp::Faddsx);
define_direct_handler!(direct_faddx, CuratedOp::Faddx);
define_direct_handler!(direct_fmulsx, CuratedOp::Fmulsx);
define_direct_handler!(direct_fmulx, CuratedOp::Fmulx);
define_direct_handler!(direct_fcmpo, CuratedOp::Fcmpo);

/// Pairs each curated opcode with its generated `Direct<op>` handler; this
/// is the raw material [`crate::direct_table::DirectDispatchTable::build`]
/// sorts into a binary-searchable table.
pub const DIRECT_HANDLERS: [(CuratedOp, crate::record::HandlerFn); 20] = [
    (CuratedOp::Bx, direct_bx),
    (CuratedOp::Bcx, direct_bcx),
    (CuratedOp::Bclrx, direct_bclrx),
    (CuratedOp::Bcctrx, direct_bcctrx),
    (CuratedOp::Sc, direct_sc),
    (CuratedOp::Addx, direct_addx),
    (CuratedOp::Subfx, direct_subfx),
    (CuratedOp::Mulli, direct_mulli),
    (CuratedOp::Andx, direct_andx),
    (CuratedOp::Orx, direct_orx),
    (CuratedOp::Xorx, direct_xorx),
    (CuratedOp::Rlwinmx, direct_rlwinmx),
    (CuratedOp::Srawx, direct_srawx),
    (CuratedOp::Cmpx, direct_cmpx),
    (CuratedOp::Twi, direct_twi),
    (CuratedOp::Faddsx, direct_faddsx),
    (CuratedOp::Faddx, direct_faddx),
    (CuratedOp::Fmulsx, direct_fmulsx),
    (CuratedOp::Fmulx, direct_fmulx),
    (CuratedOp::Fcmpo, direct_fcmpo),
];
