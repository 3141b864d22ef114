//! `CoreContext` — the mutable guest register file this core reads and
//! writes. Everything architecturally visible that the handler table
//! touches lives here; address-space contents, the analyzer, and the
//! interpreter's semantic execution live behind the [`crate::collaborators`]
//! traits instead.

use bitflags::bitflags;

bitflags! {
    /// Pending-exception bits the guard handlers test and the guest
    /// exception machinery consumes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Exceptions: u32 {
        const ISI             = 0b0001;
        const DSI             = 0b0010;
        const PROGRAM         = 0b0100;
        const FPU_UNAVAILABLE = 0b1000;
    }
}

/// Guest register file mutated by the handler table.
#[derive(Debug, Clone, Copy)]
pub struct CoreContext {
    pub pc: u32,
    pub npc: u32,
    /// Signed cycle budget; the outer loop yields to the scheduler once this
    /// drops to zero or below.
    pub downcount: i64,
    /// MSR.FP — floating point available.
    pub msr_fp: bool,
    pub exceptions: Exceptions,
}

impl CoreContext {
    pub fn new(pc: u32) -> Self {
        Self { pc, npc: pc.wrapping_add(4), downcount: 0, msr_fp: true, exceptions: Exceptions::empty() }
    }

    #[inline]
    pub fn raise(&mut self, ex: Exceptions) {
        self.exceptions |= ex;
    }

    #[inline]
    pub fn has_pending(&self, ex: Exceptions) -> bool {
        self.exceptions.intersects(ex)
    }
}
