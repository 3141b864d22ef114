#![doc = r#"
Threaded-code interpreter core for a PowerPC CPU emulator backend.

This crate is the dispatch engine only: it decodes straight-line runs of
guest instructions into a flat array of handler records and walks them. It
has no opinion on how the guest's address space, HLE table, debugger, or
scheduler are implemented — those are narrow collaborator traits in
`collaborators`, satisfied by whatever interpreter/recompiler project
embeds this crate.

Modules:
- record: the threaded-code handler record and its `Flow` result
- context: the guest register file the handler table mutates
- collaborators: external-system traits this core is built against
- handlers: the fixed handler table, including the curated `Direct<op>` family
- direct_table: the semantic-function-to-handler lookup table
- error: the one Rust-level error boundary (construction-time validation)
- arena: the flat, append-only record buffer
- block: block descriptors and per-block builder scratch state
- builder: decodes a block and emits its records
- dispatch: the driver loop and `ExecuteOneBlock`/`SingleStep`/`Run`
- backend: `ThreadedInterpreter`, the lifecycle façade

`testkit` (test-only) supplies minimal fakes for every collaborator trait.
"#]

pub mod arena;
pub mod backend;
pub mod block;
pub mod builder;
pub mod collaborators;
pub mod context;
pub mod direct_table;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod record;

pub use backend::ThreadedInterpreter;
pub use context::{CoreContext, Exceptions};
pub use error::BuildError;

#[cfg(test)]
pub mod testkit;
