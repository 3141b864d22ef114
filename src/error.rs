//! The one genuine Rust-level error boundary in this core: construction-time
//! validation. Everything else flows through the guest exception path, not
//! `Result`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("record arena capacity must be nonzero")]
    ZeroCapacity,
    #[error("record arena safety margin must be smaller than its capacity")]
    MarginExceedsCapacity,
    #[error("direct-dispatch table has two curated opcodes resolving to the same semantic function")]
    DuplicateDirectEntry,
}
