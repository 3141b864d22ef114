//! The direct-dispatch table: a static mapping from a curated opcode's
//! *semantic function identity* to its specialized `Direct<op>` handler,
//! sorted once at construction so lookups at build time are a binary
//! search.

use crate::collaborators::{Runtime, SemanticFn};
use crate::error::BuildError;
use crate::handlers::DIRECT_HANDLERS;
use crate::record::HandlerFn;

#[derive(Debug)]
struct Entry {
    key: usize,
    handler: HandlerFn,
}

#[derive(Debug)]
pub struct DirectDispatchTable {
    entries: Vec<Entry>,
}

impl DirectDispatchTable {
    /// Builds the table once, querying `runtime` for each curated opcode's
    /// semantic function. Fails if two curated opcodes resolve to the same
    /// semantic, which would otherwise silently shadow one entry behind the
    /// other.
    pub fn build(runtime: &dyn Runtime) -> Result<Self, BuildError> {
        let mut entries: Vec<Entry> = DIRECT_HANDLERS
            .iter()
            .map(|(op, handler)| Entry { key: runtime.curated(*op) as usize, handler: *handler })
            .collect();
        entries.sort_by_key(|e| e.key);
        for pair in entries.windows(2) {
            if pair[0].key == pair[1].key {
                return Err(BuildError::DuplicateDirectEntry);
            }
        }
        Ok(Self { entries })
    }

    /// Returns the specialized handler for `semantic`, if it is one of the
    /// curated opcodes; `None` means the caller should fall back to
    /// [`crate::handlers::indirect`].
    pub fn lookup(&self, semantic: SemanticFn) -> Option<HandlerFn> {
        let key = semantic as usize;
        self.entries.binary_search_by_key(&key, |e| e.key).ok().map(|i| self.entries[i].handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
