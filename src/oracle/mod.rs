//! Structural equivalence oracle boundary.
//!
//! The oracle compares two code fragments at the syntax-tree level and reports
//! which nodes match and which were edited. Calls are synchronous and may be
//! slow (a process or container spawn per pair); failures surface as
//! [`FixmineError::Oracle`](crate::core::errors::FixmineError::Oracle) so the
//! caller can skip the hunk.

pub mod gumtree;
pub mod scripted;
pub mod wire;

use crate::core::errors::Result;

pub use gumtree::GumTreeOracle;
pub use scripted::ScriptedOracle;
pub use wire::{
    ActionKind, EditAction, NodeDescriptor, NodeKind, Span, StructuralDiff, StructuralMatch,
};

/// Produces a structural diff between two fragments.
pub trait StructuralOracle: Send + Sync {
    /// Compare `condition` against `consequent`, both given as source lines in
    /// the language identified by `language`.
    fn diff(
        &self,
        language: &str,
        condition: &[String],
        consequent: &[String],
    ) -> Result<StructuralDiff>;
}
