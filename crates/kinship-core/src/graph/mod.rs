//! In-memory kinship graph: adjacency index, parent-cycle detection, and
//! shortest-path search.
//!
//! All graph code operates on a snapshot of one family's edges loaded by
//! [`crate::db::query::load_relationships`]. Graphs are immutable once
//! built; rebuild after a mutation.

pub mod cycles;
pub mod detect;
pub mod index;

pub use cycles::parent_cycle_on_add;
pub use detect::{Hop, PathSearch, RelationPath, shortest_path};
pub use index::{EdgeDirection, FamilyGraph, Neighbor};
