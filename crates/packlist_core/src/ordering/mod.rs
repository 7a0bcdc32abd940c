//! Stable reordering engine for position-ordered sibling sets.
//!
//! # Responsibility
//! - Compute single-element moves over an ordered id sequence (`sequencer`).
//! - Define what "siblings" means per entity kind (`scope`).
//! - Orchestrate validate -> load -> reorder -> persist (`coordinator`).
//!
//! # Invariants
//! - After a successful, uncontended move the sibling set's positions are
//!   exactly `0..n-1`.
//! - Sibling loads rely only on the relative order of stored positions, so
//!   gaps or ties left by earlier failures are healed by the next move.
//! - Access is checked before any position is written.

pub mod access;
pub mod coordinator;
pub mod scope;
pub mod sequencer;

pub use access::AccessPolicy;
pub use coordinator::{MoveCoordinator, MoveError};
pub use scope::{positions_are_dense, ScopeBinding, ScopeResolver, SiblingPosition};
pub use sequencer::{reorder, ReorderError};
