//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`. Callers go through
//! `Database::with_conn` so no lock outlives a single call.

mod audit;
mod finding;
mod invocation;
mod job;

pub use audit::*;
pub use finding::*;
pub use invocation::*;
pub use job::*;
