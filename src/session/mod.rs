//! Run sessions and run contexts
//!
//! A root run owns one `RunSession`. Every nested invocation gets its own
//! `RunContext`, a path into the run tree that shares the root's session.

pub mod run_context;
pub mod session;

pub use run_context::{format_run_path, same_lineage, RunContext, RunContextSnapshot, RunStep};
pub use session::{PendingInterrupt, RunSession, SessionSnapshot};
