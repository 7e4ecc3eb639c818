pub mod core;
pub mod runtime;
pub mod session;

// Agent abstractions and the workflow agent built on them
pub mod agent;
pub mod workflow;

// Persistence of interrupted runs
pub mod checkpoint;
pub mod serialization;

// Optional components
pub mod logging;

#[cfg(test)]
mod test_support;
