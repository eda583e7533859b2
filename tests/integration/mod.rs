//! Integration test modules for Aeolus
//!
//! - stops: Activation lifecycle and notification coalescing
//! - tremulant: Toggle semantics
//! - midi: Routing masks and note delivery
//! - retune: Newest-wins publication and audio continuity
//! - lifecycle: Startup, listeners, instances and shutdown

pub mod lifecycle;
pub mod stops;
pub mod tremulant;
