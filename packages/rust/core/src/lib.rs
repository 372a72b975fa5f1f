//! Agent orchestration and session logic for BidFlow.
//!
//! This crate turns a Vault and a business profile into a tender
//! decomposition (Pipeline A) and weighted responses (Pipeline B), keeps the
//! per-session state between the two, and exports the final submission.

pub mod agent;
pub mod context;
pub mod crew;
pub mod export;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod session;
pub mod weighting;
pub mod workbench;

#[cfg(test)]
mod testing;

pub use crew::{ProgressReporter, SilentProgress};
pub use pipeline::PipelineConfig;
pub use session::{Session, SessionStore, VaultChange};
pub use workbench::Workbench;
