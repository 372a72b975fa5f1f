//! Shared types, error model, and configuration for BidFlow.
//!
//! This crate is the foundation depended on by all other BidFlow crates.
//! It provides:
//! - [`BidFlowError`]: the unified error type
//! - Domain types ([`Vault`], [`Document`], [`Profile`], [`PipelineResult`], [`SessionId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ContextConfig, ContextStrategy, ExportConfig, LlmConfig, ProfileConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_api_key,
    validate_config,
};
pub use error::{BidFlowError, Result};
pub use types::{
    Document, PipelineResult, Profile, ProfileSource, SessionId, TaskOutput, UploadedFile, Vault,
    source_header,
};
