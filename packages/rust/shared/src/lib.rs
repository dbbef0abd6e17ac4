//! Shared types, error model, and configuration for atplan.
//!
//! This crate is the foundation depended on by all other atplan crates.
//! It provides:
//! - [`AtplanError`]: the unified error type
//! - Domain types ([`RawTable`], [`WeekSlot`], [`CurriculumDocument`], [`DocumentIdentity`])
//! - Configuration ([`AppConfig`], [`BatchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchConfig, BatchSection, DefaultsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{AtplanError, Result};
pub use types::{
    CurriculumDocument, DocumentIdentity, RawTable, TermBlock, WeekRecord, WeekSlot,
};
