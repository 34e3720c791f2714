//! PostgreSQL persistence for the pipeline execution core.
//!
//! Implements the repository ports defined in `pipeline_core::ports`
//! against a concrete Postgres schema (see `migrations/`), plus the
//! connection and migration plumbing (`config`, `pool`) used by the CLI
//! and test harness to stand up a database.

pub mod config;
pub mod models;
pub mod pool;
pub mod repositories;

pub use config::DbConfig;
pub use pool::{create_pool, default_migrations_path, ensure_database_exists, run_migrations};
