//! Domain model, cost estimator, and use cases for the pipeline
//! execution core: a durable, multi-tenant orchestrator that advances a
//! task through four fixed AI-generation stages, one step at a time.
//!
//! This crate has no dependency on a concrete datastore. Persistence and
//! collaborator implementations live in `pipeline-db` (for PostgreSQL)
//! or are supplied by the caller; this crate only defines the ports
//! they implement (see [`ports`]) and the use cases written against
//! them (see [`usecases`]).

pub mod clock;
pub mod cost;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

#[cfg(test)]
pub mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::PipelineError;
