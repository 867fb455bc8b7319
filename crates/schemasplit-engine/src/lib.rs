//! schemasplit engine - Group assignment and output stages
//!
//! This crate implements the stages after dependency resolution:
//! - Group assignment with line budgets and cascading
//! - Seed separation
//! - Output and log writing
//! - Output validation
//! - Stage orchestration

pub mod log;
pub mod assign;
pub mod seed;
pub mod output;
pub mod validate;
pub mod pipeline;

pub use log::{LogEvent, ReassignmentLog};
pub use assign::{AssignError, Assignment, GroupAssignor, GroupState, Placement};
pub use seed::{SeedCollection, SEED_HEADER};
pub use output::{digest, write_outputs, WrittenFile};
pub use validate::{GroupFile, OutputSnapshot, SchemaValidator, ValidateError, ValidationResult, VALIDATION_REPORT_FILE};
pub use pipeline::{EngineError, Pipeline, RunOutcome, SplitOutcome, SPLIT_REPORT_FILE};
