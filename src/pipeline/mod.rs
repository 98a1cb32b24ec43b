//! The agent orchestration and review pipeline.
//!
//! Leaves first: `access` and `evidence` gate what agents may read and
//! what they may claim; `agents` do the per-document analysis through the
//! opaque `generation` capability; `cross_document` and `reviewer` work
//! over the accepted findings; `orchestrator` drives a job through all of
//! it and writes the `audit` trail.

pub mod access;
pub mod agents;
pub mod audit;
pub mod collaborators;
pub mod cross_document;
pub mod error;
pub mod evidence;
pub mod generation;
pub mod orchestrator;
pub mod reviewer;
pub mod safety;

pub use error::PipelineError;
pub use orchestrator::Orchestrator;
