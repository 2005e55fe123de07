// darkroom/src/pipeline/mod.rs

//! A small named-step engine used to run multi-step shop workflows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step holds zero or more async
//! handlers that receive a shared [`StepContext`] and answer with a [`PipelineControl`].
//! Steps can be optional (skipped when nothing handles them) or carry a skip condition
//! evaluated against the context right before the step would run.

pub mod context;
pub mod control;
pub mod definition;
pub mod execution;

pub use context::StepContext;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline, SkipCondition, StepDef};
