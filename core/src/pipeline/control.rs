// darkroom/src/pipeline/control.rs

/// Answer of a handler: keep going or halt the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Stop immediately. Remaining handlers of this step and all later steps are not run.
  Stop,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step was run or legitimately skipped.
  Completed,
  /// A handler returned [`PipelineControl::Stop`].
  Stopped,
}
