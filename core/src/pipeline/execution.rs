// darkroom/src/pipeline/execution.rs

use crate::error::PipelineError;
use crate::pipeline::context::StepContext;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx`.
  ///
  /// The first handler error aborts the run and is returned unchanged.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx: StepContext<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond) = &step_def.skip_if {
        let skip = {
          let guard = ctx.read();
          skip_cond(&*guard)
        };
        if skip {
          step_span.in_scope(|| event!(Level::INFO, "Step skipped by its condition."));
          continue;
        }
      }

      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          continue;
        }
        _ => {
          step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
          return Err(Err::from(PipelineError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let handler_span = span!(parent: &step_span, Level::DEBUG, "step_handler", handler_index = handler_idx);
        match handler_fn(ctx.clone()).instrument(handler_span).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            step_span.in_scope(|| event!(Level::INFO, "Pipeline stopped by a handler."));
            return Ok(PipelineResult::Stopped);
          }
          Err(e) => {
            step_span.in_scope(|| event!(Level::ERROR, error = %e, "Step handler failed."));
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, "Pipeline run completed.");
    Ok(PipelineResult::Completed)
  }
}
