// darkroom/src/pipeline/definition.rs

//! `Pipeline<TData, Err>` and the methods used to assemble it.

use crate::error::PipelineError;
use crate::pipeline::context::StepContext;
use crate::pipeline::control::PipelineControl;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed async step handler.
pub type Handler<TData, Err> = Box<
  dyn Fn(StepContext<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// Evaluated right before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct StepDef<TData: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

/// An ordered list of named steps over the context data `TData`.
///
/// Handlers return `Result<PipelineControl, Err>`; engine failures (a required step with no
/// handler) are converted into `Err` through `From<PipelineError>`.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Declares the steps as `(name, optional)` pairs, in execution order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: None,
      })
      .collect();

    Self {
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  fn step_mut(&mut self, step_name: &str) -> Result<&mut StepDef<TData>, PipelineError> {
    self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| PipelineError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  /// Appends a handler to `step_name`.
  ///
  /// The handler's own error type only needs to convert into the pipeline's `Err`.
  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(StepContext<TData>) -> F + Send + Sync + 'static,
  ) -> Result<&mut Self, PipelineError>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.step_mut(step_name)?;
    let handler: Handler<TData, Err> = Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
    Ok(self)
  }

  pub fn skip_if(
    &mut self,
    step_name: &str,
    condition: impl Fn(&TData) -> bool + Send + Sync + 'static,
  ) -> Result<&mut Self, PipelineError> {
    self.step_mut(step_name)?.skip_if = Some(Arc::new(condition));
    Ok(self)
  }
}
