use plugin_resolver::ResolutionError;
use thiserror::Error;

use crate::{ActionParseError, ExecutionError, PipelineStage};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Plugin resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    /// Stage-1 text did not match the action grammar; `raw` is shown to the user as-is.
    #[error("Model did not choose an action: {source}")]
    ActionParse {
        raw: String,
        #[source]
        source: ActionParseError,
    },
    #[error("Plugin call failed: {0}")]
    Execution(#[from] ExecutionError),
}

impl PipelineError {
    /// Stage the pipeline was in when it failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Resolution(_) | PipelineError::ActionParse { .. } => {
                PipelineStage::Selecting
            }
            PipelineError::Execution(_) => PipelineStage::Executing,
        }
    }

    /// Text to show the user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ActionParse { raw, .. } => raw.clone(),
            PipelineError::Resolution(_) => {
                "Sorry, the plugin is not available right now.".to_string()
            }
            PipelineError::Execution(e) => format!("Sorry, the plugin call failed: {e}"),
        }
    }
}
