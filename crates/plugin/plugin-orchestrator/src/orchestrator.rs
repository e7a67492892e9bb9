use std::fmt;
use std::sync::Arc;

use llm_client::{LlmClient, RenderSink, StreamAggregator};
use memory_core::ConversationMemory;
use plugin_resolver::CapabilityResolver;
use prompt::ChatMessage;
use tracing::{error, info, instrument, warn};

use crate::{json_excerpt, ActionDescriptor, ActionExecutor, PipelineError, ReplyChannel};

/// Text of a freshly opened reply message before the first render.
pub const PLACEHOLDER: &str = "...";
/// Cap on the API result passed to the synthesis prompt.
pub const RESULT_EXCERPT_CHARS: usize = 1000;
/// Cap on the API result preview posted to the reply channel.
pub const RESULT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Selecting,
    Executing,
    Synthesizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Selecting => "selecting",
            PipelineStage::Executing => "executing",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One incoming user message.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub user_id: String,
    /// Sender's first name; prefixes the persisted user turn when present.
    pub display_name: Option<String>,
    pub text: String,
}

impl QueryRequest {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            text: text.into(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The user turn as it is stored in memory.
    pub fn memory_turn(&self) -> ChatMessage {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => ChatMessage::user(format!("{name}: {}", self.text)),
            _ => ChatMessage::user(self.text.as_str()),
        }
    }
}

struct StageTracker<'a> {
    user_id: &'a str,
    stage: PipelineStage,
}

impl<'a> StageTracker<'a> {
    fn start(user_id: &'a str) -> Self {
        info!(user_id = %user_id, stage = %PipelineStage::Selecting, "Pipeline started");
        Self {
            user_id,
            stage: PipelineStage::Selecting,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        info!(user_id = %self.user_id, from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }

    fn fail(&mut self, err: &PipelineError) {
        error!(user_id = %self.user_id, stage = %self.stage, error = %err, "Pipeline failed");
        self.stage = PipelineStage::Failed;
    }
}

/// Composes the memory store, the aggregator and the plugin resolver into one query pipeline.
pub struct ToolOrchestrator {
    llm: Arc<dyn LlmClient>,
    memory: Arc<ConversationMemory>,
    resolver: Arc<dyn CapabilityResolver>,
    executor: ActionExecutor,
    aggregator: StreamAggregator,
    manifest_url: Option<String>,
}

impl ToolOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        memory: Arc<ConversationMemory>,
        resolver: Arc<dyn CapabilityResolver>,
        executor: ActionExecutor,
    ) -> Self {
        Self {
            llm,
            memory,
            resolver,
            executor,
            aggregator: StreamAggregator::default(),
            manifest_url: None,
        }
    }

    pub fn with_aggregator(mut self, aggregator: StreamAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Routes [`ToolOrchestrator::respond`] through the plugin at `manifest_url`.
    pub fn with_plugin(mut self, manifest_url: impl Into<String>) -> Self {
        self.manifest_url = Some(manifest_url.into());
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Plugin pipeline when a plugin is configured, plain chat otherwise.
    pub async fn respond(
        &self,
        request: &QueryRequest,
        channel: Option<&dyn ReplyChannel>,
    ) -> Result<String, PipelineError> {
        match self.manifest_url.as_deref() {
            Some(manifest_url) => self.answer_with_plugin(manifest_url, request, channel).await,
            None => Ok(self.chat(request, channel).await),
        }
    }

    /// Plain chat: one streamed completion over memory, then persist `[user, assistant]`.
    #[instrument(skip(self, request, channel), fields(user_id = %request.user_id))]
    pub async fn chat(&self, request: &QueryRequest, channel: Option<&dyn ReplyChannel>) -> String {
        let history = self.load_history(&request.user_id).await;
        let messages = prompt::chat_messages(&history, &request.text);
        let reply = self.completion_pass(messages, channel).await;

        self.remember(
            &request.user_id,
            vec![request.memory_turn(), ChatMessage::assistant(reply.as_str())],
        )
        .await;
        reply
    }

    /// Runs the four-stage plugin pipeline and returns the synthesized answer.
    #[instrument(skip(self, request, channel), fields(user_id = %request.user_id))]
    pub async fn answer_with_plugin(
        &self,
        manifest_url: &str,
        request: &QueryRequest,
        channel: Option<&dyn ReplyChannel>,
    ) -> Result<String, PipelineError> {
        let mut run = StageTracker::start(&request.user_id);
        let history = self.load_history(&request.user_id).await;

        let capability = match self.resolver.resolve(manifest_url).await {
            Ok(capability) => capability,
            Err(e) => {
                let err = PipelineError::from(e);
                run.fail(&err);
                return Err(err);
            }
        };
        info!(plugin = %capability.display_name, api_host = %capability.api_host, "Plugin capability loaded");

        let system_prompt = prompt::selection_system_prompt(
            &capability.description_for_model,
            &capability.capability_summary,
        );
        let messages = prompt::selection_messages(&system_prompt, &history, &request.text);
        let selection = self.completion_pass(messages, channel).await;
        info!(selection = %selection, "Plugin selection");

        let action = match ActionDescriptor::parse(&selection) {
            Ok(action) => action,
            Err(source) => {
                let err = PipelineError::ActionParse {
                    raw: selection.clone(),
                    source,
                };
                run.fail(&err);
                self.remember_attempt(request, &selection).await;
                return Err(err);
            }
        };

        run.advance(PipelineStage::Executing);
        let api_result = match self.executor.execute(&capability.api_host, &action).await {
            Ok(value) => value,
            Err(e) => {
                let err = PipelineError::from(e);
                run.fail(&err);
                self.remember_attempt(request, &selection).await;
                return Err(err);
            }
        };
        if let Some(channel) = channel {
            if let Err(e) = channel.post(&json_excerpt(&api_result, RESULT_PREVIEW_CHARS)).await {
                warn!(error = %e, "Failed to post API result preview");
            }
        }

        run.advance(PipelineStage::Synthesizing);
        let excerpt = json_excerpt(&api_result, RESULT_EXCERPT_CHARS);
        let messages = prompt::synthesis_messages(&history, &excerpt, &request.text);
        let answer = self.completion_pass(messages, channel).await;

        run.advance(PipelineStage::Done);
        self.remember(
            &request.user_id,
            vec![
                request.memory_turn(),
                ChatMessage::assistant(selection),
                ChatMessage::assistant(answer.as_str()),
            ],
        )
        .await;
        Ok(answer)
    }

    /// One streamed completion rendered into a newly opened reply message.
    async fn completion_pass(
        &self,
        messages: Vec<ChatMessage>,
        channel: Option<&dyn ReplyChannel>,
    ) -> String {
        let sink: Option<Box<dyn RenderSink>> = match channel {
            Some(channel) => match channel.open(PLACEHOLDER).await {
                Ok(sink) => Some(sink),
                Err(e) => {
                    warn!(error = %e, "Failed to open reply message; streaming without display");
                    None
                }
            },
            None => None,
        };

        let text = self
            .aggregator
            .aggregate(self.llm.stream(messages), sink.as_deref())
            .await;

        if let Some(sink) = &sink {
            if let Err(e) = sink.render_final(&text).await {
                warn!(error = %e, "Final render failed");
            }
        }
        text
    }

    async fn load_history(&self, user_id: &str) -> Vec<ChatMessage> {
        match self.memory.recent(user_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to read memory; continuing without history");
                Vec::new()
            }
        }
    }

    async fn remember_attempt(&self, request: &QueryRequest, selection: &str) {
        self.remember(
            &request.user_id,
            vec![request.memory_turn(), ChatMessage::assistant(selection)],
        )
        .await;
    }

    async fn remember(&self, user_id: &str, turns: Vec<ChatMessage>) {
        if let Err(e) = self.memory.append(user_id, turns).await {
            error!(user_id = %user_id, error = %e, "Failed to persist conversation turns");
        }
    }
}
