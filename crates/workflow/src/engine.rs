use analysis::Analyzer;
use intent::IntentClassifier;
use retrieve::{DatasetRetriever, EntityResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::DataSource;
use tracing::{debug, info};
use uuid::Uuid;

use crate::checkpoint::CheckpointStore;
use crate::format::ResponseOutput;
use crate::stages::{Stage, StageContext, next_stage};
use crate::state::{Message, Role, StateUpdate, WorkflowState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub history: Vec<IncomingMessage>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub trace: Vec<Stage>,
    pub state: WorkflowState,
    pub output: ResponseOutput,
}

/// Drives a request through the stage graph. Never fails: every problem
/// ends up as an error payload in the output.
pub struct WorkflowEngine {
    context: StageContext,
    checkpoints: Option<CheckpointStore>,
}

impl WorkflowEngine {
    pub fn new(source: Arc<dyn DataSource>, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            context: StageContext {
                classifier,
                resolver: EntityResolver::new(source.clone()),
                retriever: DatasetRetriever::new(source),
                analyzer: Analyzer::new(),
            },
            checkpoints: None,
        }
    }

    pub fn with_checkpoints(mut self, checkpoints: CheckpointStore) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    pub fn classifier_mode(&self) -> &'static str {
        self.context.classifier.mode()
    }

    pub fn checkpoints(&self) -> Option<&CheckpointStore> {
        self.checkpoints.as_ref()
    }

    pub async fn run(&self, request: QueryRequest) -> RunOutcome {
        let state = self.initial_state(&request);
        let outcome = self.run_state(state).await;

        if let (Some(store), Some(thread_id)) = (&self.checkpoints, &request.thread_id) {
            store.save(thread_id, outcome.state.messages.clone());
        }

        outcome
    }

    /// Run the stage graph from `RouteQuery` over a prepared state.
    pub async fn run_state(&self, mut state: WorkflowState) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let mut trace = Vec::new();
        let mut stage = Some(Stage::RouteQuery);

        while let Some(current) = stage {
            debug!(run_id = %run_id, stage = %current, "Entering stage");
            let update = self.context.run(current, &state).await;
            state.apply(update);
            trace.push(current);
            stage = next_stage(current, &state);
        }

        let output = state
            .output
            .clone()
            .unwrap_or_else(|| ResponseOutput::unknown_error("The workflow produced no output"));

        info!(
            run_id = %run_id,
            status = output.status(),
            stages = trace.len(),
            company = state.company_name.as_deref().unwrap_or(""),
            "Workflow finished"
        );

        RunOutcome {
            run_id,
            trace,
            state,
            output,
        }
    }

    /// Run one stage against a state without applying it.
    pub async fn stage_update(&self, stage: Stage, state: &WorkflowState) -> StateUpdate {
        self.context.run(stage, state).await
    }

    fn initial_state(&self, request: &QueryRequest) -> WorkflowState {
        let mut state = WorkflowState::default();

        let mut messages = match (&self.checkpoints, &request.thread_id) {
            (Some(store), Some(thread_id)) => store.load(thread_id),
            _ => Vec::new(),
        };
        messages.extend(request.history.iter().map(|m| {
            Message::new(
                m.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                m.role,
                m.content.clone(),
            )
        }));

        let query = request.query.trim();
        if !query.is_empty() {
            messages.push(Message::new(Uuid::new_v4().to_string(), Role::User, query));
            state.current_query = Some(query.to_string());
        }

        state.apply(StateUpdate {
            messages,
            ..Default::default()
        });
        state
    }
}
