use analysis::{AnalysisResult, ErrorKind};
use intent::{AnalysisType, QueryType};
use retrieve::DatasetBundle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use store::EntityRecord;

use crate::format::ResponseOutput;
use crate::merge::{append_by_id, merge_additive, overwrite, write_once};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
        }
    }

    /// Message whose id is derived from its role and content, so producing
    /// it again yields the same message.
    pub fn derived(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}:{}", role, content).as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self::new(format!("msg-{}", &digest[..16]), role, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Request-scoped context threaded through the stages.
///
/// Merge policies per field:
///
/// | field | policy |
/// |-------|--------|
/// | `messages` | append by id |
/// | `company_data`, `relationships_data` | additive |
/// | `analysis_result` | write once |
/// | everything else | overwrite |
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub messages: Vec<Message>,
    pub current_query: Option<String>,
    pub query_type: Option<QueryType>,
    pub analysis_type: Option<AnalysisType>,
    pub company_name: Option<String>,
    /// Resolved (or placeholder) entity driving retrieval.
    pub entity: Option<EntityRecord>,
    /// Entity fields plus the general and risk datasets, as plain JSON.
    pub company_data: BTreeMap<String, Value>,
    /// Relationship and supply-chain datasets keyed by entity id.
    pub relationships_data: BTreeMap<String, Value>,
    pub datasets: Option<DatasetBundle>,
    pub error: Option<ErrorRecord>,
    pub analysis_result: Option<AnalysisResult>,
    pub output: Option<ResponseOutput>,
}

/// Partial update returned by a stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub current_query: Option<String>,
    pub query_type: Option<QueryType>,
    pub analysis_type: Option<AnalysisType>,
    pub company_name: Option<String>,
    pub entity: Option<EntityRecord>,
    pub company_data: BTreeMap<String, Value>,
    pub relationships_data: BTreeMap<String, Value>,
    pub datasets: Option<DatasetBundle>,
    pub error: Option<ErrorRecord>,
    pub analysis_result: Option<AnalysisResult>,
    pub output: Option<ResponseOutput>,
}

impl StateUpdate {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: Some(ErrorRecord::new(kind, message)),
            ..Self::default()
        }
    }
}

impl WorkflowState {
    pub fn apply(&mut self, update: StateUpdate) {
        append_by_id(&mut self.messages, update.messages);
        overwrite(&mut self.current_query, update.current_query);
        overwrite(&mut self.query_type, update.query_type);
        overwrite(&mut self.analysis_type, update.analysis_type);
        overwrite(&mut self.company_name, update.company_name);
        overwrite(&mut self.entity, update.entity);
        merge_additive(&mut self.company_data, update.company_data);
        merge_additive(&mut self.relationships_data, update.relationships_data);
        overwrite(&mut self.datasets, update.datasets);
        overwrite(&mut self.error, update.error);
        write_once(&mut self.analysis_result, update.analysis_result, "analysis_result");
        overwrite(&mut self.output, update.output);
    }

    /// The error path is mandatory once either marker is set.
    pub fn has_failed(&self) -> bool {
        self.error.is_some() || self.query_type == Some(QueryType::Error)
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derived_ids_are_stable() {
        let a = Message::derived(Role::Assistant, "done");
        let b = Message::derived(Role::Assistant, "done");
        let c = Message::derived(Role::User, "done");
        assert_eq!(a, b);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let update = StateUpdate {
            messages: vec![Message::derived(Role::Assistant, "hi")],
            company_name: Some("MB TOOL".into()),
            company_data: BTreeMap::from([("id".to_string(), json!("cz-1"))]),
            relationships_data: BTreeMap::from([(
                "cz-1".to_string(),
                json!({"relationships": {"status": "available", "data": []}}),
            )]),
            ..StateUpdate::default()
        };

        let mut once = WorkflowState::default();
        once.apply(update.clone());
        let mut twice = once.clone();
        twice.apply(update);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_error_query_type_forces_error_path() {
        let state = WorkflowState {
            query_type: Some(QueryType::Error),
            ..WorkflowState::default()
        };
        assert!(state.has_failed());
    }

    #[test]
    fn test_state_serializes() {
        let mut state = WorkflowState::default();
        state.apply(StateUpdate::error(ErrorKind::MissingData, "No query provided"));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["error"]["kind"], "missing_data");
    }
}
