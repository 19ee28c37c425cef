use analysis::{Analyzer, ErrorKind};
use intent::{IntentClassifier, QueryType, extract_company_name};
use retrieve::{DatasetBundle, DatasetRetriever, EntityResolver, ResolveError, RetrieveError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use store::{EntityRecord, derive_entity_id, normalize_name};
use tracing::{debug, warn};

use crate::errors::failure_result;
use crate::format::ResponseOutput;
use crate::merge::normalize_mapping;
use crate::state::{ErrorRecord, Message, Role, StateUpdate, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RouteQuery,
    PrepareEntity,
    RetrieveData,
    Analyze,
    ErrorHandle,
    FormatResponse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RouteQuery => "route_query",
            Stage::PrepareEntity => "prepare_entity",
            Stage::RetrieveData => "retrieve_data",
            Stage::Analyze => "analyze",
            Stage::ErrorHandle => "error_handle",
            Stage::FormatResponse => "format_response",
        };
        f.write_str(name)
    }
}

/// Transition table. `None` after the terminal stage.
pub fn next_stage(current: Stage, state: &WorkflowState) -> Option<Stage> {
    match current {
        Stage::FormatResponse => None,
        Stage::ErrorHandle | Stage::Analyze => Some(Stage::FormatResponse),
        _ if state.has_failed() => Some(Stage::ErrorHandle),
        Stage::RouteQuery => Some(Stage::PrepareEntity),
        Stage::PrepareEntity => Some(Stage::RetrieveData),
        Stage::RetrieveData => Some(Stage::Analyze),
    }
}

/// Collaborators the stages call into.
#[derive(Clone)]
pub struct StageContext {
    pub classifier: Arc<dyn IntentClassifier>,
    pub resolver: EntityResolver,
    pub retriever: DatasetRetriever,
    pub analyzer: Analyzer,
}

impl StageContext {
    pub async fn run(&self, stage: Stage, state: &WorkflowState) -> StateUpdate {
        match stage {
            Stage::RouteQuery => self.route_query(state).await,
            Stage::PrepareEntity => self.prepare_entity(state).await,
            Stage::RetrieveData => self.retrieve_data(state).await,
            Stage::Analyze => self.analyze(state),
            Stage::ErrorHandle => error_handle(state),
            Stage::FormatResponse => format_response(state),
        }
    }

    async fn route_query(&self, state: &WorkflowState) -> StateUpdate {
        let query = state
            .current_query
            .clone()
            .filter(|q| !q.trim().is_empty())
            .or_else(|| {
                state
                    .last_user_message()
                    .map(|m| m.content.clone())
                    .filter(|q| !q.trim().is_empty())
            });

        let Some(query) = query else {
            return StateUpdate {
                query_type: Some(QueryType::Error),
                ..StateUpdate::error(ErrorKind::MissingData, "No query provided")
            };
        };

        let intent = self.classifier.classify(&query).await;
        debug!(
            query_type = %intent.query_type,
            analysis_type = %intent.analysis_type,
            "Query classified"
        );

        if intent.query_type == QueryType::Error {
            return StateUpdate {
                current_query: Some(query),
                query_type: Some(QueryType::Error),
                ..StateUpdate::error(
                    ErrorKind::MissingData,
                    "The query contains no searchable text",
                )
            };
        }

        StateUpdate {
            current_query: Some(query),
            query_type: Some(intent.query_type),
            analysis_type: Some(intent.analysis_type),
            ..StateUpdate::default()
        }
    }

    async fn prepare_entity(&self, state: &WorkflowState) -> StateUpdate {
        let Some(query) = state.current_query.as_deref() else {
            return StateUpdate::error(ErrorKind::MissingData, "No query provided");
        };

        let name = state
            .company_name
            .clone()
            .or_else(|| extract_company_name(query))
            .unwrap_or_else(|| query.trim().to_string());

        if normalize_name(&name).is_empty() {
            return StateUpdate::error(
                ErrorKind::InvalidCompanyName,
                format!("'{}' is not a usable company name", name),
            );
        }

        let mut attempts = vec![name.as_str()];
        if name != query.trim() {
            attempts.push(query);
        }

        let mut resolved = None;
        for attempt in attempts {
            match self.resolver.resolve(attempt).await {
                Ok(entity) => {
                    resolved = Some(entity);
                    break;
                }
                Err(ResolveError::EmptyInput) => {}
                Err(e) => debug!(attempt, error = %e, "Resolution attempt failed"),
            }
        }

        let entity = match resolved {
            Some(entity) => entity,
            None => {
                let id = derive_entity_id(&name);
                warn!(name = %name, placeholder_id = %id, "Entity unresolved, using placeholder");
                EntityRecord::placeholder(id, name.clone())
            }
        };

        let company_data = match normalize_mapping(&entity) {
            Ok(mapping) => mapping,
            Err(e) => return StateUpdate::error(ErrorKind::UnknownError, e.to_string()),
        };

        StateUpdate {
            company_name: Some(entity.label.clone()),
            entity: Some(entity),
            company_data,
            ..StateUpdate::default()
        }
    }

    async fn retrieve_data(&self, state: &WorkflowState) -> StateUpdate {
        let Some(entity) = state.entity.as_ref() else {
            return StateUpdate::error(ErrorKind::MissingData, "No entity prepared for retrieval");
        };
        let analysis_type = state.analysis_type.clone().unwrap_or_default();

        let retrieval = match self.retriever.fetch(&entity.id, &analysis_type).await {
            Ok(retrieval) => retrieval,
            Err(RetrieveError::EntityNotFound(id)) => {
                return StateUpdate::error(
                    ErrorKind::EntityNotFound,
                    format!("No data found for company '{}' ({})", entity.label, id),
                );
            }
            Err(e) => return StateUpdate::error(ErrorKind::DataAccessError, e.to_string()),
        };

        let unavailable = retrieval.bundle.unavailable();
        if !unavailable.is_empty() {
            warn!(entity_id = %entity.id, datasets = ?unavailable, "Continuing with partial data");
        }

        match dataset_sections(&retrieval.entity, &retrieval.bundle) {
            Ok((company_data, relationships_data)) => StateUpdate {
                entity: Some(retrieval.entity),
                company_data,
                relationships_data,
                datasets: Some(retrieval.bundle),
                ..StateUpdate::default()
            },
            Err(e) => StateUpdate::error(ErrorKind::UnknownError, e.to_string()),
        }
    }

    fn analyze(&self, state: &WorkflowState) -> StateUpdate {
        let (Some(entity), Some(bundle)) = (state.entity.as_ref(), state.datasets.as_ref()) else {
            return failed_analysis(
                state,
                ErrorRecord::new(ErrorKind::MissingData, "No datasets available for analysis"),
            );
        };
        let analysis_type = state.analysis_type.clone().unwrap_or_default();

        match self.analyzer.analyze(entity, &analysis_type, bundle) {
            Ok(result) => StateUpdate {
                analysis_result: Some(result),
                ..StateUpdate::default()
            },
            Err(e) => failed_analysis(state, ErrorRecord::new(ErrorKind::AnalysisError, e.to_string())),
        }
    }
}

fn failed_analysis(state: &WorkflowState, error: ErrorRecord) -> StateUpdate {
    StateUpdate {
        analysis_result: Some(failure_result(&error, state)),
        error: Some(error),
        ..StateUpdate::default()
    }
}

fn error_handle(state: &WorkflowState) -> StateUpdate {
    let error = state.error.clone().unwrap_or_else(|| {
        ErrorRecord::new(ErrorKind::UnknownError, "The request failed for an unknown reason")
    });

    StateUpdate {
        analysis_result: Some(failure_result(&error, state)),
        ..StateUpdate::default()
    }
}

fn format_response(state: &WorkflowState) -> StateUpdate {
    let output = match &state.analysis_result {
        Some(result) => ResponseOutput::from(result),
        None => ResponseOutput::unknown_error("No analysis result was produced"),
    };

    StateUpdate {
        messages: vec![Message::derived(Role::Assistant, output.render())],
        output: Some(output),
        ..StateUpdate::default()
    }
}

type Sections = (BTreeMap<String, Value>, BTreeMap<String, Value>);

/// Split a bundle into the entity mapping (general and risk datasets) and
/// the per-entity relationship mapping (supplier datasets).
fn dataset_sections(entity: &EntityRecord, bundle: &DatasetBundle) -> serde_json::Result<Sections> {
    let mut company_data = normalize_mapping(entity)?;
    let mut relationships_data = BTreeMap::new();

    let mut sections = normalize_mapping(bundle)?;
    sections.remove("kind");

    match bundle {
        DatasetBundle::Supplier { .. } => {
            relationships_data.insert(
                entity.id.clone(),
                Value::Object(sections.into_iter().collect()),
            );
        }
        _ => company_data.extend(sections),
    }

    Ok((company_data, relationships_data))
}
