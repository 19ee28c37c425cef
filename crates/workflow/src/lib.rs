pub mod checkpoint;
pub mod engine;
pub mod errors;
pub mod format;
pub mod merge;
pub mod stages;
pub mod state;

pub use analysis::ErrorKind;
pub use checkpoint::CheckpointStore;
pub use engine::{IncomingMessage, QueryRequest, RunOutcome, WorkflowEngine};
pub use format::{CompletedOutput, ErrorOutput, OutputDetails, ResponseOutput};
pub use stages::{Stage, next_stage};
pub use state::{ErrorRecord, Message, Role, StateUpdate, WorkflowState};
