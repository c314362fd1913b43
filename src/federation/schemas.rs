//! Output DTOs for the federation bridges.
//!
//! Each struct is the fixed shape a tool returns; per-API wire documents
//! live next to the client that reads them and get mapped into these.

use serde::Serialize;
use serde_json::Value;

// Compute

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeFunctionRegistered {
    pub function_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeSubmitted {
    pub task_id: String,
}

/// Status of one compute task. `result` is present once the task has
/// succeeded, `exception` carries the traceback when it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeTask {
    pub task_id: String,
    pub status: String,
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

// Transfer

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEndpoint {
    pub endpoint_id: String,
    pub display_name: String,
    pub owner_id: String,
    pub owner_string: String,
    pub r#type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSubmitted {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEvent {
    pub code: String,
    pub is_error: bool,
    pub description: String,
    pub details: String,
    /// ISO 8601, UTC.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferFile {
    pub name: String,
    /// dir, file, or invalid_symlink.
    pub r#type: String,
    pub link_target: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    /// Unix permissions as an octal mode string.
    pub permissions: String,
    pub size: i64,
    pub last_modified: String,
}

// Search

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchIndexCreated {
    pub index_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchIndex {
    pub index_id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub status: String,
    pub size: Option<i64>,
    pub num_subjects: Option<i64>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchIngestSubmitted {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchIngestTask {
    pub task_id: String,
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub gmeta: Vec<Value>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

// Flows

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowCreated {
    pub flow_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flow {
    pub flow_id: String,
    pub title: String,
    pub definition: Value,
    pub input_schema: Option<Value>,
    pub subtitle: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRunStarted {
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRun {
    pub run_id: String,
    pub flow_id: String,
    pub status: String,
    pub start_time: Option<String>,
    pub completion_time: Option<String>,
    pub details: Option<Value>,
}
