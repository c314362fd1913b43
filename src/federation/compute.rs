//! Compute API client: function registration, task submission, status.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::service::{AppError, AppResult};

use super::client::FederationCore;
use super::schemas::{ComputeFunctionRegistered, ComputeSubmitted, ComputeTask};

/// Serialization strategy identifier for source-text function payloads.
const SOURCE_TEXT_SERDE: &str = "st";

#[derive(Debug, Deserialize)]
struct FunctionRegisteredDoc {
    function_uuid: String,
}

#[derive(Debug, Deserialize)]
struct BatchRunDoc {
    tasks: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusDoc {
    task_id: String,
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    exception: Option<String>,
}

/// Pack a payload the way the compute service's buffer framing expects:
/// the byte length on its own line, then the data.
fn pack_buffer(payload: &str) -> String {
    format!("{}\n{}", payload.len(), payload)
}

#[derive(Debug)]
pub struct ComputeBridge {
    core: Arc<FederationCore>,
    base: String,
}

impl ComputeBridge {
    pub fn new(core: Arc<FederationCore>, api_base: &str) -> Self {
        ComputeBridge {
            core,
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Register a function's source text; the returned id is what
    /// [`Self::submit_task`] executes.
    pub async fn register_function(
        &self,
        function_name: &str,
        function_code: &str,
        description: &str,
        public: bool,
    ) -> AppResult<ComputeFunctionRegistered> {
        let serialized = format!("{}\n{}:{}", SOURCE_TEXT_SERDE, function_name, function_code);
        let body = json!({
            "function_name": function_name,
            "function_code": pack_buffer(&serialized),
            "description": description,
            "meta": { "serde_identifier": SOURCE_TEXT_SERDE },
            "public": public,
        });
        let doc: FunctionRegisteredDoc = self
            .core
            .post(
                &format!("{}/v3/functions", self.base),
                &body,
                "function registration",
            )
            .await?;
        Ok(ComputeFunctionRegistered {
            function_id: doc.function_uuid,
        })
    }

    /// Submit one task to an endpoint as a single-entry batch.
    pub async fn submit_task(
        &self,
        endpoint_id: &str,
        function_id: &str,
        function_args: Value,
        function_kwargs: Value,
    ) -> AppResult<ComputeSubmitted> {
        let payload = serde_json::to_string(&json!({
            "args": function_args,
            "kwargs": function_kwargs,
        }))?;
        let body = json!({
            "tasks": { function_id: [pack_buffer(&payload)] },
        });
        let doc: BatchRunDoc = self
            .core
            .post(
                &format!("{}/v3/endpoints/{}/submit", self.base, endpoint_id),
                &body,
                "task submission",
            )
            .await?;
        let task_id = doc
            .tasks
            .get(function_id)
            .and_then(|ids| ids.first())
            .cloned()
            .ok_or_else(|| {
                AppError::malformed("compute API", "batch response carries no task id")
            })?;
        Ok(ComputeSubmitted { task_id })
    }

    pub async fn get_task_status(&self, task_id: &str) -> AppResult<ComputeTask> {
        let doc: TaskStatusDoc = self
            .core
            .get(
                &format!("{}/v2/tasks/{}", self.base, task_id),
                &[],
                "task status lookup",
            )
            .await?;
        Ok(ComputeTask {
            task_id: doc.task_id,
            status: doc.status,
            result: doc.result,
            exception: doc.exception,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_buffer_frames_length_then_data() {
        assert_eq!(pack_buffer("abc"), "3\nabc");
        let serialized = "st\nsquare:def square(x):\n    return x * x";
        let packed = pack_buffer(serialized);
        assert!(packed.starts_with(&format!("{}\n", serialized.len())));
    }

    #[test]
    fn test_batch_run_doc_picks_first_task() {
        let doc: BatchRunDoc = serde_json::from_str(
            r#"{"tasks": {"fn-1": ["task-a", "task-b"], "fn-2": []}}"#,
        )
        .unwrap();
        assert_eq!(doc.tasks["fn-1"][0], "task-a");
    }

    #[test]
    fn test_task_status_doc_tolerates_missing_result() {
        let doc: TaskStatusDoc =
            serde_json::from_str(r#"{"task_id": "t", "status": "pending"}"#).unwrap();
        assert_eq!(doc.status, "pending");
        assert!(doc.result.is_none());
        assert!(doc.exception.is_none());
    }
}
