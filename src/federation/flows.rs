//! Flows API client: flow lifecycle, runs, cancellation.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::service::AppResult;

use super::client::FederationCore;
use super::schemas::{Flow, FlowCreated, FlowRun, FlowRunStarted};

#[derive(Debug, Deserialize)]
struct FlowDoc {
    id: String,
    title: String,
    definition: Value,
    #[serde(default)]
    input_schema: Option<Value>,
    #[serde(default)]
    subtitle: Option<String>,
    // Some listings report principal instead of owner_id.
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    principal: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<FlowDoc> for Flow {
    fn from(doc: FlowDoc) -> Self {
        Flow {
            flow_id: doc.id,
            title: doc.title,
            definition: doc.definition,
            input_schema: doc.input_schema,
            subtitle: doc.subtitle,
            owner_id: doc.owner_id.or(doc.principal),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FlowListDoc {
    #[serde(default)]
    flows: Vec<FlowDoc>,
}

#[derive(Debug, Deserialize)]
struct FlowCreatedDoc {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunStartedDoc {
    run_id: String,
}

#[derive(Debug, Deserialize)]
struct RunDoc {
    run_id: String,
    flow_id: String,
    status: String,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    completion_time: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

impl From<RunDoc> for FlowRun {
    fn from(doc: RunDoc) -> Self {
        FlowRun {
            run_id: doc.run_id,
            flow_id: doc.flow_id,
            status: doc.status,
            start_time: doc.start_time,
            completion_time: doc.completion_time,
            details: doc.details,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunListDoc {
    #[serde(default)]
    runs: Vec<RunDoc>,
}

#[derive(Debug)]
pub struct FlowsBridge {
    core: Arc<FederationCore>,
    base: String,
}

impl FlowsBridge {
    pub fn new(core: Arc<FederationCore>, api_base: &str) -> Self {
        FlowsBridge {
            core,
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a flow. A missing input schema defaults to `{}`, which
    /// accepts any input.
    pub async fn create_flow(
        &self,
        title: &str,
        definition: Value,
        subtitle: Option<&str>,
        input_schema: Option<Value>,
    ) -> AppResult<FlowCreated> {
        let mut body = json!({
            "title": title,
            "definition": definition,
            "input_schema": input_schema.unwrap_or_else(|| json!({})),
        });
        if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
            body["subtitle"] = json!(subtitle);
        }
        let doc: FlowCreatedDoc = self
            .core
            .post(&format!("{}/flows", self.base), &body, "flow creation")
            .await?;
        Ok(FlowCreated { flow_id: doc.id })
    }

    pub async fn list_flows(&self, limit: i64) -> AppResult<Vec<Flow>> {
        let doc: FlowListDoc = self
            .core
            .get(&format!("{}/flows", self.base), &[], "flow listing")
            .await?;
        Ok(doc
            .flows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(Flow::from)
            .collect())
    }

    pub async fn get_flow(&self, flow_id: &str) -> AppResult<Flow> {
        let doc: FlowDoc = self
            .core
            .get(
                &format!("{}/flows/{}", self.base, flow_id),
                &[],
                "flow lookup",
            )
            .await?;
        Ok(Flow::from(doc))
    }

    /// Delete a flow; only its owner may.
    pub async fn delete_flow(&self, flow_id: &str) -> AppResult<String> {
        self.core
            .delete(&format!("{}/flows/{}", self.base, flow_id), "flow deletion")
            .await?;
        Ok(format!("Flow {} deleted successfully", flow_id))
    }

    pub async fn run_flow(
        &self,
        flow_id: &str,
        flow_input: Value,
        label: Option<&str>,
    ) -> AppResult<FlowRunStarted> {
        let mut body = json!({ "body": flow_input });
        if let Some(label) = label.filter(|l| !l.is_empty()) {
            body["label"] = json!(label);
        }
        let doc: RunStartedDoc = self
            .core
            .post(
                &format!("{}/flows/{}/run", self.base, flow_id),
                &body,
                "flow run start",
            )
            .await?;
        Ok(FlowRunStarted { run_id: doc.run_id })
    }

    /// List runs, optionally filtered by flow and by status. The status
    /// filter is applied locally after the fetch.
    pub async fn list_flow_runs(
        &self,
        flow_id: Option<&str>,
        limit: i64,
        status: Option<&str>,
    ) -> AppResult<Vec<FlowRun>> {
        let mut query = Vec::new();
        if let Some(flow_id) = flow_id {
            query.push(("filter_flow_id", flow_id.to_string()));
        }
        let doc: RunListDoc = self
            .core
            .get(&format!("{}/runs", self.base), &query, "run listing")
            .await?;
        Ok(doc
            .runs
            .into_iter()
            .filter(|run| status.map_or(true, |s| run.status == s))
            .take(limit.max(0) as usize)
            .map(FlowRun::from)
            .collect())
    }

    pub async fn get_flow_run(&self, run_id: &str) -> AppResult<FlowRun> {
        let doc: RunDoc = self
            .core
            .get(&format!("{}/runs/{}", self.base, run_id), &[], "run lookup")
            .await?;
        Ok(FlowRun::from(doc))
    }

    pub async fn cancel_flow_run(&self, run_id: &str) -> AppResult<String> {
        let _: Value = self
            .core
            .post(
                &format!("{}/runs/{}/cancel", self.base, run_id),
                &json!({}),
                "run cancellation",
            )
            .await?;
        Ok(format!("Flow run {} canceled successfully", run_id))
    }
}
