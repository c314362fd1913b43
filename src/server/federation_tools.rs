//! Tool surface of the federation bridge: compute, transfer, search and
//! flows forwarded behind one stdio server.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use std::future::Future;
use rmcp::handler::server::tool::Parameters;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::federation::{
    ComputeBridge, FederationCore, FlowsBridge, SearchBridge, TokenSource, TransferBridge,
};
use crate::service::{AppResult, FederationConfig};

use super::{error_result, json_result, text_result};

const DEFAULT_LIMIT: i64 = 25;

// Compute params

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct RegisterFunctionParams {
    /// Name of the function
    function_name: String,
    /// Source text of the function
    function_code: String,
    /// Optional description of the function
    #[serde(default)]
    description: Option<String>,
    /// Whether the function may be used by others (default false)
    #[serde(default)]
    public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SubmitTaskParams {
    /// Endpoint that will execute the function
    endpoint_id: String,
    /// Registered function id
    function_id: String,
    /// Positional arguments, as a JSON array
    #[serde(default)]
    function_args: Option<Value>,
    /// Keyword arguments, as a JSON object
    #[serde(default)]
    function_kwargs: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct TaskIdParams {
    /// Task id
    task_id: String,
}

// Transfer params

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct EndpointSearchParams {
    /// Full-text filter matched against endpoint fields
    search_filter: String,
    /// Limit the number of results
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct LimitParams {
    /// Limit the number of results
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SubmitTransferParams {
    /// Source collection id
    source_collection_id: String,
    /// Destination collection id
    destination_collection_id: String,
    /// Path to the source file or directory
    source_path: String,
    /// Path to the destination file or directory
    destination_path: String,
    /// Label for the transfer task
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct TaskEventsParams {
    /// Task id
    task_id: String,
    /// Limit the number of results
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ListDirectoryParams {
    /// Collection id
    collection_id: String,
    /// Directory path to list
    path: String,
    /// Limit the number of results
    #[serde(default)]
    limit: Option<i64>,
}

// Search params

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct CreateIndexParams {
    /// Display name for the index
    display_name: String,
    /// Description of the index
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct IndexIdParams {
    /// Index id
    index_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct IngestDocumentParams {
    /// Index id
    index_id: String,
    /// Unique subject identifier for the document
    subject: String,
    /// Document content as a JSON object
    content: Value,
    /// Principals allowed to see the document (default ["public"])
    #[serde(default)]
    visible_to: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SearchIndexParams {
    /// Index id
    index_id: String,
    /// Query string
    query: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    limit: Option<i64>,
    /// Number of results to skip (default 0)
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct DeleteSubjectParams {
    /// Index id
    index_id: String,
    /// Subject identifier to delete
    subject: String,
}

// Flows params

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct CreateFlowParams {
    /// Title for the flow
    title: String,
    /// Flow definition document
    definition: Value,
    /// Optional subtitle
    #[serde(default)]
    subtitle: Option<String>,
    /// Optional input schema; defaults to {} which accepts any input
    #[serde(default)]
    input_schema: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct FlowIdParams {
    /// Flow id
    flow_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct RunFlowParams {
    /// Flow id
    flow_id: String,
    /// Input data for the run
    flow_input: Value,
    /// Optional label for the run
    #[serde(default)]
    run_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ListFlowRunsParams {
    /// Filter by flow id
    #[serde(default)]
    flow_id: Option<String>,
    /// Maximum number of runs (default 25)
    #[serde(default)]
    limit: Option<i64>,
    /// Filter by run status (ACTIVE, SUCCEEDED, FAILED, ...)
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct RunIdParams {
    /// Run id
    run_id: String,
}

#[derive(Clone)]
pub struct FederationTools {
    compute: Arc<ComputeBridge>,
    transfer: Arc<TransferBridge>,
    search: Arc<SearchBridge>,
    flows: Arc<FlowsBridge>,
    tool_router: ToolRouter<Self>,
}

fn render<T: serde::Serialize>(result: AppResult<T>) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(value) => Ok(json_result(&value)),
        Err(err) => Ok(error_result(err)),
    }
}

#[tool_router]
impl FederationTools {
    pub fn new(cfg: &FederationConfig) -> AppResult<Self> {
        let core = Arc::new(FederationCore::new(cfg, TokenSource::FromEnv)?);
        Ok(FederationTools {
            compute: Arc::new(ComputeBridge::new(core.clone(), &cfg.compute_api_base)),
            transfer: Arc::new(TransferBridge::new(core.clone(), &cfg.transfer_api_base)),
            search: Arc::new(SearchBridge::new(core.clone(), &cfg.search_api_base)),
            flows: Arc::new(FlowsBridge::new(core, &cfg.flows_api_base)),
            tool_router: Self::tool_router(),
        })
    }

    // Compute

    #[tool(description = "Register a function's source text; use submit_task to run it on an endpoint")]
    async fn register_function(
        &self,
        params: Parameters<RegisterFunctionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.compute
                .register_function(
                    &p.function_name,
                    &p.function_code,
                    p.description.as_deref().unwrap_or(""),
                    p.public.unwrap_or(false),
                )
                .await,
        )
    }

    #[tool(description = "Submit a function execution task to a compute endpoint")]
    async fn submit_task(
        &self,
        params: Parameters<SubmitTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.compute
                .submit_task(
                    &p.endpoint_id,
                    &p.function_id,
                    p.function_args.unwrap_or_else(|| Value::Array(vec![])),
                    p.function_kwargs
                        .unwrap_or_else(|| Value::Object(Default::default())),
                )
                .await,
        )
    }

    #[tool(description = "Get the status and result of a compute task")]
    async fn get_task_status(
        &self,
        params: Parameters<TaskIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(self.compute.get_task_status(&params.0.task_id).await)
    }

    // Transfer

    #[tool(description = "Search transfer endpoints and collections visible to the caller")]
    async fn search_endpoints(
        &self,
        params: Parameters<EndpointSearchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.transfer
                .search_endpoints(&p.search_filter, p.limit.unwrap_or(DEFAULT_LIMIT))
                .await,
        )
    }

    #[tool(description = "List endpoints and collections administered by the caller")]
    async fn list_my_endpoints(
        &self,
        params: Parameters<LimitParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(
            self.transfer
                .list_my_endpoints(params.0.limit.unwrap_or(DEFAULT_LIMIT))
                .await,
        )
    }

    #[tool(description = "List endpoints and collections shared with the caller")]
    async fn list_shared_endpoints(
        &self,
        params: Parameters<LimitParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(
            self.transfer
                .list_shared_endpoints(params.0.limit.unwrap_or(DEFAULT_LIMIT))
                .await,
        )
    }

    #[tool(description = "Submit a transfer between two collections; monitor it with get_task_events")]
    async fn submit_transfer(
        &self,
        params: Parameters<SubmitTransferParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.transfer
                .submit_transfer(
                    &p.source_collection_id,
                    &p.destination_collection_id,
                    &p.source_path,
                    &p.destination_path,
                    p.label.as_deref().unwrap_or("Bridge Transfer"),
                )
                .await,
        )
    }

    #[tool(description = "Get transfer task events, newest first")]
    async fn get_task_events(
        &self,
        params: Parameters<TaskEventsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.transfer
                .get_task_events(&p.task_id, p.limit.unwrap_or(DEFAULT_LIMIT))
                .await,
        )
    }

    #[tool(description = "List the contents of a directory on a transfer collection")]
    async fn list_directory(
        &self,
        params: Parameters<ListDirectoryParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.transfer
                .list_directory(&p.collection_id, &p.path, p.limit.unwrap_or(DEFAULT_LIMIT))
                .await,
        )
    }

    // Search

    #[tool(description = "Create a new search index")]
    async fn create_index(
        &self,
        params: Parameters<CreateIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.search
                .create_index(&p.display_name, p.description.as_deref().unwrap_or(""))
                .await,
        )
    }

    #[tool(description = "List search indices the caller has access to")]
    async fn list_my_indices(&self) -> Result<CallToolResult, ErrorData> {
        render(self.search.list_my_indices().await)
    }

    #[tool(description = "Get detailed information about a search index")]
    async fn get_index_info(
        &self,
        params: Parameters<IndexIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(self.search.get_index_info(&params.0.index_id).await)
    }

    #[tool(description = "Delete a search index; only the owner may")]
    async fn delete_index(
        &self,
        params: Parameters<IndexIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.search.delete_index(&params.0.index_id).await {
            Ok(message) => Ok(text_result(message)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Ingest a single document into a search index")]
    async fn ingest_document(
        &self,
        params: Parameters<IngestDocumentParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.search
                .ingest_document(
                    &p.index_id,
                    &p.subject,
                    p.content,
                    p.visible_to
                        .unwrap_or_else(|| vec!["public".to_string()]),
                )
                .await,
        )
    }

    #[tool(description = "Get the status of a document ingestion task")]
    async fn get_ingestion_status(
        &self,
        params: Parameters<TaskIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(self.search.get_ingestion_status(&params.0.task_id).await)
    }

    #[tool(description = "Search an index with a simple query string")]
    async fn search_index(
        &self,
        params: Parameters<SearchIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.search
                .search_index(
                    &p.index_id,
                    &p.query,
                    p.limit.unwrap_or(10),
                    p.offset.unwrap_or(0),
                )
                .await,
        )
    }

    #[tool(description = "Delete a subject and all its entries from a search index")]
    async fn delete_subject(
        &self,
        params: Parameters<DeleteSubjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        match self.search.delete_subject(&p.index_id, &p.subject).await {
            Ok(message) => Ok(text_result(message)),
            Err(err) => Ok(error_result(err)),
        }
    }

    // Flows

    #[tool(description = "Create a new flow")]
    async fn create_flow(
        &self,
        params: Parameters<CreateFlowParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.flows
                .create_flow(&p.title, p.definition, p.subtitle.as_deref(), p.input_schema)
                .await,
        )
    }

    #[tool(description = "List flows the caller has access to")]
    async fn list_flows(
        &self,
        params: Parameters<LimitParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(
            self.flows
                .list_flows(params.0.limit.unwrap_or(DEFAULT_LIMIT))
                .await,
        )
    }

    #[tool(description = "Get detailed information about a flow")]
    async fn get_flow(
        &self,
        params: Parameters<FlowIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(self.flows.get_flow(&params.0.flow_id).await)
    }

    #[tool(description = "Delete a flow; only the owner may")]
    async fn delete_flow(
        &self,
        params: Parameters<FlowIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.flows.delete_flow(&params.0.flow_id).await {
            Ok(message) => Ok(text_result(message)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Start a flow run with the provided input")]
    async fn run_flow(
        &self,
        params: Parameters<RunFlowParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.flows
                .run_flow(&p.flow_id, p.flow_input, p.run_label.as_deref())
                .await,
        )
    }

    #[tool(description = "List flow runs, optionally filtered by flow id or status")]
    async fn list_flow_runs(
        &self,
        params: Parameters<ListFlowRunsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        render(
            self.flows
                .list_flow_runs(
                    p.flow_id.as_deref(),
                    p.limit.unwrap_or(DEFAULT_LIMIT),
                    p.status.as_deref(),
                )
                .await,
        )
    }

    #[tool(description = "Get detailed information about a flow run")]
    async fn get_flow_run(
        &self,
        params: Parameters<RunIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        render(self.flows.get_flow_run(&params.0.run_id).await)
    }

    #[tool(description = "Cancel an active flow run")]
    async fn cancel_flow_run(
        &self,
        params: Parameters<RunIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.flows.cancel_flow_run(&params.0.run_id).await {
            Ok(message) => Ok(text_result(message)),
            Err(err) => Ok(error_result(err)),
        }
    }
}

#[tool_handler]
impl ServerHandler for FederationTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Federation bridge: compute, transfer, search and flows APIs as tools."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
