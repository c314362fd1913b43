//! Tool surface of the facility-status bridge.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use std::future::Future;
use rmcp::handler::server::tool::Parameters;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::facility::format::{
    find_system, format_single_system, format_status_summary, paginate, summarize_activity,
    system_not_found_message,
};
use crate::facility::schemas::{AlcfJob, JobPage};
use crate::facility::FacilityClient;
use crate::service::AppResult;

use super::{error_result, json_result, text_result};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SystemNameParams {
    /// Name of the system, matched case-insensitively
    system_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct PageParams {
    /// Number of tasks per page (default 10)
    #[serde(default)]
    n: Option<u32>,
    /// Number of tasks to skip (default 0)
    #[serde(default)]
    skip: Option<u32>,
}

impl PageParams {
    fn slice(&self) -> (usize, usize) {
        (
            self.skip.unwrap_or(0) as usize,
            self.n.unwrap_or(10) as usize,
        )
    }
}

#[derive(Clone)]
pub struct FacilityTools {
    client: Arc<FacilityClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FacilityTools {
    pub fn new(client: FacilityClient) -> Self {
        FacilityTools {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    async fn alcf_queue(
        &self,
        pick: impl FnOnce(&crate::facility::AlcfActivity) -> &[AlcfJob],
        params: &PageParams,
    ) -> AppResult<JobPage> {
        let activity = self.client.alcf_activity().await?;
        let (skip, n) = params.slice();
        Ok(paginate(pick(&activity), skip, n).into())
    }

    #[tool(description = "Get a human-readable summary of all NERSC systems")]
    async fn get_nersc_status(&self) -> Result<CallToolResult, ErrorData> {
        match self.client.nersc_status().await {
            Ok(systems) => Ok(text_result(format_status_summary(&systems))),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get the status of a specific NERSC system by name")]
    async fn get_nersc_system_status(
        &self,
        params: Parameters<SystemNameParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let name = params.0.system_name;
        match self.client.nersc_status().await {
            Ok(systems) => match find_system(&systems, &name) {
                Some(system) => Ok(text_result(format_single_system(system))),
                None => Ok(text_result(system_not_found_message(&systems, &name))),
            },
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get the raw JSON status document for all NERSC systems")]
    async fn get_nersc_status_json(&self) -> Result<CallToolResult, ErrorData> {
        match self.client.nersc_status().await {
            Ok(systems) => Ok(json_result(&systems)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get the raw JSON activity document for ALCF Polaris")]
    async fn get_alcf_activity_json(&self) -> Result<CallToolResult, ErrorData> {
        match self.client.alcf_activity().await {
            Ok(activity) => Ok(json_result(&activity)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get ALCF Polaris availability: operational flag, maintenance window, job counts")]
    async fn get_alcf_status(&self) -> Result<CallToolResult, ErrorData> {
        match self.client.alcf_activity().await {
            Ok(activity) => Ok(json_result(&summarize_activity(&activity))),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get ALCF Polaris running tasks with pagination")]
    async fn get_alcf_running_tasks(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.alcf_queue(|a| &a.running, &params.0).await {
            Ok(page) => Ok(json_result(&page)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get ALCF Polaris starting tasks with pagination")]
    async fn get_alcf_starting_tasks(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.alcf_queue(|a| &a.starting, &params.0).await {
            Ok(page) => Ok(json_result(&page)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get ALCF Polaris queued tasks with pagination")]
    async fn get_alcf_queued_tasks(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.alcf_queue(|a| &a.queued, &params.0).await {
            Ok(page) => Ok(json_result(&page)),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Get ALCF Polaris reservation tasks with pagination")]
    async fn get_alcf_reservation_tasks(
        &self,
        params: Parameters<PageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.alcf_queue(|a| &a.reservation, &params.0).await {
            Ok(page) => Ok(json_result(&page)),
            Err(err) => Ok(error_result(err)),
        }
    }
}

#[tool_handler]
impl ServerHandler for FacilityTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Facility status bridge: NERSC system health and ALCF Polaris activity views."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
