//! MCP tool routers for the three bridge binaries.

pub mod fabric_tools;
pub mod facility_tools;
pub mod federation_tools;

pub use fabric_tools::FabricTools;
pub use facility_tools::FacilityTools;
pub use federation_tools::FederationTools;

use rmcp::model::{CallToolResult, Content};

use crate::service::AppError;

pub(crate) fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

pub(crate) fn error_result(err: AppError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.to_string())])
}

/// Render a DTO as pretty JSON; serialization failures surface as tool
/// errors rather than protocol errors.
pub(crate) fn json_result<T: serde::Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(out) => text_result(out),
        Err(err) => error_result(AppError::JsonError(err)),
    }
}
