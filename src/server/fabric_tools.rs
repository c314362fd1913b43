// Copyright 2026 science-bridges contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tool surface of the event-fabric bridge.
//!
//! Every data-plane tool checks the session guard first; the consume
//! tools are thin wrappers that pick a [`WindowMode`] and hand off to the
//! retriever.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use rmcp::handler::server::tool::ToolRouter;
use std::future::Future;
use rmcp::handler::server::tool::Parameters;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use crate::fabric::{
    FabricSession, IdentityClient, MemoryFabric, WindowMode, WindowRetriever,
};
use crate::service::{global_config, AppError};

use super::{error_result, json_result, text_result};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct CompleteAuthParams {
    /// Authorization code copied from the identity provider page
    code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ConfidentialAuthParams {
    /// OAuth client id of the service account
    client_id: String,
    /// OAuth client secret of the service account
    client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct TopicParams {
    /// Topic name
    topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ProduceParams {
    /// Topic to produce to
    topic: String,
    /// Message payload
    value: String,
    /// Optional message key
    #[serde(default)]
    key: Option<String>,
    /// Wait for the broker acknowledgement (default true)
    #[serde(default)]
    sync: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ConsumeParams {
    /// Topic to consume from
    topic: String,
    /// Maximum number of messages to return
    #[serde(default)]
    num_msg: Option<i64>,
    /// Poll timeout in seconds
    #[serde(default)]
    timeout: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ConsumeFromOffsetParams {
    /// Topic to consume from
    topic: String,
    /// Starting offset; snapped forward if already evicted
    offset: i64,
    /// Maximum number of messages to return
    #[serde(default)]
    num_msg: Option<i64>,
    /// Poll timeout in seconds
    #[serde(default)]
    timeout: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ConsumeFromTimestampParams {
    /// Topic to consume from
    topic: String,
    /// Epoch milliseconds; the window starts at the first record at or
    /// after this time
    timestamp_ms: i64,
    /// Maximum number of messages to return
    #[serde(default)]
    num_msg: Option<i64>,
    /// Poll timeout in seconds
    #[serde(default)]
    timeout: Option<f64>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct FabricTools {
    session: Arc<Mutex<FabricSession>>,
    identity: Arc<IdentityClient>,
    fabric: Arc<MemoryFabric>,
    retriever: WindowRetriever<Arc<MemoryFabric>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FabricTools {
    pub fn new(identity: IdentityClient, fabric: Arc<MemoryFabric>) -> Self {
        FabricTools {
            session: Arc::new(Mutex::new(FabricSession::default())),
            identity: Arc::new(identity),
            retriever: WindowRetriever::new(fabric.clone()),
            fabric,
            tool_router: Self::tool_router(),
        }
    }

    fn consume(
        &self,
        topic: &str,
        mode: WindowMode,
        num_msg: Option<i64>,
        timeout: Option<f64>,
    ) -> CallToolResult {
        let cfg = &global_config().fabric;
        let num_msg = num_msg.unwrap_or(cfg.default_num_msg);
        let timeout = Duration::from_secs_f64(timeout.unwrap_or(cfg.default_timeout_secs).max(0.0));
        match self.retriever.retrieve(topic, mode, num_msg, timeout) {
            Ok(batch) => json_result(&batch),
            Err(err) => error_result(err),
        }
    }

    #[tool(description = "Start the login flow; visit the returned URL and pass the code to complete_fabric_auth")]
    async fn start_fabric_auth(&self) -> Result<CallToolResult, ErrorData> {
        let url = self.identity.authorize_url();
        self.session.lock().await.begin();
        Ok(text_result(format!(
            "Please authenticate by visiting:\n{}\n\nThen call complete_fabric_auth with the authorization code.",
            url
        )))
    }

    #[tool(description = "Complete the login flow with the authorization code")]
    async fn complete_fabric_auth(
        &self,
        params: Parameters<CompleteAuthParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let mut session = self.session.lock().await;
        if !session.has_pending_auth() {
            return Ok(error_result(AppError::NotAuthenticated(
                "no pending login flow; call start_fabric_auth first".to_string(),
            )));
        }
        match self.identity.exchange_code(params.0.code.trim()).await {
            Ok(identity) => {
                let user_id = identity.user_id.clone();
                session.complete(identity);
                Ok(text_result(format!("Login successful as {}.", user_id)))
            }
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Authenticate with a service-account client id and secret")]
    async fn confidential_fabric_auth(
        &self,
        params: Parameters<ConfidentialAuthParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let p = params.0;
        if p.client_id.is_empty() || p.client_secret.is_empty() {
            return Ok(error_result(AppError::InvalidValue(
                "both client_id and client_secret must be provided".to_string(),
            )));
        }
        match self
            .identity
            .client_credentials(&p.client_id, &p.client_secret)
            .await
        {
            Ok(identity) => {
                let user_id = identity.user_id.clone();
                self.session.lock().await.complete(identity);
                Ok(text_result(format!(
                    "Confidential client authentication successful as {}.",
                    user_id
                )))
            }
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Log out, revoking the stored token when possible")]
    async fn fabric_logout(&self) -> Result<CallToolResult, ErrorData> {
        let identity = self.session.lock().await.clear();
        match identity {
            Some(identity) => {
                let revoked = self.identity.revoke(&identity.access_token).await;
                info!(user_id = %identity.user_id, revoked, "fabric logout");
                if revoked {
                    Ok(text_result("Logged out; token revoked."))
                } else {
                    Ok(text_result(
                        "Logged out; token revocation failed, session cleared locally.",
                    ))
                }
            }
            None => Ok(text_result("No active session.")),
        }
    }

    #[tool(description = "List registered topics")]
    async fn list_topics(&self) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        Ok(json_result(&self.fabric.topic_names()))
    }

    #[tool(description = "Register a topic, creating its partition")]
    async fn register_topic(
        &self,
        params: Parameters<TopicParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let topic = params.0.topic;
        match self.fabric.register_topic(&topic) {
            Ok(true) => Ok(text_result(format!("Topic '{}' registered.", topic))),
            Ok(false) => Ok(text_result(format!("Topic '{}' already registered.", topic))),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Unregister a topic and drop its messages")]
    async fn unregister_topic(
        &self,
        params: Parameters<TopicParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let topic = params.0.topic;
        if self.fabric.unregister_topic(&topic) {
            Ok(text_result(format!("Topic '{}' unregistered.", topic)))
        } else {
            Ok(error_result(AppError::NotFound(format!(
                "topic '{}' is not registered",
                topic
            ))))
        }
    }

    #[tool(description = "Produce one message to a topic (partition 0)")]
    async fn produce_one(
        &self,
        params: Parameters<ProduceParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let p = params.0;
        let key = p.key.map(Bytes::from);
        let value = Bytes::from(p.value);
        let sync = p.sync.unwrap_or(true);
        match self.fabric.produce(&p.topic, key, value) {
            Ok(ack) if sync => Ok(json_result(&json!({
                "status": "produced",
                "topic": ack.topic,
                "partition": ack.partition,
                "offset": ack.offset,
                "timestamp": ack.timestamp,
            }))),
            Ok(_) => Ok(json_result(&json!({
                "status": "queued",
                "timestamp": now_ms(),
            }))),
            Err(err) => Ok(error_result(err)),
        }
    }

    #[tool(description = "Consume the oldest messages of a topic")]
    async fn consume_earliest(
        &self,
        params: Parameters<ConsumeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let p = params.0;
        Ok(self.consume(&p.topic, WindowMode::Earliest, p.num_msg, p.timeout))
    }

    #[tool(description = "Consume the most recent messages of a topic, oldest first")]
    async fn consume_latest(
        &self,
        params: Parameters<ConsumeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let p = params.0;
        Ok(self.consume(&p.topic, WindowMode::Latest, p.num_msg, p.timeout))
    }

    #[tool(description = "Consume messages starting at a specific offset")]
    async fn consume_from_offset(
        &self,
        params: Parameters<ConsumeFromOffsetParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let p = params.0;
        Ok(self.consume(
            &p.topic,
            WindowMode::FromOffset(p.offset),
            p.num_msg,
            p.timeout,
        ))
    }

    #[tool(description = "Consume messages recorded at or after a timestamp (epoch ms)")]
    async fn consume_from_timestamp(
        &self,
        params: Parameters<ConsumeFromTimestampParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if let Err(err) = self.session.lock().await.require_login() {
            return Ok(error_result(err));
        }
        let p = params.0;
        Ok(self.consume(
            &p.topic,
            WindowMode::FromTimestamp(p.timestamp_ms),
            p.num_msg,
            p.timeout,
        ))
    }
}

#[tool_handler]
impl ServerHandler for FabricTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Event fabric bridge: authenticate, manage topics, produce and consume messages."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
