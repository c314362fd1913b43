//! Transfer API client: endpoint search, transfer submission, task
//! events and directory listings.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::service::AppResult;

use super::client::FederationCore;
use super::schemas::{TransferEndpoint, TransferEvent, TransferFile, TransferSubmitted};

/// Transfer API documents wrap their payload in an uppercase DATA list.
#[derive(Debug, Deserialize)]
struct DocList<T> {
    #[serde(rename = "DATA")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct EndpointDoc {
    id: String,
    display_name: String,
    owner_id: String,
    owner_string: String,
    entity_type: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<EndpointDoc> for TransferEndpoint {
    fn from(doc: EndpointDoc) -> Self {
        TransferEndpoint {
            endpoint_id: doc.id,
            display_name: doc.display_name,
            owner_id: doc.owner_id,
            owner_string: doc.owner_string,
            r#type: doc.entity_type,
            description: doc.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionIdDoc {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SubmitDoc {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct EventDoc {
    code: String,
    is_error: bool,
    description: String,
    details: String,
    time: String,
}

#[derive(Debug, Deserialize)]
struct FileDoc {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    link_target: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    group: Option<String>,
    permissions: String,
    size: i64,
    last_modified: String,
}

#[derive(Debug)]
pub struct TransferBridge {
    core: Arc<FederationCore>,
    base: String,
}

impl TransferBridge {
    pub fn new(core: Arc<FederationCore>, api_base: &str) -> Self {
        TransferBridge {
            core,
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Full-text endpoint search visible to the caller.
    pub async fn search_endpoints(
        &self,
        filter: &str,
        limit: i64,
    ) -> AppResult<Vec<TransferEndpoint>> {
        self.endpoint_search(&[
            ("filter_fulltext", filter.to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    /// Endpoints the caller administers.
    pub async fn list_my_endpoints(&self, limit: i64) -> AppResult<Vec<TransferEndpoint>> {
        self.endpoint_search(&[
            ("filter_scope", "administered-by-me".to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    /// Endpoints shared with the caller.
    pub async fn list_shared_endpoints(&self, limit: i64) -> AppResult<Vec<TransferEndpoint>> {
        self.endpoint_search(&[
            ("filter_scope", "shared-with-me".to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn endpoint_search(
        &self,
        query: &[(&str, String)],
    ) -> AppResult<Vec<TransferEndpoint>> {
        let doc: DocList<EndpointDoc> = self
            .core
            .get(
                &format!("{}/endpoint_search", self.base),
                query,
                "endpoint search",
            )
            .await?;
        Ok(doc.data.into_iter().map(TransferEndpoint::from).collect())
    }

    /// Submit a one-item transfer between two collections.
    ///
    /// The API requires a fresh submission id per submission, so this is
    /// the one federation operation that makes two requests.
    pub async fn submit_transfer(
        &self,
        source_collection_id: &str,
        destination_collection_id: &str,
        source_path: &str,
        destination_path: &str,
        label: &str,
    ) -> AppResult<TransferSubmitted> {
        let submission: SubmissionIdDoc = self
            .core
            .get(
                &format!("{}/submission_id", self.base),
                &[],
                "transfer submission",
            )
            .await?;

        let body = json!({
            "DATA_TYPE": "transfer",
            "submission_id": submission.value,
            "source_endpoint": source_collection_id,
            "destination_endpoint": destination_collection_id,
            "label": label,
            "DATA": [{
                "DATA_TYPE": "transfer_item",
                "source_path": source_path,
                "destination_path": destination_path,
            }],
        });
        let doc: SubmitDoc = self
            .core
            .post(
                &format!("{}/transfer", self.base),
                &body,
                "transfer submission",
            )
            .await?;
        Ok(TransferSubmitted {
            task_id: doc.task_id,
        })
    }

    /// Task events, newest first.
    pub async fn get_task_events(
        &self,
        task_id: &str,
        limit: i64,
    ) -> AppResult<Vec<TransferEvent>> {
        let doc: DocList<EventDoc> = self
            .core
            .get(
                &format!("{}/task/{}/event_list", self.base, task_id),
                &[("limit", limit.to_string())],
                "task event listing",
            )
            .await?;
        Ok(doc
            .data
            .into_iter()
            .map(|e| TransferEvent {
                code: e.code,
                is_error: e.is_error,
                description: e.description,
                details: e.details,
                time: e.time,
            })
            .collect())
    }

    pub async fn list_directory(
        &self,
        collection_id: &str,
        path: &str,
        limit: i64,
    ) -> AppResult<Vec<TransferFile>> {
        let doc: DocList<FileDoc> = self
            .core
            .get(
                &format!("{}/operation/endpoint/{}/ls", self.base, collection_id),
                &[("path", path.to_string()), ("limit", limit.to_string())],
                "directory listing",
            )
            .await?;
        Ok(doc
            .data
            .into_iter()
            .map(|f| TransferFile {
                name: f.name,
                r#type: f.kind,
                link_target: f.link_target,
                user: f.user,
                group: f.group,
                permissions: f.permissions,
                size: f.size,
                last_modified: f.last_modified,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_doc_maps_entity_type() {
        let doc: DocList<EndpointDoc> = serde_json::from_str(
            r#"{"DATA": [{
                "id": "ep-1",
                "display_name": "Lab Cluster",
                "owner_id": "owner-1",
                "owner_string": "alice@example.org",
                "entity_type": "GCSv5_mapped_collection"
            }]}"#,
        )
        .unwrap();
        let endpoint = TransferEndpoint::from(doc.data.into_iter().next().unwrap());
        assert_eq!(endpoint.endpoint_id, "ep-1");
        assert_eq!(endpoint.r#type, "GCSv5_mapped_collection");
        assert_eq!(endpoint.description, None);
    }

    #[test]
    fn test_file_doc_tolerates_missing_ownership() {
        let doc: FileDoc = serde_json::from_str(
            r#"{
                "name": "data.csv", "type": "file", "permissions": "0644",
                "size": 1024, "last_modified": "2026-01-01 00:00:00+00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(doc.kind, "file");
        assert!(doc.user.is_none());
    }
}
