//! Search API client: index lifecycle, ingest, query.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::service::AppResult;

use super::client::FederationCore;
use super::schemas::{
    SearchIndex, SearchIndexCreated, SearchIngestSubmitted, SearchIngestTask, SearchResult,
};

#[derive(Debug, Deserialize)]
struct IndexDoc {
    id: String,
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    status: String,
    #[serde(default)]
    size: Option<i64>,
    #[serde(default)]
    num_subjects: Option<i64>,
    // Older documents say owner_id, newer ones owner.
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    owner_id: Option<String>,
}

impl From<IndexDoc> for SearchIndex {
    fn from(doc: IndexDoc) -> Self {
        SearchIndex {
            index_id: doc.id,
            display_name: doc.display_name,
            description: doc.description,
            status: doc.status,
            size: doc.size,
            num_subjects: doc.num_subjects,
            owner: doc.owner.or(doc.owner_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexListDoc {
    #[serde(default)]
    index_list: Vec<IndexDoc>,
}

#[derive(Debug, Deserialize)]
struct IndexCreatedDoc {
    id: String,
}

#[derive(Debug, Deserialize)]
struct IngestDoc {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct IngestTaskDoc {
    task_id: String,
    state: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResultDoc {
    #[serde(default)]
    gmeta: Vec<Value>,
    #[serde(default)]
    total: i64,
    #[serde(default)]
    offset: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug)]
pub struct SearchBridge {
    core: Arc<FederationCore>,
    base: String,
}

impl SearchBridge {
    pub fn new(core: Arc<FederationCore>, api_base: &str) -> Self {
        SearchBridge {
            core,
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn create_index(
        &self,
        display_name: &str,
        description: &str,
    ) -> AppResult<SearchIndexCreated> {
        let mut body = json!({ "display_name": display_name });
        if !description.is_empty() {
            body["description"] = json!(description);
        }
        let doc: IndexCreatedDoc = self
            .core
            .post(&format!("{}/v1/index", self.base), &body, "index creation")
            .await?;
        Ok(SearchIndexCreated { index_id: doc.id })
    }

    pub async fn list_my_indices(&self) -> AppResult<Vec<SearchIndex>> {
        let doc: IndexListDoc = self
            .core
            .get(&format!("{}/v1/index_list", self.base), &[], "index listing")
            .await?;
        Ok(doc.index_list.into_iter().map(SearchIndex::from).collect())
    }

    pub async fn get_index_info(&self, index_id: &str) -> AppResult<SearchIndex> {
        let doc: IndexDoc = self
            .core
            .get(
                &format!("{}/v1/index/{}", self.base, index_id),
                &[],
                "index info lookup",
            )
            .await?;
        Ok(SearchIndex::from(doc))
    }

    /// Delete an index; only its owner may.
    pub async fn delete_index(&self, index_id: &str) -> AppResult<String> {
        self.core
            .delete(
                &format!("{}/v1/index/{}", self.base, index_id),
                "index deletion",
            )
            .await?;
        Ok(format!("Index {} deleted successfully", index_id))
    }

    /// Ingest one document as a GMetaEntry.
    pub async fn ingest_document(
        &self,
        index_id: &str,
        subject: &str,
        content: Value,
        visible_to: Vec<String>,
    ) -> AppResult<SearchIngestSubmitted> {
        let body = json!({
            "ingest_type": "GMetaEntry",
            "ingest_data": {
                "subject": subject,
                "visible_to": visible_to,
                "content": content,
            },
        });
        let doc: IngestDoc = self
            .core
            .post(
                &format!("{}/v1/ingest/{}", self.base, index_id),
                &body,
                "document ingest",
            )
            .await?;
        Ok(SearchIngestSubmitted {
            task_id: doc.task_id,
        })
    }

    pub async fn get_ingestion_status(&self, task_id: &str) -> AppResult<SearchIngestTask> {
        let doc: IngestTaskDoc = self
            .core
            .get(
                &format!("{}/v1/task/{}", self.base, task_id),
                &[],
                "ingest status lookup",
            )
            .await?;
        Ok(SearchIngestTask {
            task_id: doc.task_id,
            status: doc.state,
            message: doc.message,
        })
    }

    pub async fn search_index(
        &self,
        index_id: &str,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<SearchResult> {
        let doc: SearchResultDoc = self
            .core
            .get(
                &format!("{}/v1/index/{}/search", self.base, index_id),
                &[
                    ("q", query.to_string()),
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
                "index search",
            )
            .await?;
        Ok(SearchResult {
            gmeta: doc.gmeta,
            total: doc.total,
            offset: doc.offset,
            limit: doc.limit,
        })
    }

    /// Delete a subject and all its entries.
    pub async fn delete_subject(&self, index_id: &str, subject: &str) -> AppResult<String> {
        let mut url =
            reqwest::Url::parse(&format!("{}/v1/index/{}/subject", self.base, index_id))
                .map_err(|e| crate::service::AppError::InvalidValue(e.to_string()))?;
        url.query_pairs_mut().append_pair("subject", subject);
        self.core.delete(url.as_str(), "subject deletion").await?;
        Ok(format!(
            "Subject '{}' deleted from index {}",
            subject, index_id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_doc_coalesces_owner_fields() {
        let doc: IndexDoc = serde_json::from_str(
            r#"{"id": "i", "display_name": "D", "status": "open", "owner_id": "legacy"}"#,
        )
        .unwrap();
        assert_eq!(SearchIndex::from(doc).owner.as_deref(), Some("legacy"));

        let doc: IndexDoc = serde_json::from_str(
            r#"{"id": "i", "display_name": "D", "status": "open",
               "owner": "new", "owner_id": "legacy"}"#,
        )
        .unwrap();
        assert_eq!(SearchIndex::from(doc).owner.as_deref(), Some("new"));
    }

    #[test]
    fn test_search_result_doc_applies_defaults() {
        let doc: SearchResultDoc = serde_json::from_str(r#"{"total": 3}"#).unwrap();
        assert_eq!(doc.total, 3);
        assert_eq!(doc.offset, 0);
        assert_eq!(doc.limit, 10);
        assert!(doc.gmeta.is_empty());
    }
}
