//! HTTP fetchers for the facility status documents.

use std::time::Duration;

use tracing::debug;

use crate::service::{AppError, AppResult, FacilityConfig};

use super::schemas::{AlcfActivity, NerscSystem};

#[derive(Debug)]
pub struct FacilityClient {
    http: reqwest::Client,
    nersc_status_url: String,
    alcf_status_url: String,
}

impl FacilityClient {
    pub fn new(cfg: &FacilityConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| AppError::upstream("facility client construction", e))?;
        Ok(FacilityClient {
            http,
            nersc_status_url: format!(
                "{}/{}",
                cfg.nersc_api_base.trim_end_matches('/'),
                cfg.nersc_status_endpoint.trim_start_matches('/')
            ),
            alcf_status_url: cfg.alcf_status_url.clone(),
        })
    }

    /// Fetch and validate the NERSC status document (a JSON array).
    pub async fn nersc_status(&self) -> AppResult<Vec<NerscSystem>> {
        let body = self.fetch(&self.nersc_status_url, "NERSC status fetch").await?;
        let systems: Vec<NerscSystem> =
            serde_json::from_str(&body).map_err(|e| AppError::malformed("NERSC API", e))?;
        debug!(systems = systems.len(), "fetched NERSC status");
        Ok(systems)
    }

    /// Fetch and validate the ALCF activity document.
    pub async fn alcf_activity(&self) -> AppResult<AlcfActivity> {
        let body = self.fetch(&self.alcf_status_url, "ALCF status fetch").await?;
        serde_json::from_str(&body).map_err(|e| AppError::malformed("ALCF API", e))
    }

    async fn fetch(&self, url: &str, op: &'static str) -> AppResult<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::upstream(op, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(op, format!("status {}", status)));
        }
        response.text().await.map_err(|e| AppError::upstream(op, e))
    }
}
