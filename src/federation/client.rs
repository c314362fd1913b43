//! Shared HTTP plumbing for the federation bridges.
//!
//! Bearer material resolves with a fixed precedence: configured client
//! credentials win, a statically supplied access token is the fallback,
//! and a client id without its secret is an error rather than a silent
//! downgrade.

use std::env;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::service::{AppError, AppResult, FederationConfig};

const CLIENT_ID_VAR: &str = "FEDERATION_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "FEDERATION_CLIENT_SECRET";
const ACCESS_TOKEN_VAR: &str = "FEDERATION_ACCESS_TOKEN";

/// Where the bearer token for outbound requests comes from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Resolve from the environment on every call, so the server starts
    /// even when credentials arrive later.
    FromEnv,
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    Static(String),
}

impl TokenSource {
    /// Resolve from the environment. Never returns `FromEnv`.
    pub fn from_env() -> AppResult<TokenSource> {
        let client_id = env::var(CLIENT_ID_VAR).ok();
        let client_secret = env::var(CLIENT_SECRET_VAR).ok();
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(TokenSource::ClientCredentials {
                client_id,
                client_secret,
            }),
            (Some(_), None) => Err(AppError::IllegalStateError(format!(
                "both {} and {} must be set to use a client identity",
                CLIENT_ID_VAR, CLIENT_SECRET_VAR
            ))),
            _ => match env::var(ACCESS_TOKEN_VAR) {
                Ok(token) => Ok(TokenSource::Static(token)),
                Err(_) => Err(AppError::NotAuthenticated(format!(
                    "set {} or {}/{} to authorize federation calls",
                    ACCESS_TOKEN_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR
                ))),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
}

/// One HTTP client plus token source shared by all four API clients.
#[derive(Debug)]
pub struct FederationCore {
    http: reqwest::Client,
    auth_base: String,
    token: TokenSource,
}

impl FederationCore {
    pub fn new(cfg: &FederationConfig, token: TokenSource) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| AppError::upstream("federation client construction", e))?;
        Ok(FederationCore {
            http,
            auth_base: cfg.auth_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn bearer(&self) -> AppResult<String> {
        let resolved = match &self.token {
            TokenSource::FromEnv => TokenSource::from_env()?,
            other => other.clone(),
        };
        match resolved {
            TokenSource::FromEnv => Err(AppError::IllegalStateError(
                "token source did not resolve".to_string(),
            )),
            TokenSource::Static(token) => Ok(token),
            TokenSource::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let response = self
                    .http
                    .post(format!("{}/v2/oauth2/token", self.auth_base))
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await
                    .map_err(|e| AppError::upstream("client-credentials grant", e))?;
                let grant: TokenGrant =
                    decode_response(response, "client-credentials grant").await?;
                Ok(grant.access_token)
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        op: &'static str,
    ) -> AppResult<T> {
        let bearer = self.bearer().await?;
        debug!(url, op, "federation GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::upstream(op, e))?;
        decode_response(response, op).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
        op: &'static str,
    ) -> AppResult<T> {
        let bearer = self.bearer().await?;
        debug!(url, op, "federation POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::upstream(op, e))?;
        decode_response(response, op).await
    }

    pub async fn delete(&self, url: &str, op: &'static str) -> AppResult<()> {
        let bearer = self.bearer().await?;
        debug!(url, op, "federation DELETE");
        let response = self
            .http
            .delete(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::upstream(op, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(op, format!("{}: {}", status, body)));
        }
        Ok(())
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    op: &'static str,
) -> AppResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::upstream(op, e))?;
    if !status.is_success() {
        return Err(AppError::upstream(op, format!("{}: {}", status, body)));
    }
    serde_json::from_str(&body).map_err(|e| AppError::malformed("federation API", e))
}
