//! Login state for the fabric bridge.
//!
//! The bridge holds one session per process. Authentication is a two-step
//! authorization-code flow for interactive users, or a single
//! client-credentials call for service accounts. Every data-plane tool
//! guards itself with [`FabricSession::require_login`].

use serde::Deserialize;
use tracing::{info, warn};

use crate::service::{AppError, AppResult, FabricConfig};

const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// An authenticated principal.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub access_token: String,
}

/// Per-process login state.
#[derive(Debug, Default)]
pub struct FabricSession {
    pending_auth: bool,
    identity: Option<Identity>,
}

impl FabricSession {
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn has_pending_auth(&self) -> bool {
        self.pending_auth
    }

    /// Fail with a uniform error unless a login has completed.
    pub fn require_login(&self) -> AppResult<&Identity> {
        self.identity.as_ref().ok_or_else(|| {
            AppError::NotAuthenticated(
                "please authenticate first using start_fabric_auth and complete_fabric_auth"
                    .to_string(),
            )
        })
    }

    pub fn begin(&mut self) {
        self.pending_auth = true;
    }

    pub fn complete(&mut self, identity: Identity) {
        info!(user_id = %identity.user_id, "fabric login completed");
        self.pending_auth = false;
        self.identity = Some(identity);
    }

    /// Clear all state. Returns the identity that was logged out, if any.
    pub fn clear(&mut self) -> Option<Identity> {
        self.pending_auth = false;
        self.identity.take()
    }
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
}

/// HTTP client for the identity provider's OAuth2 endpoints.
#[derive(Debug)]
pub struct IdentityClient {
    http: reqwest::Client,
    auth_base: String,
    client_id: String,
}

impl IdentityClient {
    pub fn new(cfg: &FabricConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::upstream("identity client construction", e))?;
        Ok(IdentityClient {
            http,
            auth_base: cfg.auth_base.trim_end_matches('/').to_string(),
            client_id: cfg.client_id.clone(),
        })
    }

    /// URL the user visits to obtain an authorization code out-of-band.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/v2/oauth2/authorize?client_id={}&response_type=code&scope=openid&redirect_uri={}",
            self.auth_base, self.client_id, OOB_REDIRECT
        )
    }

    /// Exchange an authorization code for an identity.
    pub async fn exchange_code(&self, code: &str) -> AppResult<Identity> {
        let grant: TokenGrant = self
            .post_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", OOB_REDIRECT),
            ])
            .await?;
        let user_id = self.user_id_for(&grant.access_token).await?;
        Ok(Identity {
            user_id,
            access_token: grant.access_token,
        })
    }

    /// Service-account login with a client id and secret.
    pub async fn client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> AppResult<Identity> {
        let response = self
            .http
            .post(format!("{}/v2/oauth2/token", self.auth_base))
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "openid")])
            .send()
            .await
            .map_err(|e| AppError::upstream("client-credentials grant", e))?;
        let grant: TokenGrant = Self::decode(response, "client-credentials grant").await?;
        Ok(Identity {
            user_id: client_id.to_string(),
            access_token: grant.access_token,
        })
    }

    /// Revoke an access token. Revocation failures are logged, not fatal;
    /// the local session is cleared regardless.
    pub async fn revoke(&self, token: &str) -> bool {
        let result = self
            .http
            .post(format!("{}/v2/oauth2/token/revoke", self.auth_base))
            .form(&[("token", token), ("client_id", self.client_id.as_str())])
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "token revocation rejected");
                false
            }
            Err(err) => {
                warn!(error = %err, "token revocation request failed");
                false
            }
        }
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> AppResult<TokenGrant> {
        let response = self
            .http
            .post(format!("{}/v2/oauth2/token", self.auth_base))
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::upstream("token exchange", e))?;
        Self::decode(response, "token exchange").await
    }

    async fn user_id_for(&self, access_token: &str) -> AppResult<String> {
        let response = self
            .http
            .get(format!("{}/v2/oauth2/userinfo", self.auth_base))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream("userinfo lookup", e))?;
        let info: UserInfo = Self::decode(response, "userinfo lookup").await?;
        Ok(info.sub)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
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
        serde_json::from_str(&body).map_err(|e| AppError::malformed("identity provider", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_fails_before_login() {
        let session = FabricSession::default();
        assert!(matches!(
            session.require_login(),
            Err(AppError::NotAuthenticated(_))
        ));
    }

    #[test]
    fn test_login_lifecycle() {
        let mut session = FabricSession::default();
        session.begin();
        assert!(session.has_pending_auth());
        assert!(!session.is_logged_in());

        session.complete(Identity {
            user_id: "alice".to_string(),
            access_token: "tok".to_string(),
        });
        assert!(session.is_logged_in());
        assert!(!session.has_pending_auth());
        assert_eq!(session.require_login().unwrap().user_id, "alice");

        let out = session.clear().unwrap();
        assert_eq!(out.user_id, "alice");
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_authorize_url_carries_client_id() {
        let client = IdentityClient::new(&FabricConfig {
            bootstrap_servers: "broker:9092".to_string(),
            auth_base: "https://auth.example.org/".to_string(),
            client_id: "bridge-client".to_string(),
            default_num_msg: 10,
            default_timeout_secs: 5.0,
        })
        .unwrap();
        let url = client.authorize_url();
        assert!(url.starts_with("https://auth.example.org/v2/oauth2/authorize"));
        assert!(url.contains("client_id=bridge-client"));
        assert!(url.contains("response_type=code"));
    }
}
