extern crate config as _;

use std::path::Path;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};

pub static GLOBAL_CONFIG: OnceCell<BridgeConfig> = OnceCell::new();
pub fn global_config() -> &'static BridgeConfig {
    GLOBAL_CONFIG.get().unwrap()
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    pub name: String,
    pub log_dir: String,
}

/// Upstream endpoints for the facility-status bridge.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct FacilityConfig {
    pub nersc_api_base: String,
    pub nersc_status_endpoint: String,
    pub alcf_status_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

/// Event-fabric bridge settings.
///
/// `bootstrap_servers` names the managed broker endpoints; the wire client
/// itself lives behind the partition-reader seam, so only the identity and
/// per-call defaults are consumed here.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FabricConfig {
    pub bootstrap_servers: String,
    pub auth_base: String,
    pub client_id: String,
    /// Default number of messages per consume call.
    pub default_num_msg: i64,
    /// Default bounded-poll timeout, in seconds.
    pub default_timeout_secs: f64,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FederationConfig {
    pub auth_base: String,
    pub compute_api_base: String,
    pub transfer_api_base: String,
    pub search_api_base: String,
    pub flows_api_base: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    pub general: GeneralConfig,
    pub facility: FacilityConfig,
    pub fabric: FabricConfig,
    pub federation: FederationConfig,
}

impl BridgeConfig {
    pub fn set_up_config<P: AsRef<Path>>(path: P) -> AppResult<BridgeConfig> {
        let path_str = path
            .as_ref()
            .to_str()
            .ok_or(AppError::InvalidValue(format!(
                "config file path: {}",
                path.as_ref().to_string_lossy()
            )))?;
        let config = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .build()
            .unwrap_or_else(|err| {
                eprintln!("error in reading config files: {:?}", err);
                std::process::exit(1);
            });

        let bridge_config: BridgeConfig = config.try_deserialize()?;

        Ok(bridge_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_up_config_reads_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.toml");
        std::fs::write(
            &path,
            r#"
[general]
name = "test-bridges"
log_dir = "./logs"

[facility]
nersc_api_base = "https://api.nersc.gov/api/v1.2"
nersc_status_endpoint = "status/"
alcf_status_url = "https://status.alcf.anl.gov/polaris/activity.json"
http_timeout_secs = 30
user_agent = "test-bridges/1.0"

[fabric]
bootstrap_servers = "broker:9092"
auth_base = "https://auth.example.org"
client_id = "client-1"
default_num_msg = 10
default_timeout_secs = 5.0

[federation]
auth_base = "https://auth.example.org"
compute_api_base = "https://compute.example.org"
transfer_api_base = "https://transfer.example.org/v0.10"
search_api_base = "https://search.example.org"
flows_api_base = "https://flows.example.org"
http_timeout_secs = 30
"#,
        )
        .unwrap();

        let cfg = BridgeConfig::set_up_config(&path).unwrap();
        assert_eq!(cfg.general.name, "test-bridges");
        assert_eq!(cfg.fabric.default_num_msg, 10);
        assert_eq!(cfg.fabric.default_timeout_secs, 5.0);
        assert_eq!(cfg.federation.http_timeout_secs, 30);
    }
}
