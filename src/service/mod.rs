pub use app_error::{AppError, AppResult};
pub use config::{
    global_config, BridgeConfig, FabricConfig, FacilityConfig, FederationConfig, GeneralConfig,
    GLOBAL_CONFIG,
};
pub use tracing_config::{setup_local_tracing, setup_tracing};

mod app_error;
mod config;
mod tracing_config;
