use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use science_bridges::server::FederationTools;
use science_bridges::service::setup_tracing;
use science_bridges::{global_config, AppError, AppResult, BridgeConfig, GLOBAL_CONFIG};
use tokio::runtime;

#[derive(Parser)]
#[command(version)]
pub struct CommandLine {
    /// path to config file
    #[arg(short, long)]
    pub conf: Option<String>,
    /// log level (v: info, vv: debug, vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn main() -> AppResult<()> {
    dotenv().ok();

    let commandline: CommandLine = CommandLine::parse();
    let config_path = commandline.conf.as_ref().map_or_else(
        || {
            let mut path = PathBuf::from("./");
            path.push("conf.toml");
            path
        },
        PathBuf::from,
    );
    let bridge_config = BridgeConfig::set_up_config(config_path)?;
    GLOBAL_CONFIG
        .set(bridge_config)
        .expect("set bridge config failed");

    let _log_guard = setup_tracing("federation-bridge");

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(serve())
}

async fn serve() -> AppResult<()> {
    let service = FederationTools::new(&global_config().federation)?;
    let server = service
        .serve(stdio())
        .await
        .map_err(|e| AppError::IllegalStateError(format!("serve failed: {}", e)))?;
    server
        .waiting()
        .await
        .map_err(|e| AppError::IllegalStateError(format!("server task failed: {}", e)))?;
    Ok(())
}
