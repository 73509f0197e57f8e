#[path = "threshold-combiner/cli.rs"]
mod cli;
#[path = "threshold-combiner/setup.rs"]
mod setup;

use crate::cli::Cli;
use combiner_service::api::{run_http_server, ApiState};
use combiner_service::service::flow::CombinerFlow;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse_args();
    setup::init_logging(&args.log_level, args.log_dir.as_deref())?;
    info!("threshold-combiner starting log_level={}", args.log_level);

    let config = setup::load_app_config(args.config.as_deref())?;
    setup::log_startup_banner(&config);

    let flow = CombinerFlow::new(&config)?;
    setup::spawn_status_reporter(flow.metrics());

    let addr: SocketAddr = config.server.addr.parse().map_err(|err| format!("invalid server.addr {}: {}", config.server.addr, err))?;
    let state = Arc::new(ApiState::new(&flow, &config.server));
    run_http_server(addr, state, setup::shutdown_signal()).await?;
    info!("threshold-combiner stopped");
    Ok(())
}
