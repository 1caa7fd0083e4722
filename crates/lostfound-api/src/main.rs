use lostfound_core::Config;
use lostfound_infra::{init_telemetry, LogFormat};

// Use mimalloc as the global allocator for lower fragmentation in long-running containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    init_telemetry(
        "lostfound-api",
        &config.inner().base.environment,
        LogFormat::from_env(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (state, router) = lostfound_api::setup::initialize_app(config.clone()).await?;

    lostfound_api::setup::server::start_server(&config, router, state.task_queue.clone()).await?;

    Ok(())
}
