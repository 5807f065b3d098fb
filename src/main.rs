use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vault_router::api::create_api_router;
use vault_router::config::{AppConfig, WorldConfig};
use vault_router::sandbox::Sandbox;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal router error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let api_addr = config.api_socket_addr()?;

    let world = WorldConfig::load(&config.world_file)?;
    let sandbox = Arc::new(Sandbox::build(&world).context("deploy sandbox world")?);

    let app = App {
        config: Arc::new(config),
        sandbox,
    };
    app.run(api_addr).await
}

struct App {
    config: Arc<AppConfig>,
    sandbox: Arc<Sandbox>,
}

impl App {
    async fn run(self, api_addr: std::net::SocketAddr) -> Result<()> {
        let router = self.sandbox.router();
        let owner = router.owner().await;
        let directory = router.directory().await.address();
        info!(
            router = %router.address(),
            owner = %owner,
            directory = %directory,
            world = %self.config.world_file,
            "vault router online"
        );

        let listener = tokio::net::TcpListener::bind(&api_addr)
            .await
            .with_context(|| format!("bind API server address {api_addr}"))?;
        let api_router = create_api_router(self.sandbox.clone());
        info!(address = %api_addr, "HTTP API server starting");
        let mut api_handle = tokio::spawn(async move { axum::serve(listener, api_router).await });

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.heartbeat_secs.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let owner = self.sandbox.router().owner().await;
                    info!(
                        owner = %self.sandbox.book().label(&owner),
                        open_snapshots = self.sandbox.ledger().open_snapshots(),
                        "router heartbeat"
                    );
                    for vault in self.sandbox.vaults() {
                        match vault.total_assets() {
                            Ok(assets) => debug!(vault = %vault.name(), total_assets = assets, "vault telemetry"),
                            Err(err) => warn!(vault = %vault.name(), error = %err, "vault telemetry unavailable"),
                        }
                    }
                }
                res = &mut api_handle => {
                    return Err(api_stopped(res));
                }
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "ctrl_c listener error");
                    }
                    info!("Shutdown signal received, exiting");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// The API server never returns on its own; any exit is fatal.
fn api_stopped(res: std::result::Result<std::io::Result<()>, JoinError>) -> anyhow::Error {
    match res {
        Ok(Ok(())) => anyhow!("API server stopped"),
        Ok(Err(err)) => anyhow::Error::new(err).context("API server error"),
        Err(err) => anyhow::Error::new(err).context("API server task failed"),
    }
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
