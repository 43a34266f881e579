use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use jackpot_engine::contribute::ContributionService;
use jackpot_engine::evaluate::EvaluationService;
use jackpot_engine::policy::PolicyRegistry;
use jackpot_engine::resolver::PolicyResolver;
use jackpot_engine::seed;
use jackpot_engine::store::Store;
use jackpot_service::bus::BetBus;
use jackpot_service::App;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host interface to bind (default: localhost).
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Path to the SQLite jackpot database.
    #[arg(long, default_value = "jackpot.db")]
    db: PathBuf,

    /// Number of bet bus partitions; per-jackpot FIFO holds within one.
    #[arg(long, default_value_t = 3)]
    partitions: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let store = Arc::new(Store::open(&args.db)?);
    seed::seed_demo_jackpots(&store).context("seed demo jackpots")?;

    let registry = Arc::new(PolicyRegistry::standard());
    let resolver = Arc::new(PolicyResolver::new(registry));
    let contribution = Arc::new(ContributionService::new(
        Arc::clone(&store),
        Arc::clone(&resolver),
    ));
    let evaluation = EvaluationService::new(Arc::clone(&store), resolver);

    let (bus, _workers) = BetBus::start(contribution, args.partitions);
    let app = Arc::new(App { bus, evaluation });

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, db = %args.db.display(), partitions = args.partitions, "jackpot service listening");
    axum::serve(listener, app.router())
        .await
        .context("serve http")?;
    Ok(())
}
