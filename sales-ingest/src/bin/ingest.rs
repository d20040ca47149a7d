//! Load `products.csv`, `regions.csv` and `sales.csv` into PostgreSQL.

use std::path::PathBuf;

use clap::Parser;
use sales_ingest::{ingest_dir, IngestResult};
use tokio_postgres::NoTls;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ingest", version, about = "Load generated sales CSV files into PostgreSQL")]
struct Args {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Directory holding the three CSV files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> IngestResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let (mut client, connection) = tokio_postgres::connect(&args.database_url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "PostgreSQL connection error");
        }
    });

    tracing::info!(data_dir = %args.data_dir.display(), "Starting ingestion");
    let summary = ingest_dir(&mut client, &args.data_dir).await?;
    println!("{}", summary);
    Ok(())
}
