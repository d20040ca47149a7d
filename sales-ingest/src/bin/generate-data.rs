//! Write a synthetic sales dataset as CSV files.

use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sales_ingest::{generate_dataset, GeneratorConfig, IngestError, IngestResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "generate-data", version, about = "Generate synthetic sales CSV data")]
struct Args {
    /// Number of products to generate
    #[arg(short = 'p', long, default_value_t = 10)]
    products_count: usize,

    /// Number of sales rows to generate
    #[arg(short = 's', long, default_value_t = 1000)]
    sales_count: usize,

    /// Output directory for the CSV files
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,

    /// RNG seed for a reproducible dataset
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> IngestResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.products_count == 0 {
        return Err(IngestError::InvalidArgument(
            "--products-count must be at least 1".to_string(),
        ));
    }

    let today = chrono::Utc::now().date_naive();
    let config = GeneratorConfig::new(args.products_count, args.sales_count, today);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let counts = generate_dataset(&config, &args.out_dir, &mut rng)?;
    println!(
        "Generated {} products, {} regions and {} sales in {}",
        counts.products,
        counts.regions,
        counts.sales,
        args.out_dir.display()
    );
    Ok(())
}
