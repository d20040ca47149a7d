//! Synthetic CSV dataset generation.
//!
//! Products get `{category} {type} {n:03}` names and `{TYP}{n:03}` SKUs,
//! regions are the seven continents, and sales fall within the last 180
//! days with quantity 1..=100 and unit price 500..=5000.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{IngestError, IngestResult};
use crate::records::{ProductRecord, RawSaleRecord, RegionRecord, SaleRecord};

const PRODUCT_TYPES: &[&str] = &[
    "Excavator",
    "Bulldozer",
    "Crane",
    "Dump Truck",
    "Loader",
    "Backhoe",
    "Concrete Mixer",
    "Forklift",
    "Grader",
    "Compactor",
    "Scissor Lift",
    "Skid Steer",
    "Paver",
    "Drill Rig",
];

const CATEGORIES: &[&str] = &[
    "Standard",
    "Heavy Duty",
    "Compact",
    "Hydraulic",
    "Electric",
    "Tracked",
    "Wheeled",
    "All-Terrain",
];

const WORLD_REGIONS: &[(&str, &str)] = &[
    ("AF", "Africa"),
    ("AS", "Asia"),
    ("EU", "Europe"),
    ("NA", "North America"),
    ("OC", "Oceania"),
    ("SA", "South America"),
    ("AN", "Antarctica"),
];

pub const PRODUCTS_FILE: &str = "products.csv";
pub const REGIONS_FILE: &str = "regions.csv";
pub const SALES_FILE: &str = "sales.csv";

/// Settings for one generated dataset.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub products_count: usize,
    pub sales_count: usize,
    /// Sales are dated within `[today - days_back, today]`.
    pub days_back: i64,
    pub today: NaiveDate,
}

impl GeneratorConfig {
    pub fn new(products_count: usize, sales_count: usize, today: NaiveDate) -> Self {
        Self {
            products_count,
            sales_count,
            days_back: 180,
            today,
        }
    }
}

pub fn generate_products(count: usize, rng: &mut impl Rng) -> Vec<ProductRecord> {
    (1..=count)
        .map(|i| {
            let product_type = PRODUCT_TYPES.choose(rng).copied().unwrap_or("Loader");
            let category = CATEGORIES.choose(rng).copied().unwrap_or("Standard");
            let prefix: String = product_type.chars().take(3).collect::<String>().to_uppercase();
            ProductRecord {
                id: i as i32,
                sku: format!("{}{:03}", prefix, i),
                name: format!("{} {} {:03}", category, product_type, i),
            }
        })
        .collect()
}

pub fn generate_regions() -> Vec<RegionRecord> {
    WORLD_REGIONS
        .iter()
        .enumerate()
        .map(|(i, (code, name))| RegionRecord {
            id: i as i32 + 1,
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

pub fn generate_sales(
    config: &GeneratorConfig,
    products: &[ProductRecord],
    regions: &[RegionRecord],
    rng: &mut impl Rng,
) -> IngestResult<Vec<SaleRecord>> {
    if products.is_empty() || regions.is_empty() {
        return Err(IngestError::InvalidArgument(
            "sales need at least one product and one region".to_string(),
        ));
    }
    let start = config.today - Duration::days(config.days_back.max(0));

    let mut sales = Vec::with_capacity(config.sales_count);
    for _ in 0..config.sales_count {
        let (Some(product), Some(region)) = (products.choose(rng), regions.choose(rng)) else {
            continue;
        };
        sales.push(SaleRecord {
            sale_date: start + Duration::days(rng.random_range(0..=config.days_back.max(0))),
            product_id: product.id,
            region_id: region.id,
            quantity: rng.random_range(1..=100),
            unit_price: rng.random_range(500..=5000),
        });
    }
    Ok(sales)
}

/// Write `rows` with a header line. Returns the number of data rows.
pub fn write_csv<W: Write, T: Serialize>(writer: W, file: &str, rows: &[T]) -> IngestResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).map_err(|e| IngestError::csv(file, e))?;
    }
    wtr.flush().map_err(|e| IngestError::io(file, e))?;
    Ok(rows.len())
}

/// Row counts of a generated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedCounts {
    pub products: usize,
    pub regions: usize,
    pub sales: usize,
}

fn write_file<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> IngestResult<usize> {
    let path: PathBuf = dir.join(name);
    let file = File::create(&path).map_err(|e| IngestError::io(&path, e))?;
    let written = write_csv(file, name, rows)?;
    tracing::info!(path = %path.display(), rows = written, "CSV file written");
    Ok(written)
}

/// Generate products, regions and sales and write them into `out_dir`.
pub fn generate_dataset(
    config: &GeneratorConfig,
    out_dir: &Path,
    rng: &mut impl Rng,
) -> IngestResult<GeneratedCounts> {
    fs::create_dir_all(out_dir).map_err(|e| IngestError::io(out_dir, e))?;

    let products = generate_products(config.products_count, rng);
    let regions = generate_regions();
    let sales = generate_sales(config, &products, &regions, rng)?;
    let raw_sales: Vec<RawSaleRecord> = sales.iter().map(RawSaleRecord::from).collect();

    Ok(GeneratedCounts {
        products: write_file(out_dir, PRODUCTS_FILE, &products)?,
        regions: write_file(out_dir, REGIONS_FILE, &regions)?,
        sales: write_file(out_dir, SALES_FILE, &raw_sales)?,
    })
}
