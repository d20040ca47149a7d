//! CSV ingestion into PostgreSQL.
//!
//! Loads products, then regions, then sales, so every foreign key target
//! exists before the rows that reference it. Each table is truncated first;
//! a run replaces the dataset rather than appending to it.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use tokio_postgres::Client;

use crate::error::{IngestError, IngestResult};
use crate::generator::{PRODUCTS_FILE, REGIONS_FILE, SALES_FILE};
use crate::migrations::run_migrations;
use crate::records::{ProductRecord, RawSaleRecord, RegionRecord, RejectReason, SaleRecord};

/// Rows skipped while validating a sales file, with their 1-based data line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedSales {
    pub valid: Vec<SaleRecord>,
    pub rejected: Vec<(usize, RejectReason)>,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub products: u64,
    pub regions: u64,
    pub sales_inserted: u64,
    pub sales_rejected: u64,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingestion Summary:")?;
        writeln!(f, "  Products:       {}", self.products)?;
        writeln!(f, "  Regions:        {}", self.regions)?;
        writeln!(f, "  Sales inserted: {}", self.sales_inserted)?;
        write!(f, "  Sales rejected: {}", self.sales_rejected)
    }
}

/// Deserialize every row of a CSV stream with a header line.
pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R, file: &str) -> IngestResult<Vec<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .map(|row| row.map_err(|e| IngestError::csv(file, e)))
        .collect()
}

fn read_csv_file<T: DeserializeOwned>(dir: &Path, name: &str) -> IngestResult<Vec<T>> {
    let path = dir.join(name);
    let file = File::open(&path).map_err(|e| IngestError::io(&path, e))?;
    read_csv(file, name)
}

/// Split raw sales rows into insertable and rejected rows.
pub fn validate_sales(
    raw: &[RawSaleRecord],
    products: &HashSet<i32>,
    regions: &HashSet<i32>,
) -> ValidatedSales {
    let mut validated = ValidatedSales::default();
    for (idx, row) in raw.iter().enumerate() {
        match row.validate(products, regions) {
            Ok(sale) => validated.valid.push(sale),
            Err(reason) => validated.rejected.push((idx + 1, reason)),
        }
    }
    validated
}

/// First day of every month that has a sale, ascending and deduplicated.
pub fn partition_months(sales: &[SaleRecord]) -> BTreeSet<NaiveDate> {
    sales
        .iter()
        .filter_map(|s| s.sale_date.with_day(1))
        .collect()
}

async fn load_products(client: &mut Client, products: &[ProductRecord]) -> IngestResult<u64> {
    let tx = client.transaction().await?;
    tx.batch_execute("TRUNCATE products RESTART IDENTITY CASCADE").await?;
    let insert = tx
        .prepare("INSERT INTO products (id, sku, name) VALUES ($1, $2, $3)")
        .await?;
    for product in products {
        tx.execute(&insert, &[&product.id, &product.sku, &product.name])
            .await?;
    }
    tx.execute(
        "SELECT setval(pg_get_serial_sequence('products', 'id'), GREATEST(COALESCE(MAX(id), 0), 1)) FROM products",
        &[],
    )
    .await?;
    tx.commit().await?;

    tracing::info!(rows = products.len(), "Products loaded");
    Ok(products.len() as u64)
}

async fn load_regions(client: &mut Client, regions: &[RegionRecord]) -> IngestResult<u64> {
    let tx = client.transaction().await?;
    tx.batch_execute("TRUNCATE regions RESTART IDENTITY CASCADE").await?;
    let insert = tx
        .prepare("INSERT INTO regions (id, code, name) VALUES ($1, $2, $3)")
        .await?;
    for region in regions {
        tx.execute(&insert, &[&region.id, &region.code, &region.name])
            .await?;
    }
    tx.execute(
        "SELECT setval(pg_get_serial_sequence('regions', 'id'), GREATEST(COALESCE(MAX(id), 0), 1)) FROM regions",
        &[],
    )
    .await?;
    tx.commit().await?;

    tracing::info!(rows = regions.len(), "Regions loaded");
    Ok(regions.len() as u64)
}

/// Create the monthly partition covering each of `months`.
pub async fn ensure_partitions(client: &Client, months: &BTreeSet<NaiveDate>) -> IngestResult<()> {
    let create = client.prepare("SELECT create_month_partition($1)").await?;
    for month in months {
        client.execute(&create, &[month]).await?;
        tracing::debug!(month = %month, "Partition ensured");
    }
    Ok(())
}

async fn load_sales(client: &mut Client, sales: &[SaleRecord]) -> IngestResult<u64> {
    ensure_partitions(client, &partition_months(sales)).await?;

    let tx = client.transaction().await?;
    tx.batch_execute("TRUNCATE sales RESTART IDENTITY").await?;
    let insert = tx
        .prepare(
            "INSERT INTO sales (sale_date, product_id, region_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .await?;
    for sale in sales {
        tx.execute(
            &insert,
            &[
                &sale.sale_date,
                &sale.product_id,
                &sale.region_id,
                &sale.quantity,
                &sale.unit_price,
            ],
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(rows = sales.len(), "Sales loaded");
    Ok(sales.len() as u64)
}

/// Run migrations and reload all three CSV files from `data_dir`.
pub async fn ingest_dir(client: &mut Client, data_dir: &Path) -> IngestResult<IngestSummary> {
    run_migrations(client).await?;

    let products: Vec<ProductRecord> = read_csv_file(data_dir, PRODUCTS_FILE)?;
    let regions: Vec<RegionRecord> = read_csv_file(data_dir, REGIONS_FILE)?;
    let raw_sales: Vec<RawSaleRecord> = read_csv_file(data_dir, SALES_FILE)?;

    let products_loaded = load_products(client, &products).await?;
    let regions_loaded = load_regions(client, &regions).await?;

    let product_ids: HashSet<i32> = products.iter().map(|p| p.id).collect();
    let region_ids: HashSet<i32> = regions.iter().map(|r| r.id).collect();
    let validated = validate_sales(&raw_sales, &product_ids, &region_ids);
    for (line, reason) in validated.rejected.iter().take(20) {
        tracing::warn!(line, reason = %reason, "Sale row rejected");
    }

    let sales_inserted = load_sales(client, &validated.valid).await?;

    Ok(IngestSummary {
        products: products_loaded,
        regions: regions_loaded,
        sales_inserted,
        sales_rejected: validated.rejected.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES_CSV: &str = "\
sale_date,product_id,region_id,quantity,unit_price
2025-06-01,1,1,2,10
2025-06-02,1,1,0,10
2025-07-15, 2 ,1,1,500
bad-date,1,1,1,1
2025-05-31,,1,1,1
";

    #[test]
    fn test_read_and_validate_sales() {
        let raw: Vec<RawSaleRecord> = read_csv(SALES_CSV.as_bytes(), SALES_FILE).unwrap();
        assert_eq!(raw.len(), 5);

        let validated = validate_sales(&raw, &HashSet::from([1, 2]), &HashSet::from([1]));
        assert_eq!(validated.valid.len(), 2);
        let lines: Vec<usize> = validated.rejected.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert_eq!(validated.rejected[0].1, RejectReason::NonPositiveQuantity(0));
    }

    #[test]
    fn test_partition_months_dedup() {
        let raw: Vec<RawSaleRecord> = read_csv(SALES_CSV.as_bytes(), SALES_FILE).unwrap();
        let validated = validate_sales(&raw, &HashSet::from([1, 2]), &HashSet::from([1]));
        let months: Vec<String> = partition_months(&validated.valid)
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(months, vec!["2025-06-01", "2025-07-01"]);
    }

    #[test]
    fn test_read_products_rejects_bad_id() {
        let csv = "id,sku,name\nx,A,A\n";
        let err = read_csv::<ProductRecord, _>(csv.as_bytes(), PRODUCTS_FILE).unwrap_err();
        assert!(matches!(err, IngestError::Csv { .. }));
    }

    #[test]
    fn test_summary_display() {
        let summary = IngestSummary {
            products: 10,
            regions: 7,
            sales_inserted: 990,
            sales_rejected: 10,
        };
        let text = summary.to_string();
        assert!(text.contains("Sales inserted: 990"));
        assert!(text.contains("Sales rejected: 10"));
    }
}
