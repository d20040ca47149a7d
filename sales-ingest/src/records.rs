//! CSV record shapes and sale row validation.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Row of `products.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i32,
    pub sku: String,
    pub name: String,
}

/// Row of `regions.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: i32,
    pub code: String,
    pub name: String,
}

/// Row of `sales.csv` as read, before any validation.
///
/// Every column is text so that one bad value rejects its row instead of
/// failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSaleRecord {
    pub sale_date: String,
    pub product_id: String,
    pub region_id: String,
    pub quantity: String,
    pub unit_price: String,
}

/// A validated sale, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_date: NaiveDate,
    pub product_id: i32,
    pub region_id: i32,
    pub quantity: i32,
    pub unit_price: i32,
}

/// Why a sale row was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidDate(String),
    MissingProduct,
    MissingRegion,
    InvalidNumber { column: &'static str, value: String },
    NonPositiveQuantity(i32),
    NegativePrice(i32),
    UnknownProduct(i32),
    UnknownRegion(i32),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate(v) => write!(f, "invalid sale_date '{}'", v),
            Self::MissingProduct => write!(f, "missing product_id"),
            Self::MissingRegion => write!(f, "missing region_id"),
            Self::InvalidNumber { column, value } => write!(f, "invalid {} '{}'", column, value),
            Self::NonPositiveQuantity(q) => write!(f, "quantity must be positive, got {}", q),
            Self::NegativePrice(p) => write!(f, "unit_price must not be negative, got {}", p),
            Self::UnknownProduct(id) => write!(f, "unknown product_id {}", id),
            Self::UnknownRegion(id) => write!(f, "unknown region_id {}", id),
        }
    }
}

fn parse_int(column: &'static str, value: &str) -> Result<i32, RejectReason> {
    value.trim().parse().map_err(|_| RejectReason::InvalidNumber {
        column,
        value: value.to_string(),
    })
}

fn parse_id(column: &'static str, value: &str, missing: RejectReason) -> Result<i32, RejectReason> {
    if value.trim().is_empty() {
        return Err(missing);
    }
    parse_int(column, value)
}

impl RawSaleRecord {
    /// Validate this row against the loaded product and region ids.
    pub fn validate(
        &self,
        products: &HashSet<i32>,
        regions: &HashSet<i32>,
    ) -> Result<SaleRecord, RejectReason> {
        let sale_date = NaiveDate::parse_from_str(self.sale_date.trim(), "%Y-%m-%d")
            .map_err(|_| RejectReason::InvalidDate(self.sale_date.clone()))?;
        let product_id = parse_id("product_id", &self.product_id, RejectReason::MissingProduct)?;
        let region_id = parse_id("region_id", &self.region_id, RejectReason::MissingRegion)?;
        let quantity = parse_int("quantity", &self.quantity)?;
        let unit_price = parse_int("unit_price", &self.unit_price)?;

        if quantity <= 0 {
            return Err(RejectReason::NonPositiveQuantity(quantity));
        }
        if unit_price < 0 {
            return Err(RejectReason::NegativePrice(unit_price));
        }
        if !products.contains(&product_id) {
            return Err(RejectReason::UnknownProduct(product_id));
        }
        if !regions.contains(&region_id) {
            return Err(RejectReason::UnknownRegion(region_id));
        }

        Ok(SaleRecord {
            sale_date,
            product_id,
            region_id,
            quantity,
            unit_price,
        })
    }
}

impl From<&SaleRecord> for RawSaleRecord {
    fn from(sale: &SaleRecord) -> Self {
        Self {
            sale_date: sale.sale_date.format("%Y-%m-%d").to_string(),
            product_id: sale.product_id.to_string(),
            region_id: sale.region_id.to_string(),
            quantity: sale.quantity.to_string(),
            unit_price: sale.unit_price.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, product: &str, region: &str, qty: &str, price: &str) -> RawSaleRecord {
        RawSaleRecord {
            sale_date: date.to_string(),
            product_id: product.to_string(),
            region_id: region.to_string(),
            quantity: qty.to_string(),
            unit_price: price.to_string(),
        }
    }

    fn known() -> (HashSet<i32>, HashSet<i32>) {
        (HashSet::from([1, 2]), HashSet::from([1]))
    }

    #[test]
    fn test_valid_row() {
        let (products, regions) = known();
        let sale = raw("2025-06-01", "1", "1", "2", "10")
            .validate(&products, &regions)
            .unwrap();
        assert_eq!(sale.quantity, 2);
        assert_eq!(sale.sale_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn test_rejections() {
        let (products, regions) = known();
        let cases = [
            (raw("06/01/2025", "1", "1", "2", "10"), RejectReason::InvalidDate("06/01/2025".into())),
            (raw("2025-06-01", "", "1", "2", "10"), RejectReason::MissingProduct),
            (raw("2025-06-01", "1", " ", "2", "10"), RejectReason::MissingRegion),
            (raw("2025-06-01", "1", "1", "0", "10"), RejectReason::NonPositiveQuantity(0)),
            (raw("2025-06-01", "1", "1", "3", "-1"), RejectReason::NegativePrice(-1)),
            (raw("2025-06-01", "9", "1", "3", "1"), RejectReason::UnknownProduct(9)),
            (raw("2025-06-01", "2", "7", "3", "1"), RejectReason::UnknownRegion(7)),
        ];
        for (row, expected) in cases {
            assert_eq!(row.validate(&products, &regions).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_zero_price_is_allowed() {
        let (products, regions) = known();
        assert!(raw("2025-06-01", "1", "1", "1", "0")
            .validate(&products, &regions)
            .is_ok());
    }

    #[test]
    fn test_non_numeric_quantity() {
        let (products, regions) = known();
        let err = raw("2025-06-01", "1", "1", "two", "10")
            .validate(&products, &regions)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid quantity 'two'");
    }
}
