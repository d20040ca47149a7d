//! Sales Test Utilities
//!
//! Shared test infrastructure for the sales workspace:
//! - Fake query executors (recording and in-memory evaluating)
//! - Proptest generators for parameters and values
//! - Seed fixtures mirroring the end-to-end dataset

pub use sales_core::{
    DateRange, MonthRow, QueryExecutor, QueryParams, ReportError, ReportResult, Row, SqlValue,
    Statement, TopProductRow,
};

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// RECORDING EXECUTOR
// ============================================================================

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Row>),
    Fail(ReportError),
}

/// Executor that returns a canned reply and records every call.
///
/// Parameters are bound against the statement before replying, so a test
/// using this executor still fails on a missing or unexpected placeholder.
#[derive(Debug)]
pub struct RecordingExecutor {
    reply: Reply,
    ping: Option<ReportError>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<(String, QueryParams)>>,
}

impl RecordingExecutor {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            ping: None,
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Reply to every query with `rows`.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self::new(Reply::Rows(rows))
    }

    /// Reply to every query with no rows.
    pub fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Fail every query with `err`.
    pub fn failing(err: ReportError) -> Self {
        Self::new(Reply::Fail(err))
    }

    /// Make `ping()` fail with `err`.
    pub fn with_ping_error(mut self, err: ReportError) -> Self {
        self.ping = Some(err);
        self
    }

    /// Number of `execute()` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Statement names and parameters of every `execute()` call, in order.
    pub fn recorded(&self) -> Vec<(String, QueryParams)> {
        match self.recorded.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, statement: &Statement, params: &QueryParams) -> ReportResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push((statement.name().to_string(), params.clone()));
        }
        statement.bind(params)?;

        match &self.reply {
            Reply::Rows(rows) => Ok(rows.clone()),
            Reply::Fail(err) => Err(err.clone()),
        }
    }

    async fn ping(&self) -> ReportResult<()> {
        match &self.ping {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// SEED EXECUTOR
// ============================================================================

/// Executor that evaluates both reports in memory over a [`fixtures::Dataset`].
///
/// Grouping, filtering and ordering follow the catalog statements, so tests
/// can check report properties without a database.
#[derive(Debug)]
pub struct SeedExecutor {
    dataset: fixtures::Dataset,
    calls: AtomicUsize,
}

impl SeedExecutor {
    pub fn new(dataset: fixtures::Dataset) -> Self {
        Self {
            dataset,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn date_param(params: &QueryParams, name: &str) -> ReportResult<chrono::NaiveDate> {
        params
            .get(name)
            .and_then(SqlValue::as_date)
            .ok_or_else(|| ReportError::query(format!("parameter {} must be a date", name)))
    }

    fn text_param<'a>(params: &'a QueryParams, name: &str) -> ReportResult<&'a str> {
        params
            .get(name)
            .and_then(SqlValue::as_str)
            .ok_or_else(|| ReportError::query(format!("parameter {} must be text", name)))
    }

    /// Sales within `[start, end)` matching the optional sku and region filters.
    fn matching<'a>(
        &'a self,
        params: &QueryParams,
        sku: &'a str,
    ) -> ReportResult<impl Iterator<Item = (&'a fixtures::Sale, &'a fixtures::Product)> + 'a> {
        let start = Self::date_param(params, "start")?;
        let end = Self::date_param(params, "end")?;
        let region = Self::text_param(params, "region")?.to_string();

        let products: HashMap<i32, &fixtures::Product> =
            self.dataset.products.iter().map(|p| (p.id, p)).collect();
        let regions: HashMap<i32, &fixtures::Region> =
            self.dataset.regions.iter().map(|r| (r.id, r)).collect();

        Ok(self.dataset.sales.iter().filter_map(move |sale| {
            let product = *products.get(&sale.product_id)?;
            let sale_region = regions.get(&sale.region_id)?;
            let in_range = sale.sale_date >= start && sale.sale_date < end;
            let sku_ok = sku.is_empty() || product.sku == sku;
            let region_ok = region.is_empty() || sale_region.code == region;
            (in_range && sku_ok && region_ok).then_some((sale, product))
        }))
    }

    fn monthly_sales(&self, params: &QueryParams) -> ReportResult<Vec<Row>> {
        let sku = Self::text_param(params, "sku")?;
        let mut months: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for (sale, _) in self.matching(params, sku)? {
            let entry = months
                .entry(sale.sale_date.format("%Y-%m").to_string())
                .or_default();
            entry.0 += sale.revenue();
            entry.1 += i64::from(sale.quantity);
        }

        Ok(months
            .into_iter()
            .map(|(month, (revenue, quantity))| {
                Row::new()
                    .with("month", month)
                    .with("total_revenue", revenue)
                    .with("total_quantity", quantity)
            })
            .collect())
    }

    fn top_products(&self, params: &QueryParams) -> ReportResult<Vec<Row>> {
        let limit = params
            .get("limit")
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| ReportError::query("parameter limit must be an integer"))?;

        let mut totals: BTreeMap<(String, String), (i64, i64)> = BTreeMap::new();
        for (sale, product) in self.matching(params, "")? {
            let entry = totals
                .entry((product.sku.clone(), product.name.clone()))
                .or_default();
            entry.0 += sale.revenue();
            entry.1 += i64::from(sale.quantity);
        }

        let mut ranked: Vec<_> = totals.into_iter().collect();
        ranked.sort_by(|((sku_a, _), (rev_a, _)), ((sku_b, _), (rev_b, _))| {
            rev_b.cmp(rev_a).then_with(|| sku_a.cmp(sku_b))
        });
        ranked.truncate(usize::try_from(limit.max(0)).unwrap_or(0));

        Ok(ranked
            .into_iter()
            .map(|((sku, name), (revenue, quantity))| {
                Row::new()
                    .with("product_sku", sku)
                    .with("product_name", name)
                    .with("total_revenue", revenue)
                    .with("total_quantity", quantity)
            })
            .collect())
    }
}

#[async_trait]
impl QueryExecutor for SeedExecutor {
    async fn execute(&self, statement: &Statement, params: &QueryParams) -> ReportResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        statement.bind(params)?;

        match statement.name() {
            "monthly_sales" => self.monthly_sales(params),
            "top_products" => self.top_products(params),
            other => Err(ReportError::query(format!("unknown statement {}", other))),
        }
    }

    async fn ping(&self) -> ReportResult<()> {
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for report inputs.

    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use sales_core::{MAX_TOP_LIMIT, MIN_TOP_LIMIT};

    /// Dates between 2020-01-01 and roughly the end of 2029.
    pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| {
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default() + chrono::Duration::days(offset)
        })
    }

    /// Non-empty half-open ranges.
    pub fn arb_date_range() -> impl Strategy<Value = DateRange> {
        (arb_date(), 1i64..400).prop_filter_map("range must be non-empty", |(start, days)| {
            DateRange::new(start, start + chrono::Duration::days(days)).ok()
        })
    }

    pub fn arb_region_code() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("US".to_string()),
            Just("EU".to_string()),
            Just("APAC".to_string()),
            "[A-Z]{2,4}",
        ]
    }

    pub fn arb_sku() -> impl Strategy<Value = String> {
        "[A-Z]{3}[0-9]{3}"
    }

    /// Limits accepted by the Top Products report.
    pub fn arb_limit() -> impl Strategy<Value = i64> {
        MIN_TOP_LIMIT..=MAX_TOP_LIMIT
    }

    /// Limits the Top Products report rejects.
    pub fn arb_invalid_limit() -> impl Strategy<Value = i64> {
        prop_oneof![
            (-1000i64..MIN_TOP_LIMIT),
            ((MAX_TOP_LIMIT + 1)..10_000i64),
        ]
    }

    pub fn arb_sql_value() -> impl Strategy<Value = SqlValue> {
        prop_oneof![
            Just(SqlValue::Null),
            any::<bool>().prop_map(SqlValue::Bool),
            any::<i64>().prop_map(SqlValue::Int),
            any::<f64>().prop_map(SqlValue::Float),
            "[a-zA-Z0-9 ]{0,12}".prop_map(SqlValue::Text),
            arb_date().prop_map(SqlValue::Date),
        ]
    }

    /// Parameter maps with 1-6 distinct lowercase names.
    pub fn arb_query_params() -> impl Strategy<Value = QueryParams> {
        prop::collection::hash_map("[a-z]{1,8}", arb_sql_value(), 1..6)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Seed datasets shared by unit, HTTP and database tests.

    use chrono::{Datelike, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Product {
        pub id: i32,
        pub sku: String,
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Region {
        pub id: i32,
        pub code: String,
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Sale {
        pub sale_date: NaiveDate,
        pub product_id: i32,
        pub region_id: i32,
        pub quantity: i32,
        pub unit_price: i32,
    }

    impl Sale {
        pub fn revenue(&self) -> i64 {
            i64::from(self.quantity) * i64::from(self.unit_price)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Dataset {
        pub products: Vec<Product>,
        pub regions: Vec<Region>,
        pub sales: Vec<Sale>,
    }

    impl Dataset {
        /// First day of every month that has at least one sale, ascending.
        pub fn months(&self) -> Vec<NaiveDate> {
            let mut months: Vec<NaiveDate> = self
                .sales
                .iter()
                .filter_map(|s| s.sale_date.with_day(1))
                .collect();
            months.sort();
            months.dedup();
            months
        }
    }

    fn product(id: i32, sku: &str, name: &str) -> Product {
        Product {
            id,
            sku: sku.to_string(),
            name: name.to_string(),
        }
    }

    fn region(id: i32, code: &str, name: &str) -> Region {
        Region {
            id,
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    /// `[2025-06-01, 2025-07-01)`.
    pub fn june_2025() -> super::DateRange {
        match super::DateRange::new(date(2025, 6, 1), date(2025, 7, 1)) {
            Ok(range) => range,
            Err(e) => panic!("fixture range is valid: {}", e),
        }
    }

    /// Two products, two regions, and one sale per day for 2025-06-01..=15
    /// (product A, region US, quantity 2, unit price 10).
    ///
    /// The June monthly total is revenue 300 and quantity 30.
    pub fn seed_small() -> Dataset {
        let sales = (1..=15)
            .map(|day| Sale {
                sale_date: date(2025, 6, day),
                product_id: 1,
                region_id: 1,
                quantity: 2,
                unit_price: 10,
            })
            .collect();

        Dataset {
            products: vec![product(1, "A", "A"), product(2, "B", "B")],
            regions: vec![region(1, "US", "US"), region(2, "EU", "EU")],
            sales,
        }
    }

    /// Five products across three regions, with sales from May to July 2025.
    ///
    /// Revenues differ per product so ranking is unambiguous, except SKU-4
    /// and SKU-5 which tie and are ordered by SKU.
    pub fn seed_multi_region() -> Dataset {
        let products = (1..=5)
            .map(|i| product(i, &format!("SKU-{}", i), &format!("Product {}", i)))
            .collect();
        let regions = vec![
            region(1, "US", "United States"),
            region(2, "EU", "Europe"),
            region(3, "APAC", "Asia Pacific"),
        ];

        // (product_id, quantity, unit_price)
        let lines = [(1, 10, 50), (2, 7, 40), (3, 5, 30), (4, 2, 25), (5, 1, 50)];
        let mut sales = Vec::new();
        for (month, days) in [(5u32, 31u32), (6, 30), (7, 31)] {
            for day in (1..=days).step_by(7) {
                for (idx, (product_id, quantity, unit_price)) in lines.iter().enumerate() {
                    sales.push(Sale {
                        sale_date: date(2025, month, day),
                        product_id: *product_id,
                        region_id: (idx as i32 + day as i32) % 3 + 1,
                        quantity: *quantity,
                        unit_price: *unit_price,
                    });
                }
            }
        }

        Dataset {
            products,
            regions,
            sales,
        }
    }
}
