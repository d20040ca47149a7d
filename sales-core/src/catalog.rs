//! Query Catalog
//!
//! The two report statements, written with named `:placeholders` and
//! compiled once into PostgreSQL positional form (`$1..$n`).
//!
//! Optional filters use an empty-string sentinel, `(:p = '' OR col = :p)`,
//! so the statement text never changes with the filters in effect. Result
//! cache keys include the statement text, which keeps them stable too.

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::error::ReportResult;
use crate::value::{QueryParams, SqlValue};

/// Errors raised while compiling or binding a statement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatementError {
    #[error("Unterminated string literal starting at byte {offset}")]
    UnterminatedLiteral { offset: usize },

    #[error("Missing parameter :{name}")]
    MissingParameter { name: String },

    #[error("Unexpected parameter :{name}")]
    UnexpectedParameter { name: String },
}

/// A compiled statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    name: &'static str,
    source: &'static str,
    sql: String,
    placeholders: Vec<String>,
}

impl Statement {
    /// Compile named placeholders into positional ones.
    ///
    /// `::type` casts and anything inside single quotes pass through
    /// untouched. A name used more than once maps to a single position.
    pub fn compile(name: &'static str, source: &'static str) -> Result<Self, StatementError> {
        let bytes = source.as_bytes();
        let mut sql = String::with_capacity(source.len());
        let mut placeholders: Vec<String> = Vec::new();
        let mut copied = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\'' => {
                    let start = i;
                    i += 1;
                    loop {
                        match bytes.get(i) {
                            None => return Err(StatementError::UnterminatedLiteral { offset: start }),
                            Some(b'\'') if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                            Some(b'\'') => break,
                            Some(_) => i += 1,
                        }
                    }
                    i += 1;
                }
                b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
                b':' if bytes
                    .get(i + 1)
                    .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') =>
                {
                    sql.push_str(&source[copied..i]);
                    let ident_start = i + 1;
                    let mut end = ident_start;
                    while bytes
                        .get(end)
                        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                    {
                        end += 1;
                    }
                    let ident = &source[ident_start..end];
                    let position = match placeholders.iter().position(|p| p == ident) {
                        Some(existing) => existing + 1,
                        None => {
                            placeholders.push(ident.to_string());
                            placeholders.len()
                        }
                    };
                    sql.push('$');
                    sql.push_str(&position.to_string());
                    copied = end;
                    i = end;
                }
                _ => i += 1,
            }
        }
        sql.push_str(&source[copied..]);

        Ok(Self {
            name,
            source,
            sql,
            placeholders,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Statement text as written, with named placeholders.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Positional SQL sent to the server.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in positional order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Order `params` by placeholder position.
    ///
    /// Every placeholder must be supplied and every supplied name must be a
    /// placeholder.
    pub fn bind<'a>(&self, params: &'a QueryParams) -> Result<Vec<&'a SqlValue>, StatementError> {
        if let Some(unexpected) = params
            .keys()
            .find(|name| !self.placeholders.iter().any(|p| p == *name))
        {
            return Err(StatementError::UnexpectedParameter {
                name: unexpected.clone(),
            });
        }

        self.placeholders
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .ok_or_else(|| StatementError::MissingParameter { name: name.clone() })
            })
            .collect()
    }
}

const MONTHLY_SALES_SQL: &str = "\
SELECT to_char(date_trunc('month', s.sale_date), 'YYYY-MM') AS month,
       SUM(s.quantity * s.unit_price)::bigint AS total_revenue,
       SUM(s.quantity)::bigint AS total_quantity
FROM sales s
JOIN products p ON p.id = s.product_id
JOIN regions  r ON r.id = s.region_id
WHERE s.sale_date >= :start
  AND s.sale_date <  :end
  AND (:sku = '' OR p.sku = :sku)
  AND (:region = '' OR r.code = :region)
GROUP BY month
ORDER BY month";

const TOP_PRODUCTS_SQL: &str = "\
SELECT p.sku AS product_sku,
       p.name AS product_name,
       SUM(s.quantity * s.unit_price)::bigint AS total_revenue,
       SUM(s.quantity)::bigint AS total_quantity
FROM sales s
JOIN products p ON p.id = s.product_id
JOIN regions  r ON r.id = s.region_id
WHERE s.sale_date >= :start
  AND s.sale_date <  :end
  AND (:region = '' OR r.code = :region)
GROUP BY p.sku, p.name
ORDER BY total_revenue DESC, p.sku
LIMIT :limit";

/// Revenue and quantity per calendar month. Params: `start`, `end`, `sku`, `region`.
pub static MONTHLY_SALES: Lazy<Result<Statement, StatementError>> =
    Lazy::new(|| Statement::compile("monthly_sales", MONTHLY_SALES_SQL));

/// Products ranked by revenue. Params: `start`, `end`, `region`, `limit`.
pub static TOP_PRODUCTS: Lazy<Result<Statement, StatementError>> =
    Lazy::new(|| Statement::compile("top_products", TOP_PRODUCTS_SQL));

pub fn monthly_sales() -> ReportResult<&'static Statement> {
    MONTHLY_SALES.as_ref().map_err(|e| e.clone().into())
}

pub fn top_products() -> ReportResult<&'static Statement> {
    TOP_PRODUCTS.as_ref().map_err(|e| e.clone().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_sales_compiles() -> Result<(), String> {
        let stmt = monthly_sales().map_err(|e| e.to_string())?;
        assert_eq!(stmt.placeholders(), ["start", "end", "sku", "region"]);
        assert!(stmt.sql().contains("s.sale_date >= $1"));
        assert!(stmt.sql().contains("s.sale_date <  $2"));
        assert!(stmt.sql().contains("($3 = '' OR p.sku = $3)"));
        assert!(stmt.sql().contains("($4 = '' OR r.code = $4)"));
        assert!(stmt.sql().contains("'YYYY-MM'"));
        assert!(stmt.sql().contains("::bigint AS total_revenue"));
        assert!(!stmt.sql().contains(":start"));
        Ok(())
    }

    #[test]
    fn test_top_products_compiles() -> Result<(), String> {
        let stmt = top_products().map_err(|e| e.to_string())?;
        assert_eq!(stmt.placeholders(), ["start", "end", "region", "limit"]);
        assert!(stmt.sql().contains("ORDER BY total_revenue DESC, p.sku"));
        assert!(stmt.sql().ends_with("LIMIT $4"));
        Ok(())
    }

    #[test]
    fn test_literals_and_casts_are_not_placeholders() -> Result<(), StatementError> {
        let stmt = Statement::compile("t", "SELECT ':a', 'it''s :b', x::text FROM t WHERE y = :c")?;
        assert_eq!(stmt.placeholders(), ["c"]);
        assert_eq!(stmt.sql(), "SELECT ':a', 'it''s :b', x::text FROM t WHERE y = $1");
        Ok(())
    }

    #[test]
    fn test_lone_colon_passes_through() -> Result<(), StatementError> {
        let stmt = Statement::compile("t", "SELECT a : 1, :_x")?;
        assert_eq!(stmt.sql(), "SELECT a : 1, $1");
        assert_eq!(stmt.placeholders(), ["_x"]);
        Ok(())
    }

    #[test]
    fn test_unterminated_literal() {
        let err = Statement::compile("t", "SELECT 'abc").unwrap_err();
        assert_eq!(err, StatementError::UnterminatedLiteral { offset: 7 });
    }

    #[test]
    fn test_bind_orders_by_position() -> Result<(), StatementError> {
        let stmt = Statement::compile("t", "SELECT :b, :a, :b")?;
        let mut params = QueryParams::new();
        params.insert("a".to_string(), SqlValue::Int(1));
        params.insert("b".to_string(), SqlValue::Int(2));
        let bound = stmt.bind(&params)?;
        assert_eq!(bound, vec![&SqlValue::Int(2), &SqlValue::Int(1)]);
        Ok(())
    }

    #[test]
    fn test_bind_rejects_missing_and_unexpected() -> Result<(), StatementError> {
        let stmt = Statement::compile("t", "SELECT :a")?;

        let missing = stmt.bind(&QueryParams::new()).unwrap_err();
        assert_eq!(missing, StatementError::MissingParameter { name: "a".into() });

        let mut params = QueryParams::new();
        params.insert("a".to_string(), SqlValue::Int(1));
        params.insert("z".to_string(), SqlValue::Int(2));
        let unexpected = stmt.bind(&params).unwrap_err();
        assert_eq!(unexpected, StatementError::UnexpectedParameter { name: "z".into() });
        Ok(())
    }
}
