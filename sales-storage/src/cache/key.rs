//! Cache key derivation.

use sales_core::{QueryParams, SqlValue};

/// Identity of a cached result: statement text plus name-sorted parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    sql: String,
    params: Vec<(String, SqlValue)>,
}

impl CacheKey {
    pub fn new(sql: &str, params: &QueryParams) -> Self {
        let mut params: Vec<(String, SqlValue)> = params
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            sql: sql.to_string(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, SqlValue)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, SqlValue)]) -> QueryParams {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_params_are_sorted_by_name() {
        let key = CacheKey::new(
            "SELECT 1",
            &params(&[("region", SqlValue::from("EU")), ("end", SqlValue::Int(2)), ("start", SqlValue::Int(1))]),
        );
        let names: Vec<&str> = key.params().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["end", "region", "start"]);
    }

    #[test]
    fn test_value_and_sql_participate() {
        let base = params(&[("region", SqlValue::from("EU"))]);
        let other = params(&[("region", SqlValue::from("US"))]);
        assert_ne!(CacheKey::new("q", &base), CacheKey::new("q", &other));
        assert_ne!(CacheKey::new("q1", &base), CacheKey::new("q2", &base));
        assert_eq!(CacheKey::new("q", &base), CacheKey::new("q", &base.clone()));
    }

    #[test]
    fn test_empty_filter_differs_from_null() {
        let empty = params(&[("sku", SqlValue::from(""))]);
        let null = params(&[("sku", SqlValue::Null)]);
        assert_ne!(CacheKey::new("q", &empty), CacheKey::new("q", &null));
    }
}
