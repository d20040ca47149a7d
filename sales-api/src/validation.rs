//! Validation Helpers
//!
//! Query-string checks shared by the report handlers. Each failure maps to a
//! specific 422 error code so clients can tell a missing field from a badly
//! formatted one.

use chrono::NaiveDate;
use sales_core::DateRange;

use crate::error::{ApiError, ApiResult, ErrorCode};

/// Calendar date format accepted for `start_date` / `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trait for validating required, non-empty values.
///
/// # Example
/// ```ignore
/// use sales_api::validation::ValidateRequired;
///
/// let start = params.start_date.as_deref().validate_required("start_date")?;
/// ```
pub trait ValidateRequired {
    /// Return the trimmed value, or `MISSING_FIELD` if absent or blank.
    fn validate_required(&self, field_name: &str) -> ApiResult<&str>;
}

impl ValidateRequired for str {
    fn validate_required(&self, field_name: &str) -> ApiResult<&str> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(trimmed)
    }
}

impl ValidateRequired for &str {
    fn validate_required(&self, field_name: &str) -> ApiResult<&str> {
        (**self).validate_required(field_name)
    }
}

impl ValidateRequired for String {
    fn validate_required(&self, field_name: &str) -> ApiResult<&str> {
        self.as_str().validate_required(field_name)
    }
}

impl<T: ValidateRequired> ValidateRequired for Option<T> {
    fn validate_required(&self, field_name: &str) -> ApiResult<&str> {
        match self {
            Some(value) => value.validate_required(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
                    if *self < min || *self > max {
                        return Err(ApiError::invalid_range(field_name, min, max));
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64, usize);

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field_name: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ApiError::invalid_format(field_name, "YYYY-MM-DD"))
}

/// Parse an optional integer query value. Blank counts as absent.
pub fn parse_optional_i64(field_name: &str, value: Option<&str>) -> ApiResult<Option<i64>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::invalid_format(field_name, "an integer")),
        None => Ok(None),
    }
}

/// Validate the required `start_date` / `end_date` pair into a half-open range.
///
/// `start_date == end_date` is an empty range, not an error.
pub fn date_range(start_date: Option<&str>, end_date: Option<&str>) -> ApiResult<DateRange> {
    let start_raw = start_date.validate_required("start_date")?;
    let end_raw = end_date.validate_required("end_date")?;

    let start = parse_date("start_date", start_raw)?;
    let end = parse_date("end_date", end_raw)?;

    DateRange::new(start, end).map_err(|_| {
        ApiError::new(
            ErrorCode::InvalidRange,
            format!("start_date ({}) must not be after end_date ({})", start, end),
        )
        .with_details(serde_json::json!({ "field": "end_date" }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert_eq!("  2025-06-01 ".validate_required("start_date").unwrap(), "2025-06-01");
        assert!("".validate_required("start_date").is_err());
        assert!("   ".validate_required("start_date").is_err());

        let none: Option<String> = None;
        let err = none.validate_required("start_date").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.details, Some(serde_json::json!({ "field": "start_date" })));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date("start_date", "2025-06-15").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
        for bad in ["2025/06/15", "15-06-2025", "2025-13-01", "2025-02-30", "yesterday"] {
            let err = parse_date("start_date", bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidFormat, "{}", bad);
        }
    }

    #[test]
    fn test_date_range_order() {
        assert!(date_range(Some("2025-06-01"), Some("2025-07-01")).is_ok());

        let err = date_range(Some("2025-07-01"), Some("2025-06-01")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRange);
        assert_eq!(err.details, Some(serde_json::json!({ "field": "end_date" })));

        let empty = date_range(Some("2025-06-01"), Some("2025-06-01")).unwrap();
        assert_eq!(empty.start(), empty.end());
    }

    #[test]
    fn test_date_range_missing_checked_before_format() {
        let err = date_range(Some("not-a-date"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
    }

    #[test]
    fn test_validate_range() {
        assert!(1i64.validate_range("limit", 1, 50).is_ok());
        assert!(50i64.validate_range("limit", 1, 50).is_ok());
        assert_eq!(
            0i64.validate_range("limit", 1, 50).unwrap_err().code,
            ErrorCode::InvalidRange
        );
        assert!(51i64.validate_range("limit", 1, 50).is_err());
    }

    #[test]
    fn test_parse_optional_i64() {
        assert_eq!(parse_optional_i64("limit", None).unwrap(), None);
        assert_eq!(parse_optional_i64("limit", Some("")).unwrap(), None);
        assert_eq!(parse_optional_i64("limit", Some("7")).unwrap(), Some(7));
        assert_eq!(
            parse_optional_i64("limit", Some("seven")).unwrap_err().code,
            ErrorCode::InvalidFormat
        );
    }
}
