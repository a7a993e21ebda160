use crate::domain::model::{PointTuple, CUSTOMER_POINTS_STAGE};
use crate::domain::ports::Mapper;
use crate::utils::error::{EtlError, Result};

pub const DEFAULT_HEADER_TOKEN: &str = "Customer";

const CUSTOMER_ID_COLUMN: usize = 0;
const ACCUMULATED_COLUMN: usize = 7;
const REDEEMED_COLUMN: usize = 8;
const MIN_FIELDS: usize = REDEEMED_COLUMN + 1;

/// Stage A mapper: one comma-separated transaction line to `(customerId, points)`.
#[derive(Debug, Clone)]
pub struct RecordParser {
    header_token: String,
}

impl RecordParser {
    pub fn new(header_token: impl Into<String>) -> Self {
        Self {
            header_token: header_token.into(),
        }
    }

    pub fn is_header(&self, line: &str) -> bool {
        line.contains(&self.header_token)
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_TOKEN)
    }
}

impl Mapper for RecordParser {
    type Key = String;
    type Value = PointTuple;

    fn map(&self, line_no: usize, line: &str) -> Result<Option<(String, PointTuple)>> {
        if self.is_header(line) {
            return Ok(None);
        }

        let fields = split_fields(line);
        if fields.len() < MIN_FIELDS {
            return Ok(None);
        }

        let customer_id = fields[CUSTOMER_ID_COLUMN].trim();
        if customer_id.is_empty() {
            return Ok(None);
        }

        let accumulated = round_points(line_no, "accumulated", fields[ACCUMULATED_COLUMN])?;
        let redeemed = round_points(line_no, "redeemed", fields[REDEEMED_COLUMN])?;

        Ok(Some((
            customer_id.to_string(),
            PointTuple::new(accumulated, redeemed),
        )))
    }
}

/// Splits on commas; trailing empty columns do not count as fields.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }
    fields
}

/// Parses a decimal point value and rounds half away from zero.
pub fn round_points(line_no: usize, field: &str, raw: &str) -> Result<i64> {
    let malformed = || EtlError::MalformedFieldError {
        stage: CUSTOMER_POINTS_STAGE.to_string(),
        line: line_no,
        field: field.to_string(),
        value: raw.to_string(),
    };

    let value: f64 = raw.trim().parse().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }

    let rounded = value.round();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(malformed());
    }
    Ok(rounded as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<(String, PointTuple)>> {
        RecordParser::default().map(1, line)
    }

    #[test]
    fn test_well_formed_record_is_rounded() {
        let (key, points) = parse("C1,a,b,c,d,e,f,100.4,20.6").unwrap().unwrap();
        assert_eq!(key, "C1");
        assert_eq!(points, PointTuple::new(100, 21));
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_points(1, "accumulated", "0.5").unwrap(), 1);
        assert_eq!(round_points(1, "accumulated", "-0.5").unwrap(), -1);
        assert_eq!(round_points(1, "accumulated", "2.5").unwrap(), 3);
        assert_eq!(round_points(1, "accumulated", " 100.4 ").unwrap(), 100);
        assert_eq!(round_points(1, "accumulated", "-20.6").unwrap(), -21);
    }

    #[test]
    fn test_header_row_is_skipped() {
        let header = "CustomerID,Name,Street,Zip,City,Country,Date,Accumulated,Redeemed";
        assert!(parse(header).unwrap().is_none());
    }

    #[test]
    fn test_custom_header_token() {
        let parser = RecordParser::new("Kunde");
        assert!(parser
            .map(1, "Kunde,a,b,c,d,e,f,Punkte,Eingeloest")
            .unwrap()
            .is_none());
        assert!(parser.map(2, "K7,a,b,c,d,e,f,1,1").unwrap().is_some());
    }

    #[test]
    fn test_short_rows_are_dropped() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("C1,a,b,c,d,e,f,100.4").unwrap().is_none());
        assert!(parse("C1,a,b,c,d,e,f,100.4,").unwrap().is_none());
        assert!(parse("C1,a,b,c,d,e,f,,").unwrap().is_none());
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let (_, points) = parse("C2,a,b,c,d,e,f,7,3,extra,more").unwrap().unwrap();
        assert_eq!(points, PointTuple::new(7, 3));
    }

    #[test]
    fn test_empty_inner_field_is_fatal() {
        let err = parse("C1,a,b,c,d,e,f,,5").unwrap_err();
        assert!(matches!(
            err,
            EtlError::MalformedFieldError { ref field, .. } if field == "accumulated"
        ));
    }

    #[test]
    fn test_non_numeric_field_is_fatal() {
        let err = RecordParser::default()
            .map(42, "C1,a,b,c,d,e,f,100,abc")
            .unwrap_err();
        match err {
            EtlError::MalformedFieldError {
                stage,
                line,
                field,
                value,
            } => {
                assert_eq!(stage, CUSTOMER_POINTS_STAGE);
                assert_eq!(line, 42);
                assert_eq!(field, "redeemed");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_values_are_fatal() {
        assert!(parse("C1,a,b,c,d,e,f,NaN,1").is_err());
        assert!(parse("C1,a,b,c,d,e,f,1,inf").is_err());
        assert!(parse("C1,a,b,c,d,e,f,1e300,1").is_err());
    }

    #[test]
    fn test_missing_customer_id_is_dropped() {
        assert!(parse(",a,b,c,d,e,f,1,1").unwrap().is_none());
        assert!(parse(" ,a,b,c,d,e,f,1,1").unwrap().is_none());
        assert!(parse("\t,a,b,c,d,e,f,1,1").unwrap().is_none());
    }

    #[test]
    fn test_customer_id_is_trimmed() {
        let (key, points) = parse("  C1 ,a,b,c,d,e,f,1,1").unwrap().unwrap();
        assert_eq!(key, "C1");
        assert_eq!(points, PointTuple::new(1, 1));
    }
}
