use crate::domain::model::{PointTuple, Tier, CUSTOMER_GROUP_POINTS_STAGE};
use crate::domain::ports::Mapper;
use crate::utils::error::{EtlError, Result};

const MIN_FIELDS: usize = 3;

/// Stage B mapper: re-keys a `customerId accumulated redeemed` line by its tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierClassifier;

impl Mapper for TierClassifier {
    type Key = Tier;
    type Value = PointTuple;

    fn map(&self, line_no: usize, line: &str) -> Result<Option<(Tier, PointTuple)>> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Ok(None);
        }

        let accumulated = parse_points(line_no, "accumulated", fields[1])?;
        let redeemed = parse_points(line_no, "redeemed", fields[2])?;

        Ok(Some((
            Tier::classify(accumulated),
            PointTuple::new(accumulated, redeemed),
        )))
    }
}

fn parse_points(line_no: usize, field: &str, raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| EtlError::MalformedFieldError {
        stage: CUSTOMER_GROUP_POINTS_STAGE.to_string(),
        line: line_no,
        field: field.to_string(),
        value: raw.to_string(),
    })
}
