use crate::domain::model::{CustomerTotal, PointTuple, CUSTOMER_POINTS_STAGE};
use crate::domain::ports::{OutputRecord, Reducer};
use crate::utils::error::{EtlError, Result};

/// Stage A reducer: sums every tuple mapped to one customer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerAggregator;

impl Reducer for CustomerAggregator {
    type Key = String;
    type Value = PointTuple;
    type Output = CustomerTotal;

    fn reduce<I>(&self, key: &String, values: I) -> Result<CustomerTotal>
    where
        I: IntoIterator<Item = PointTuple>,
    {
        let total = values
            .into_iter()
            .try_fold(PointTuple::default(), PointTuple::checked_add)
            .ok_or_else(|| EtlError::OverflowError {
                stage: CUSTOMER_POINTS_STAGE.to_string(),
                key: key.clone(),
            })?;

        Ok(CustomerTotal {
            customer_id: key.clone(),
            total,
        })
    }
}

impl OutputRecord for CustomerTotal {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.customer_id.clone(),
            self.total.accumulated.to_string(),
            self.total.redeemed.to_string(),
        ]
    }
}
