use crate::domain::model::{GroupSummary, PointTuple, Tier, CUSTOMER_GROUP_POINTS_STAGE};
use crate::domain::ports::{OutputRecord, Reducer};
use crate::utils::error::{EtlError, Result};

/// Stage B reducer: member count, point sums and redemption rate of one tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierAggregator;

impl Reducer for TierAggregator {
    type Key = Tier;
    type Value = PointTuple;
    type Output = GroupSummary;

    fn reduce<I>(&self, key: &Tier, values: I) -> Result<GroupSummary>
    where
        I: IntoIterator<Item = PointTuple>,
    {
        let overflow = || EtlError::OverflowError {
            stage: CUSTOMER_GROUP_POINTS_STAGE.to_string(),
            key: key.to_string(),
        };

        let mut customer_count: i64 = 0;
        let mut totals = PointTuple::default();
        for value in values {
            customer_count = customer_count.checked_add(1).ok_or_else(overflow)?;
            totals = totals.checked_add(value).ok_or_else(overflow)?;
        }

        Ok(GroupSummary {
            tier: *key,
            customer_count,
            total_accumulated: totals.accumulated,
            total_redeemed: totals.redeemed,
            redeemed_percentage: redeemed_percentage(totals),
        })
    }
}

/// `100 * redeemed / accumulated`, or `0.0` when nothing was accumulated.
pub fn redeemed_percentage(totals: PointTuple) -> f64 {
    if totals.accumulated > 0 {
        100.0 * totals.redeemed as f64 / totals.accumulated as f64
    } else {
        0.0
    }
}

impl OutputRecord for GroupSummary {
    fn to_row(&self) -> Vec<String> {
        vec![self.tier.id().to_string(), self.summary_text()]
    }
}
