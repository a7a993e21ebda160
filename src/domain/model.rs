use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage A: raw transactions folded into per-customer totals.
pub const CUSTOMER_POINTS_STAGE: &str = "customer-points";
/// Stage B: customer totals folded into per-tier summaries.
pub const CUSTOMER_GROUP_POINTS_STAGE: &str = "customer-group-points";

/// Accumulated and redeemed points, either for a single record or summed over a fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTuple {
    pub accumulated: i64,
    pub redeemed: i64,
}

impl PointTuple {
    pub fn new(accumulated: i64, redeemed: i64) -> Self {
        Self {
            accumulated,
            redeemed,
        }
    }

    /// Field-wise sum, `None` if either field overflows.
    pub fn checked_add(self, other: PointTuple) -> Option<PointTuple> {
        Some(PointTuple {
            accumulated: self.accumulated.checked_add(other.accumulated)?,
            redeemed: self.redeemed.checked_add(other.redeemed)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTotal {
    pub customer_id: String,
    pub total: PointTuple,
}

/// Upper bound (inclusive) of the lowest tier.
pub const TIER1_MAX_POINTS: i64 = 2_000;
/// Upper bound (inclusive) of the middle tier.
pub const TIER2_MAX_POINTS: i64 = 10_000;

/// Point tier. Boundary values belong to the lower tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Tier1, Tier::Tier2, Tier::Tier3];

    pub fn classify(accumulated: i64) -> Tier {
        if accumulated <= TIER1_MAX_POINTS {
            Tier::Tier1
        } else if accumulated <= TIER2_MAX_POINTS {
            Tier::Tier2
        } else {
            Tier::Tier3
        }
    }

    /// Identifier written to the final output.
    pub fn id(&self) -> &'static str {
        match self {
            Tier::Tier1 => "Gruppe1_Bis2000Punkte",
            Tier::Tier2 => "Gruppe2_2001Bis10000Punkte",
            Tier::Tier3 => "Gruppe3_Ueber10000Punkte",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.id() == s)
            .ok_or_else(|| format!("unknown tier '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub tier: Tier,
    pub customer_count: i64,
    pub total_accumulated: i64,
    pub total_redeemed: i64,
    pub redeemed_percentage: f64,
}

impl GroupSummary {
    /// Text column of the final output, percentage rendered to two decimals.
    pub fn summary_text(&self) -> String {
        format!(
            "AnzahlKunden: {}, SummePunkte: {}, ProzentEingeloest: {:.2}%",
            self.customer_count, self.total_accumulated, self.redeemed_percentage
        )
    }
}

/// Per-stage bookkeeping reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounters {
    pub input_records: usize,
    pub map_output_records: usize,
    pub reduce_input_groups: usize,
    pub reduce_output_records: usize,
}

/// Output of a stage's transform step: tab-separated rows plus counters.
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub rows: Vec<Vec<String>>,
    pub counters: StageCounters,
}
