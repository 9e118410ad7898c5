/// Precipitation threshold evaluation.
///
/// An alert fires only when the total is strictly above the threshold.
/// When it does, the snooze tier is picked high band first, then medium.
/// With the default bands the high minimum and the medium maximum are both
/// 1.0 in, so the order is what sends a total of exactly 1.0 to the high
/// band. Totals that alert but fall in neither band get no snooze.

use serde::Serialize;

use crate::model::{SnoozeTier, TierTable};

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub alert: bool,
    /// Matched band, only ever set when `alert` is true.
    pub tier: Option<SnoozeTier>,
}

pub fn evaluate(total_inches: f64, threshold_inches: f64, tiers: &TierTable) -> Evaluation {
    if total_inches.is_nan() || total_inches <= threshold_inches {
        return Evaluation {
            alert: false,
            tier: None,
        };
    }

    let tier = if tiers.high.contains(total_inches) {
        Some(tiers.high)
    } else if tiers.medium.contains(total_inches) {
        Some(tiers.medium)
    } else {
        None
    };

    Evaluation { alert: true, tier }
}
