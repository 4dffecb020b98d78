//! Trend, congestion and action inference over a sensor's reading window.
//!
//! Everything here is a pure function of `latest` and `previous`: no state is
//! carried from one cycle to the next.

use serde::Serialize;

use crate::Trend;

/// Minimum number of previous readings needed before a trend is called.
pub const MIN_TREND_HISTORY: usize = 3;

/// Relative band around the median inside which traffic counts as normal.
pub const TREND_BAND: f64 = 0.05;

/// Score (percent) above which a rising trend becomes a congestion warning.
pub const HIGH_CONGESTION_SCORE: f64 = 20.0;

// ---

/// Median of a sequence; the mean of the two middle values for even lengths.
///
/// Returns `None` for an empty sequence.
pub fn median(values: &[f64]) -> Option<f64> {
    // ---
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Classify the latest reading against the median of the previous ones.
///
/// Fewer than [`MIN_TREND_HISTORY`] previous readings always yield
/// [`Trend::Normal`]. Values exactly on the band edge are `Normal` too.
pub fn classify_trend(latest: f64, previous: &[f64]) -> Trend {
    // ---
    if previous.len() < MIN_TREND_HISTORY {
        return Trend::Normal;
    }
    let Some(median_prev) = median(previous) else {
        return Trend::Normal;
    };
    let threshold = median_prev * TREND_BAND;

    if latest > median_prev + threshold {
        Trend::Increasing
    } else if latest < median_prev - threshold {
        Trend::Decreasing
    } else {
        Trend::Normal
    }
}

/// Signed percentage deviation of `latest` from the median of `previous`,
/// rounded to one decimal.
///
/// An empty history or a zero median gives `0.0`.
pub fn congestion_score(latest: f64, previous: &[f64]) -> f64 {
    // ---
    match median(previous) {
        Some(m) if m != 0.0 => round1((latest - m) / m * 100.0),
        _ => 0.0,
    }
}

fn round1(value: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0
    (value * 10.0).round() / 10.0 + 0.0
}

/// Recommendation shown next to a sensor on the advisory panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    HighCongestion,
    RisingTraffic,
    Easing,
    Stable,
}

impl Action {
    pub fn message(self) -> &'static str {
        match self {
            Action::HighCongestion => {
                "High congestion warning: apply active mitigation (ramp metering, rerouting)"
            }
            Action::RisingTraffic => "Rising traffic advisory: monitor the segment closely",
            Action::Easing => "Traffic easing: no action required",
            Action::Stable => "Traffic stable: maintain current configuration",
        }
    }
}

/// Pick the recommendation for a sensor given its already computed trend.
///
/// A rising trend only escalates to [`Action::HighCongestion`] when the
/// rounded score is strictly greater than [`HIGH_CONGESTION_SCORE`].
pub fn suggest_action(latest: f64, previous: &[f64], trend: Trend) -> Action {
    // ---
    match trend {
        Trend::Increasing if congestion_score(latest, previous) > HIGH_CONGESTION_SCORE => {
            Action::HighCongestion
        }
        Trend::Increasing => Action::RisingTraffic,
        Trend::Decreasing => Action::Easing,
        Trend::Normal => Action::Stable,
    }
}
