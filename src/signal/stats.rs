//! Hit and false-signal summary over the link records.

use crate::domain::{LinkRecord, SignalStats};

/// Count hits and misses; the hit rate is undefined (`None`) with no records.
pub fn summarize(links: &[LinkRecord]) -> SignalStats {
    let total = links.len();
    let true_signals = links.iter().filter(|l| l.found_recession).count();
    let hit_rate = (total > 0).then(|| true_signals as f64 / total as f64);

    SignalStats {
        total,
        true_signals,
        false_signals: total - true_signals,
        hit_rate,
    }
}
