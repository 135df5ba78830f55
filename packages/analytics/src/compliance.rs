//! Compliance rate and distance statistics.

use geofence_analytics_models::ComplianceStats;
use geofence_validation_models::LocationSample;

use crate::round2;

/// Summarizes `samples`.
///
/// Distances only count samples that have been validated against at least
/// one zone. An empty input yields all zeros.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate<'a, I>(samples: I) -> ComplianceStats
where
    I: IntoIterator<Item = &'a LocationSample>,
{
    let mut stats = ComplianceStats::default();
    let mut distance_sum = 0.0;
    let mut distance_count = 0_usize;

    for sample in samples {
        stats.total_samples += 1;
        if sample.is_within_any_zone {
            stats.compliant_samples += 1;
        }
        if sample.has_violations() {
            stats.violation_samples += 1;
        }
        if let Some(distance) = sample.distance_from_site {
            distance_sum += distance;
            distance_count += 1;
            stats.max_distance = stats.max_distance.max(distance);
        }
    }

    if stats.total_samples > 0 {
        stats.compliance_rate =
            round2(stats.compliant_samples as f64 / stats.total_samples as f64 * 100.0);
    }
    if distance_count > 0 {
        stats.average_distance = round2(distance_sum / distance_count as f64);
    }

    stats
}
