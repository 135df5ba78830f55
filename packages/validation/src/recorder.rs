//! Append-only violation history and the violation event.
//!
//! [`record`] appends one [`ViolationBatch`] to a sample and hands a
//! [`GeofenceViolationDetected`] to a [`ViolationEventSink`]. Earlier
//! batches are never touched. Persisting the sample is the caller's job;
//! callers that persist first use [`append_batch`] and then [`announce`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use geofence_validation_models::{
    GeofenceViolationDetected, LocationSample, Violation, ViolationBatch,
};
use tokio::sync::mpsc;

/// Receives violation events.
///
/// Publishing is fire-and-forget: implementations must not block and have
/// no way to fail the validation that produced the event.
pub trait ViolationEventSink: Send + Sync {
    /// Delivers one event.
    fn publish(&self, event: GeofenceViolationDetected);
}

/// Drops every event.
pub struct NullSink;

impl ViolationEventSink for NullSink {
    fn publish(&self, _event: GeofenceViolationDetected) {}
}

/// Returns a shared [`NullSink`].
#[must_use]
pub fn null_sink() -> Arc<dyn ViolationEventSink> {
    Arc::new(NullSink)
}

/// Forwards events over an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GeofenceViolationDetected>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GeofenceViolationDetected>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ViolationEventSink for ChannelSink {
    fn publish(&self, event: GeofenceViolationDetected) {
        let sample_id = event.sample.id;
        if self.tx.send(event).is_err() {
            log::warn!("Violation event for sample {sample_id} dropped: receiver closed");
        }
    }
}

/// Keeps every event in memory. Used by tests to observe published events.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<GeofenceViolationDetected>>,
}

impl CollectingSink {
    /// Everything published so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<GeofenceViolationDetected> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ViolationEventSink for CollectingSink {
    fn publish(&self, event: GeofenceViolationDetected) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Records `violations` against `sample`, timestamped now.
///
/// Returns `false` without touching the sample when `violations` is
/// empty.
pub fn record(
    sample: &mut LocationSample,
    violations: Vec<Violation>,
    sink: &dyn ViolationEventSink,
) -> bool {
    record_at(sample, violations, Utc::now(), sink)
}

/// Records `violations` against `sample` with an explicit batch timestamp.
pub fn record_at(
    sample: &mut LocationSample,
    violations: Vec<Violation>,
    timestamp: DateTime<Utc>,
    sink: &dyn ViolationEventSink,
) -> bool {
    if !append_batch(sample, &violations, timestamp) {
        return false;
    }
    announce(sample, violations, sink);
    true
}

/// Appends `violations` to `sample` as one batch without logging or
/// publishing anything.
///
/// Pair with [`announce`] once the sample has been persisted. Returns
/// `false` without touching the sample when `violations` is empty.
pub fn append_batch(
    sample: &mut LocationSample,
    violations: &[Violation],
    timestamp: DateTime<Utc>,
) -> bool {
    if violations.is_empty() {
        return false;
    }

    sample.violations.push(ViolationBatch {
        timestamp,
        violations: violations.to_vec(),
        coordinates: sample.coordinates,
    });
    true
}

/// Logs a recorded violation batch and publishes its event.
pub fn announce(
    sample: &LocationSample,
    violations: Vec<Violation>,
    sink: &dyn ViolationEventSink,
) {
    if violations.is_empty() {
        return;
    }

    let zone_ids: Vec<i64> = violations.iter().map(|v| v.zone_id).collect();
    log::warn!(
        "Geofence violation for sample {} at {} (employee {:?}, project {:?}, zones {zone_ids:?}): {}",
        sample.id,
        sample.coordinates,
        sample.employee_id,
        sample.project_id,
        serde_json::to_string(&violations).unwrap_or_default()
    );

    sink.publish(GeofenceViolationDetected {
        sample: sample.clone(),
        violations,
    });
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use geofence_spatial_models::Coordinate;
    use geofence_validation_models::ViolationSeverity;

    use super::*;

    fn sample() -> LocationSample {
        LocationSample {
            id: 42,
            coordinates: Coordinate::new(24.7136, 46.6753),
            project_id: Some(7),
            employee_id: Some(3),
            recorded_at: Utc::now(),
            is_within_any_zone: false,
            distance_from_site: None,
            violations: Vec::new(),
            version: 0,
        }
    }

    fn violation(zone_id: i64) -> Violation {
        Violation {
            zone_id,
            zone_name: format!("zone-{zone_id}"),
            distance: 130.0,
            severity: ViolationSeverity::Warning,
            message: "Location is 30.00 meters beyond the 100m radius".to_string(),
        }
    }

    #[test]
    fn empty_violations_are_a_no_op() {
        let sink = CollectingSink::default();
        let mut sample = sample();

        assert!(!record(&mut sample, Vec::new(), &sink));
        assert!(sample.violations.is_empty());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn appends_keep_earlier_batches_in_order() {
        let sink = CollectingSink::default();
        let mut sample = sample();
        let first = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();

        assert!(record_at(&mut sample, vec![violation(1)], first, &sink));
        let snapshot = sample.violations[0].clone();

        sample.coordinates = Coordinate::new(24.72, 46.68);
        assert!(record_at(
            &mut sample,
            vec![violation(2), violation(3)],
            second,
            &sink
        ));

        assert_eq!(sample.violations.len(), 2);
        assert_eq!(sample.violations[0], snapshot);
        assert_eq!(sample.violations[1].timestamp, second);
        assert_eq!(sample.violations[1].violations.len(), 2);
        assert_eq!(
            sample.violations[1].coordinates,
            Coordinate::new(24.72, 46.68)
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].violations.len(), 2);
        assert_eq!(events[1].sample.violations.len(), 2);
    }

    #[test]
    fn append_batch_is_silent_until_announced() {
        let sink = CollectingSink::default();
        let mut sample = sample();
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();

        assert!(append_batch(&mut sample, &[violation(1)], at));
        assert_eq!(sample.violations.len(), 1);
        assert!(sink.events().is_empty());

        sample.version = 5;
        announce(&sample, vec![violation(1)], &sink);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sample.version, 5);

        assert!(!append_batch(&mut sample, &[], at));
        announce(&sample, Vec::new(), &sink);
        assert_eq!(sample.violations.len(), 1);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelSink::new();
        let mut sample = sample();

        assert!(record(&mut sample, vec![violation(1)], &sink));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.sample.id, 42);
        assert_eq!(event.violations[0].zone_id, 1);
    }

    #[test]
    fn closed_channel_does_not_fail_recording() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let mut sample = sample();

        assert!(record(&mut sample, vec![violation(1)], &sink));
        assert_eq!(sample.violations.len(), 1);
    }

    #[test]
    fn null_sink_accepts_anything() {
        let sink = null_sink();
        let mut sample = sample();
        assert!(record(&mut sample, vec![violation(1)], sink.as_ref()));
    }
}
