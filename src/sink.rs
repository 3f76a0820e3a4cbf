//! Event sinks: where decided events go.
//!
//! The engine is agnostic to the sink. [`TrackingSink`] models an immediate
//! SDK tracking call; [`WarehouseSink`] builds causally-delayed structured
//! records and hands them to a [`MetricStore`] for batch insertion.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::events::{MetricRecord, SimulatedEvent};
use crate::Result;

/// A capability-abstracted sink for decided events.
///
/// Events of one journey must be delivered in decision order. Delivery is
/// best-effort: the sink does not retry, and a per-event error affects only
/// that event.
pub trait EventSink {
    /// Delivers one event for the given user. `flag_eval_time` is the
    /// evaluation instant the event is causally attributed to.
    fn track(
        &mut self,
        event: &SimulatedEvent,
        user_key: &str,
        flag_eval_time: DateTime<Utc>,
    ) -> Result<()>;

    /// Forces delivery of anything buffered.
    fn flush(&mut self) -> Result<()>;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn track(
        &mut self,
        event: &SimulatedEvent,
        user_key: &str,
        flag_eval_time: DateTime<Utc>,
    ) -> Result<()> {
        (**self).track(event, user_key, flag_eval_time)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Direct tracking sink: events are delivered immediately; delivery is
/// simulated through structured log output.
#[derive(Debug, Default)]
pub struct TrackingSink {
    pending: usize,
    delivered: u64,
}

impl TrackingSink {
    pub fn new() -> TrackingSink {
        TrackingSink::default()
    }

    /// Total events delivered over the sink's lifetime.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl EventSink for TrackingSink {
    fn track(
        &mut self,
        event: &SimulatedEvent,
        user_key: &str,
        _flag_eval_time: DateTime<Utc>,
    ) -> Result<()> {
        log::debug!(target: "flagsim",
                    event_key = event.kind.as_str(),
                    user_key,
                    value:serde = event.value;
                    "tracking event");
        self.pending += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending > 0 {
            log::trace!(target: "flagsim", count = self.pending; "flushed tracked events");
            self.delivered += self.pending as u64;
            self.pending = 0;
        }
        Ok(())
    }
}

/// Insert boundary of the external tabular store.
///
/// An insert is atomic per record: on failure nothing of that record is
/// persisted and the error propagates to the caller, which logs and continues
/// with the next record.
pub trait MetricStore {
    fn insert(&mut self, record: &MetricRecord) -> Result<()>;
}

/// Appends metric records to a local file, one JSON object per line.
///
/// Each record is serialized fully and written with a single call followed by
/// a flush, so the file stays parseable line-by-line if the process is
/// interrupted mid-run.
#[derive(Debug)]
pub struct JsonlMetricStore {
    file: File,
    path: PathBuf,
}

impl JsonlMetricStore {
    /// Opens (creating if needed) the record file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<JsonlMetricStore> {
        let path = path.as_ref().to_owned();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(JsonlMetricStore { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricStore for JsonlMetricStore {
    fn insert(&mut self, record: &MetricRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

/// Batched structured sink: builds a [`MetricRecord`] per event, with the
/// 5-10 minute reporting lag after the flag evaluation, and inserts it into
/// the store.
pub struct WarehouseSink<S> {
    store: S,
    rng: StdRng,
}

impl<S: MetricStore> WarehouseSink<S> {
    pub fn new(store: S) -> WarehouseSink<S> {
        WarehouseSink {
            store,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the lag RNG, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> WarehouseSink<S> {
        self.rng = rng;
        self
    }
}

impl<S: MetricStore> EventSink for WarehouseSink<S> {
    fn track(
        &mut self,
        event: &SimulatedEvent,
        user_key: &str,
        flag_eval_time: DateTime<Utc>,
    ) -> Result<()> {
        let record = MetricRecord::from_event(event, user_key, flag_eval_time, &mut self.rng);
        self.store.insert(&record)?;
        log::debug!(target: "flagsim",
                    event_key = event.kind.as_str(),
                    user_key;
                    "inserted metric record");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Records are flushed per insert to keep the file append-safe.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::events::EventKind;

    use super::*;

    #[test]
    fn tracking_sink_counts_flushed_events() {
        let mut sink = TrackingSink::new();
        let eval_time = Utc::now();
        sink.track(&SimulatedEvent::new(EventKind::PageView), "u1", eval_time)
            .unwrap();
        sink.track(&SimulatedEvent::new(EventKind::TrialSignup), "u1", eval_time)
            .unwrap();
        assert_eq!(sink.delivered(), 0);
        sink.flush().unwrap();
        assert_eq!(sink.delivered(), 2);
    }

    #[test]
    fn jsonl_store_appends_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut store = JsonlMetricStore::open(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let eval_time = Utc::now();

        for kind in [EventKind::PageView, EventKind::TrialSignup] {
            let event = SimulatedEvent::new(kind);
            let record = MetricRecord::from_event(&event, "u1", eval_time, &mut rng);
            store.insert(&record).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let records: Vec<MetricRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_key, EventKind::PageView);
        assert_eq!(records[0].context_kind, "user");
    }

    #[test]
    fn warehouse_sink_builds_delayed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let store = JsonlMetricStore::open(&path).unwrap();
        let mut sink = WarehouseSink::new(store).with_rng(StdRng::seed_from_u64(7));

        let eval_time = Utc::now();
        sink.track(
            &SimulatedEvent::with_value(EventKind::TotalRevenue, 41.2),
            "u1",
            eval_time,
        )
        .unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let record: MetricRecord = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(record.event_value, Some(41.2));
        assert!(record.received_time > eval_time);
    }
}
