//! Simulated behavioral events and the structured records built from them.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum reporting lag between a flag evaluation and the recorded time of a
/// batched event, in seconds.
pub const MIN_REPORTING_LAG_SECS: f64 = 5.0 * 60.0;
/// Maximum reporting lag, in seconds.
pub const MAX_REPORTING_LAG_SECS: f64 = 10.0 * 60.0;

/// The fixed vocabulary of behavioral events a journey can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PageView,
    TrialSignup,
    TrialToPaidConversion,
    TotalRevenue,
    AdjustedRevenue,
    BannerClick,
    HeroEngagement,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PageView => "page_view",
            EventKind::TrialSignup => "trial_signup",
            EventKind::TrialToPaidConversion => "trial_to_paid_conversion",
            EventKind::TotalRevenue => "total_revenue",
            EventKind::AdjustedRevenue => "adjusted_revenue",
            EventKind::BannerClick => "banner_click",
            EventKind::HeroEngagement => "hero_engagement",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decided event, ordered within its journey's event list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedEvent {
    pub kind: EventKind,
    /// Metric value; present only for revenue-kind events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// When the engine decided the event.
    pub timestamp: DateTime<Utc>,
}

impl SimulatedEvent {
    pub fn new(kind: EventKind) -> SimulatedEvent {
        SimulatedEvent {
            kind,
            value: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_value(kind: EventKind, value: f64) -> SimulatedEvent {
        SimulatedEvent {
            kind,
            value: Some(value),
            timestamp: Utc::now(),
        }
    }
}

/// A structured metric record for batch insertion into a tabular store.
///
/// `received_time` models realistic reporting lag: it is the causing flag
/// evaluation's time plus a uniform 5-10 minute offset, so the recorded time
/// is always strictly after the evaluation it depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Unique id of this record.
    pub event_id: Uuid,
    pub event_key: EventKind,
    /// Kind of the context the event is attributed to; always "user" here.
    pub context_kind: String,
    pub context_key: String,
    /// Metric value; null for conversion-style events.
    pub event_value: Option<f64>,
    pub received_time: DateTime<Utc>,
}

impl MetricRecord {
    /// Builds the record for one decided event, drawing the reporting lag
    /// from [`MIN_REPORTING_LAG_SECS`]..=[`MAX_REPORTING_LAG_SECS`].
    pub fn from_event(
        event: &SimulatedEvent,
        context_key: &str,
        flag_eval_time: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> MetricRecord {
        let lag_secs = rng.gen_range(MIN_REPORTING_LAG_SECS..=MAX_REPORTING_LAG_SECS);
        MetricRecord {
            event_id: Uuid::new_v4(),
            event_key: event.kind,
            context_kind: "user".to_owned(),
            context_key: context_key.to_owned(),
            event_value: event.value,
            received_time: flag_eval_time + Duration::milliseconds((lag_secs * 1000.0) as i64),
        }
    }
}
