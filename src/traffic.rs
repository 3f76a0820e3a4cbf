//! Time-of-day traffic shaping for continuous runs.
//!
//! Continuous mode replays a plausible daily traffic curve: morning and
//! evening peaks, quiet overnight hours, slightly lower weekends. The numbers
//! only throttle how fast journeys start; they carry no correctness
//! semantics.

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};
use rand::Rng;
use std::time::Duration;

/// Peak journeys per second that the multiplier scales.
const BASE_RECORDS_PER_SECOND: f64 = 0.1;

/// Base multiplier for an hour of day.
fn base_multiplier(hour: u32) -> f64 {
    match hour {
        6..=9 => 0.8,   // morning peak
        17..=21 => 1.0, // evening peak
        0..=5 => 0.1,   // overnight
        _ => 0.5,       // daytime
    }
}

fn day_multiplier(weekday: Weekday) -> f64 {
    match weekday {
        Weekday::Sat | Weekday::Sun => 0.7,
        _ => 1.0,
    }
}

/// Traffic multiplier for the given instant: hour band, ±20% uniform
/// variation, weekend damping, clamped to [0.05, 1.0].
pub fn traffic_multiplier(now: DateTime<Local>, rng: &mut impl Rng) -> f64 {
    let base = base_multiplier(now.hour());
    let variation = rng.gen_range(0.8..=1.2);
    (base * variation * day_multiplier(now.weekday())).clamp(0.05, 1.0)
}

/// One continuous-mode batch: how many journeys to run and how fast.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlan {
    pub multiplier: f64,
    pub records: usize,
    /// Delay between journeys that realizes the planned rate.
    pub pace: Duration,
}

/// Plans the next batch from the current traffic pattern: a 5-15 minute
/// window at the multiplier-scaled rate, at least one journey.
pub fn plan_batch(now: DateTime<Local>, rng: &mut impl Rng) -> BatchPlan {
    let multiplier = traffic_multiplier(now, rng);
    let records_per_second = (BASE_RECORDS_PER_SECOND * multiplier).clamp(0.01, 1.0);
    let duration_secs = rng.gen_range(5.0 * 60.0..=15.0 * 60.0);
    let records = ((duration_secs * records_per_second) as usize).max(1);

    BatchPlan {
        multiplier,
        records,
        pace: Duration::from_secs_f64(1.0 / records_per_second),
    }
}
