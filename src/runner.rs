//! The journey loop: sequential batches with cooperative cancellation.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use rand::rngs::StdRng;
use rand::Rng;

use crate::assignment_log::{AssignmentLogger, JourneyAssignment};
use crate::engine::Engine;
use crate::evaluator::FlagEvaluator;
use crate::events::EventKind;
use crate::sink::EventSink;
use crate::traffic;
use crate::user::UserProfile;
use crate::variant::Variant;
use crate::Result;

/// Cooperative stop signal, checked between journeys only: a stop request
/// never abandons an in-flight journey.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    /// Requests a stop. Idempotent and callable from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancels `token` when the process receives an interrupt signal.
///
/// The listener runs on its own named thread with a current-thread runtime,
/// so the simulation loop itself stays synchronous.
pub fn spawn_interrupt_listener(
    token: CancellationToken,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("flagsim-signals".to_owned())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    log::warn!(target: "flagsim", err:display; "cannot start signal listener");
                    return;
                }
            };
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    log::info!(target: "flagsim", "interrupt received, stopping after the current journey");
                    token.cancel();
                }
                Err(err) => {
                    log::warn!(target: "flagsim", err:display; "signal listener failed");
                }
            }
        })
}

/// Aggregated results of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_users: u64,
    /// Per-event-kind emission counts.
    pub events: HashMap<EventKind, u64>,
    /// Per-flag counts of the evaluated values' textual form.
    pub flag_evaluations: HashMap<String, HashMap<String, u64>>,
    /// Per-variant journey counts.
    pub variants: HashMap<Variant, u64>,
    /// Events that failed to reach the sink.
    pub sink_errors: u64,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.total_users += other.total_users;
        self.sink_errors += other.sink_errors;
        for (kind, count) in other.events {
            *self.events.entry(kind).or_default() += count;
        }
        for (variant, count) in other.variants {
            *self.variants.entry(variant).or_default() += count;
        }
        for (flag, values) in other.flag_evaluations {
            let entry = self.flag_evaluations.entry(flag).or_default();
            for (value, count) in values {
                *entry.entry(value).or_default() += count;
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total users: {}", self.total_users)?;

        let mut events: Vec<_> = self.events.iter().collect();
        events.sort_by_key(|(kind, _)| kind.as_str());
        writeln!(f, "Events:")?;
        for (kind, count) in events {
            writeln!(f, "  {kind}: {count}")?;
        }

        let mut flags: Vec<_> = self.flag_evaluations.iter().collect();
        flags.sort_by(|a, b| a.0.cmp(b.0));
        writeln!(f, "Flag evaluations:")?;
        for (flag, values) in flags {
            let mut values: Vec<_> = values.iter().collect();
            values.sort_by(|a, b| a.0.cmp(b.0));
            for (value, count) in values {
                writeln!(f, "  {flag} = {value:?}: {count}")?;
            }
        }

        if self.sink_errors > 0 {
            writeln!(f, "Sink errors: {}", self.sink_errors)?;
        }
        Ok(())
    }
}

/// Drives journeys through the evaluate -> classify -> decide -> emit
/// pipeline.
///
/// Journeys are processed one at a time; nothing is shared between them, so a
/// caller may run several runners in parallel as long as each has its own
/// sink or the sink tolerates concurrent writers.
pub struct Runner<'a> {
    engine: Engine,
    evaluator: Box<dyn FlagEvaluator + 'a>,
    sink: Box<dyn EventSink + 'a>,
    assignment_log: Box<dyn AssignmentLogger + 'a>,
}

impl<'a> Runner<'a> {
    pub fn new(
        engine: Engine,
        evaluator: impl FlagEvaluator + 'a,
        sink: impl EventSink + 'a,
        assignment_log: impl AssignmentLogger + 'a,
    ) -> Runner<'a> {
        Runner {
            engine,
            evaluator: Box::new(evaluator),
            sink: Box::new(sink),
            assignment_log: Box::new(assignment_log),
        }
    }

    /// Runs up to `records` journeys, pausing `pace` between them. Checks the
    /// token between journeys; an in-flight journey always completes and its
    /// events are flushed before returning.
    pub fn run_batch(
        &mut self,
        records: usize,
        pace: Duration,
        token: &CancellationToken,
        rng: &mut StdRng,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for i in 0..records {
            if token.is_cancelled() {
                log::info!(target: "flagsim",
                           completed = i, planned = records;
                           "batch interrupted");
                break;
            }

            self.run_journey(rng, &mut summary);

            if (i + 1) % 10 == 0 || i + 1 == records {
                log::info!(target: "flagsim",
                           processed = i + 1, planned = records;
                           "processed journeys");
            }
            if !pace.is_zero() && i + 1 < records {
                sleep_checking(token, pace);
            }
        }

        self.flush(&mut summary);
        Ok(summary)
    }

    /// Continuous mode: plans batch after batch from the time-of-day traffic
    /// pattern until the token is cancelled.
    pub fn run_continuous(
        &mut self,
        token: &CancellationToken,
        rng: &mut StdRng,
    ) -> Result<RunSummary> {
        let mut total = RunSummary::default();
        let mut iteration = 0u64;

        while !token.is_cancelled() {
            iteration += 1;
            let plan = traffic::plan_batch(Local::now(), rng);
            log::info!(target: "flagsim",
                       iteration,
                       multiplier = plan.multiplier,
                       records = plan.records;
                       "starting batch");

            let summary = self.run_batch(plan.records, plan.pace, token, rng)?;
            total.merge(summary);

            if token.is_cancelled() {
                break;
            }
            let pause = Duration::from_secs_f64(rng.gen_range(30.0..=90.0));
            log::info!(target: "flagsim",
                       pause_secs = pause.as_secs();
                       "pausing before next batch");
            sleep_checking(token, pause);
        }

        Ok(total)
    }

    fn run_journey(&mut self, rng: &mut StdRng, summary: &mut RunSummary) {
        let user = UserProfile::generate(rng);
        let flags = self.evaluator.evaluate_journey_flags(&user);

        let assignment = JourneyAssignment {
            timestamp: Utc::now(),
            user_key: &user.key,
            trial_days_detail: &flags.trial_days,
            hero_banner_detail: &flags.hero_banner,
            seasonal_banner: &flags.seasonal_banner,
        };
        if let Err(err) = self.assignment_log.log_assignment(&assignment) {
            log::warn!(target: "flagsim",
                       user_key:display = user.key, err:display;
                       "failed to log assignment");
        }

        let variant = Variant::from_flag(&flags.hero_banner.value);
        let outcome = self.engine.decide(&user, &flags, variant, rng);

        // Emission order is the decision order; a failed record is logged and
        // the journey continues with the next one.
        for event in &outcome.events {
            if let Err(err) = self.sink.track(event, &user.key, flags.evaluated_at) {
                log::error!(target: "flagsim",
                            event_key = event.kind.as_str(),
                            user_key:display = user.key,
                            err:display;
                            "failed to deliver event");
                summary.sink_errors += 1;
            }
        }

        summary.total_users += 1;
        *summary.variants.entry(outcome.variant).or_default() += 1;
        for event in &outcome.events {
            *summary.events.entry(event.kind).or_default() += 1;
        }
        for (flag, value) in &outcome.flag_values {
            *summary
                .flag_evaluations
                .entry((*flag).to_owned())
                .or_default()
                .entry(value.display_text().into_owned())
                .or_default() += 1;
        }
    }

    fn flush(&mut self, summary: &mut RunSummary) {
        if let Err(err) = self.sink.flush() {
            log::error!(target: "flagsim", err:display; "failed to flush sink");
            summary.sink_errors += 1;
        }
    }
}

/// Sleeps in short slices so a cancellation cuts the wait short.
fn sleep_checking(token: &CancellationToken, duration: Duration) {
    let slice = Duration::from_millis(100);
    let mut remaining = duration;
    while !remaining.is_zero() && !token.is_cancelled() {
        let step = remaining.min(slice);
        std::thread::sleep(step);
        remaining -= step;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rand::SeedableRng;

    use crate::assignment_log::NoopAssignmentLogger;
    use crate::evaluator::SplitEvaluator;
    use crate::events::SimulatedEvent;
    use crate::sink::TrackingSink;
    use crate::{Error, EventSink};

    use super::*;

    struct FailingSink;

    impl EventSink for FailingSink {
        fn track(
            &mut self,
            _event: &SimulatedEvent,
            _user_key: &str,
            _flag_eval_time: DateTime<Utc>,
        ) -> Result<()> {
            Err(Error::Configuration("sink unavailable".to_owned()))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn test_runner<'a>(sink: impl EventSink + 'a) -> Runner<'a> {
        Runner::new(
            Engine::default(),
            SplitEvaluator::with_default_experiments().with_rng(StdRng::seed_from_u64(2)),
            sink,
            NoopAssignmentLogger,
        )
    }

    #[test]
    fn batch_processes_requested_journeys() {
        let mut runner = test_runner(TrackingSink::new());
        let mut rng = StdRng::seed_from_u64(7);
        let summary = runner
            .run_batch(25, Duration::ZERO, &CancellationToken::new(), &mut rng)
            .unwrap();

        assert_eq!(summary.total_users, 25);
        assert_eq!(summary.events[&EventKind::PageView], 25);
        assert_eq!(summary.sink_errors, 0);
        assert_eq!(summary.variants.values().sum::<u64>(), 25);
    }

    #[test]
    fn cancelled_token_stops_before_first_journey() {
        let mut runner = test_runner(TrackingSink::new());
        let mut rng = StdRng::seed_from_u64(7);
        let token = CancellationToken::new();
        token.cancel();

        let summary = runner.run_batch(25, Duration::ZERO, &token, &mut rng).unwrap();
        assert_eq!(summary.total_users, 0);
    }

    #[test]
    fn sink_errors_do_not_stop_the_batch() {
        let mut runner = test_runner(FailingSink);
        let mut rng = StdRng::seed_from_u64(7);
        let summary = runner
            .run_batch(10, Duration::ZERO, &CancellationToken::new(), &mut rng)
            .unwrap();

        // Every journey still completes; every page_view failed to deliver.
        assert_eq!(summary.total_users, 10);
        assert!(summary.sink_errors >= 10);
    }

    #[test]
    fn summaries_merge_counts() {
        let mut runner = test_runner(TrackingSink::new());
        let mut rng = StdRng::seed_from_u64(7);
        let token = CancellationToken::new();
        let mut total = runner.run_batch(5, Duration::ZERO, &token, &mut rng).unwrap();
        let second = runner.run_batch(5, Duration::ZERO, &token, &mut rng).unwrap();
        total.merge(second);

        assert_eq!(total.total_users, 10);
        assert_eq!(total.events[&EventKind::PageView], 10);
    }
}
