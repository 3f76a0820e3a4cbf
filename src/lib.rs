//! Synthetic traffic simulator for a feature-flag experimentation platform.
//!
//! # Overview
//!
//! `flagsim` generates synthetic user journeys against a set of experiment
//! flags and probabilistically emits the outcome events (signups, paid
//! conversions, revenue) that real traffic would produce, so that analytics
//! pipelines can be exercised without live users.
//!
//! One journey runs through a fixed pipeline:
//!
//! 1. [`UserProfile::generate`] produces a synthetic user.
//! 2. A [`FlagEvaluator`] resolves the experiment flags for that user. Flag
//!    evaluation is an external collaborator; the shipped
//!    [`SplitEvaluator`](evaluator::SplitEvaluator) is a random-split
//!    stand-in for it.
//! 3. [`Variant::from_flag`] classifies the hero-banner value into an
//!    experiment arm.
//! 4. The [`Engine`] decides which behavioral events fire and what revenue
//!    they carry, preserving the causal order between flag evaluation and
//!    downstream events.
//! 5. An [`EventSink`] delivers each decided event, either as an immediate
//!    tracking call or as a causally-delayed structured record for batch
//!    insertion.
//!
//! The decision engine never fails on malformed flag values; documented
//! defaults are substituted instead. Sink failures are per-record: a failed
//! insert is logged and the journey continues with the next event.
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with the
//! `flagsim` target for all messages. Integrate a `log`-compatible logger
//! implementation (the bundled binary uses `env_logger`) for visibility into
//! simulation progress and sink errors.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod assignment_log;
pub mod engine;
pub mod evaluator;
pub mod events;
pub mod flags;
pub mod revenue;
pub mod runner;
pub mod sink;
pub mod traffic;
pub mod user;
pub mod variant;

mod error;

pub use engine::{Engine, EngineConfig, JourneyOutcome};
pub use error::{Error, Result};
pub use evaluator::FlagEvaluator;
pub use events::{EventKind, MetricRecord, SimulatedEvent};
pub use flags::{FlagAssignment, FlagValue};
pub use runner::{CancellationToken, RunSummary, Runner};
pub use sink::EventSink;
pub use user::UserProfile;
pub use variant::Variant;
