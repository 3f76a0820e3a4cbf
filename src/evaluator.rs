//! The flag-evaluation collaborator boundary.
//!
//! Real deployments resolve flags through a feature-flag service; the engine
//! only needs something that returns a value (plus optional metadata) per
//! flag and user. [`SplitEvaluator`] is the shipped stand-in: it picks
//! uniformly among configured variations, which is enough to drive realistic
//! experiment telemetry without any targeting machinery.

use std::collections::HashMap;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::flags::{
    BannerConfig, EvaluationDetail, EvaluationReason, FlagAssignment, FlagValue,
    DEFAULT_TRIAL_DAYS, HERO_BANNER_FLAG, SEASONAL_BANNER_FLAG, TRIAL_DAYS_FLAG,
};
use crate::user::UserProfile;

/// Resolves flag values for a user context.
///
/// Implementations must be side-effect-free from the engine's perspective and
/// must return the caller's default rather than failing when a flag is
/// unknown.
pub trait FlagEvaluator {
    /// Evaluates a flag to a bare value.
    fn evaluate(&mut self, flag_key: &str, user: &UserProfile, default: FlagValue) -> FlagValue;

    /// Evaluates a flag, reporting variation index and reason alongside the
    /// value.
    fn evaluate_detail(
        &mut self,
        flag_key: &str,
        user: &UserProfile,
        default: FlagValue,
    ) -> EvaluationDetail;

    /// Evaluates the three experiment flags for one journey and stamps the
    /// evaluation time.
    fn evaluate_journey_flags(&mut self, user: &UserProfile) -> FlagAssignment {
        let trial_days = self.evaluate_detail(
            TRIAL_DAYS_FLAG,
            user,
            FlagValue::Integer(i64::from(DEFAULT_TRIAL_DAYS)),
        );
        let seasonal_banner =
            self.evaluate(SEASONAL_BANNER_FLAG, user, FlagValue::Text(String::new()));
        let hero_banner = self.evaluate_detail(
            HERO_BANNER_FLAG,
            user,
            FlagValue::Object(BannerConfig::default()),
        );

        FlagAssignment {
            trial_days,
            seasonal_banner,
            hero_banner,
            evaluated_at: Utc::now(),
        }
    }
}

/// A random-split evaluator: each configured flag resolves to one of its
/// variations, chosen uniformly per evaluation.
pub struct SplitEvaluator {
    variations: HashMap<String, Vec<FlagValue>>,
    rng: StdRng,
}

impl SplitEvaluator {
    /// Creates an evaluator with no configured flags. Every evaluation
    /// returns the caller's default until flags are added.
    pub fn new() -> SplitEvaluator {
        SplitEvaluator {
            variations: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates an evaluator preconfigured with the standard experiment flags:
    /// trial durations, seasonal banner on/off, and the three hero-banner
    /// arms.
    pub fn with_default_experiments() -> SplitEvaluator {
        SplitEvaluator::new()
            .flag(
                TRIAL_DAYS_FLAG,
                vec![
                    FlagValue::Integer(3),
                    FlagValue::Integer(7),
                    FlagValue::Integer(14),
                    FlagValue::Integer(30),
                ],
            )
            .flag(
                SEASONAL_BANNER_FLAG,
                vec![FlagValue::from(""), FlagValue::from("Holiday Sale - 20% off!")],
            )
            .flag(
                HERO_BANNER_FLAG,
                vec![
                    FlagValue::Object(BannerConfig {
                        banner_text: "Control".to_owned(),
                    }),
                    FlagValue::Object(BannerConfig {
                        banner_text: "Top Variant".to_owned(),
                    }),
                    FlagValue::Object(BannerConfig {
                        banner_text: "Next Gen Experience".to_owned(),
                    }),
                ],
            )
    }

    /// Adds a flag with its variation list.
    pub fn flag(mut self, key: impl Into<String>, variations: Vec<FlagValue>) -> SplitEvaluator {
        self.variations.insert(key.into(), variations);
        self
    }

    /// Replaces the internal RNG, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> SplitEvaluator {
        self.rng = rng;
        self
    }
}

impl Default for SplitEvaluator {
    fn default() -> SplitEvaluator {
        SplitEvaluator::new()
    }
}

impl FlagEvaluator for SplitEvaluator {
    fn evaluate(&mut self, flag_key: &str, user: &UserProfile, default: FlagValue) -> FlagValue {
        self.evaluate_detail(flag_key, user, default).value
    }

    fn evaluate_detail(
        &mut self,
        flag_key: &str,
        _user: &UserProfile,
        default: FlagValue,
    ) -> EvaluationDetail {
        match self.variations.get(flag_key) {
            Some(variations) if !variations.is_empty() => {
                let index = self.rng.gen_range(0..variations.len());
                EvaluationDetail {
                    value: variations[index].clone(),
                    variation_index: Some(index),
                    reason: Some(EvaluationReason::Split),
                }
            }
            _ => {
                log::debug!(target: "flagsim", flag_key; "flag not configured, returning default");
                EvaluationDetail {
                    value: default,
                    variation_index: None,
                    reason: Some(EvaluationReason::Default),
                }
            }
        }
    }
}
