//! The event-simulation decision engine.
//!
//! Given a user, the flags evaluated for that user, and the classified
//! variant, the engine decides the ordered sequence of behavioral events the
//! journey emits and the numeric payloads attached to them. The order is
//! fixed: page view, then the signup -> conversion -> revenue chain, then the
//! banner click, then hero engagement. Only the nested chain depends on
//! earlier outcomes; all random draws are independent.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::events::{EventKind, SimulatedEvent};
use crate::flags::{FlagAssignment, FlagValue};
use crate::revenue;
use crate::user::UserProfile;
use crate::variant::Variant;

/// A value per experiment variant.
#[derive(Debug, Clone, Copy)]
pub struct PerVariant<T> {
    pub control: T,
    pub variant_one: T,
    pub next_generation: T,
}

impl<T: Copy> PerVariant<T> {
    pub fn get(&self, variant: Variant) -> T {
        match variant {
            Variant::Control => self.control,
            Variant::VariantOne => self.variant_one,
            Variant::NextGeneration => self.next_generation,
        }
    }
}

/// Probability tables and distribution parameters for the decision engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trial-signup probability per variant.
    pub signup_rate: PerVariant<f64>,
    /// Probability that a signup converts to paid.
    pub paid_conversion_rate: f64,
    /// Banner-click probability when the seasonal banner is shown.
    pub banner_click_rate: f64,
    /// Hero-engagement probability, independent of the other draws.
    pub hero_engagement_rate: f64,
    /// Mean of the gross-revenue normal distribution per variant.
    pub revenue_mean: PerVariant<f64>,
    /// Standard deviation of the gross-revenue distribution.
    pub revenue_stddev: f64,
    /// Bounded uniform noise applied to each rate: a rate r becomes
    /// clamp(r + (u - 0.5) * 2 * noise_level, 0, 1). Zero disables noise.
    pub noise_level: f64,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            signup_rate: PerVariant {
                control: 0.05,
                variant_one: 0.07,
                next_generation: 0.09,
            },
            paid_conversion_rate: 0.5,
            banner_click_rate: 0.1,
            hero_engagement_rate: 0.15,
            revenue_mean: PerVariant {
                control: 30.0,
                variant_one: 35.0,
                next_generation: 40.0,
            },
            revenue_stddev: 5.0,
            noise_level: 0.0,
        }
    }
}

/// Everything a journey reports: the classified variant, the decided events
/// in emission order, and the flag-value snapshot.
#[derive(Debug, Clone)]
pub struct JourneyOutcome {
    pub variant: Variant,
    pub events: Vec<SimulatedEvent>,
    pub flag_values: HashMap<&'static str, FlagValue>,
}

/// The event decision engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Engine {
        Engine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decides the events for one journey.
    ///
    /// No step fails: malformed flag values coerce to documented defaults
    /// inside [`FlagAssignment`].
    pub fn decide(
        &self,
        user: &UserProfile,
        flags: &FlagAssignment,
        variant: Variant,
        rng: &mut impl Rng,
    ) -> JourneyOutcome {
        let mut events = vec![SimulatedEvent::new(EventKind::PageView)];

        let signup_rate = self.effective_rate(self.config.signup_rate.get(variant), rng);
        if rng.gen::<f64>() < signup_rate {
            events.push(SimulatedEvent::new(EventKind::TrialSignup));

            let conversion_rate = self.effective_rate(self.config.paid_conversion_rate, rng);
            if rng.gen::<f64>() < conversion_rate {
                events.push(SimulatedEvent::new(EventKind::TrialToPaidConversion));

                let gross = self.sample_gross_revenue(variant, rng);
                events.push(SimulatedEvent::with_value(EventKind::TotalRevenue, gross));

                let adjusted = revenue::adjusted_revenue(
                    gross,
                    flags.trial_day_count(),
                    user.plan_type,
                    user.country,
                );
                events.push(SimulatedEvent::with_value(
                    EventKind::AdjustedRevenue,
                    adjusted,
                ));
            }
        }

        if flags.seasonal_banner.is_truthy() {
            let banner_rate = self.effective_rate(self.config.banner_click_rate, rng);
            if rng.gen::<f64>() < banner_rate {
                events.push(SimulatedEvent::new(EventKind::BannerClick));
            }
        }

        let hero_rate = self.effective_rate(self.config.hero_engagement_rate, rng);
        if rng.gen::<f64>() < hero_rate {
            events.push(SimulatedEvent::new(EventKind::HeroEngagement));
        }

        JourneyOutcome {
            variant,
            events,
            flag_values: flags.snapshot(),
        }
    }

    /// Gross revenue draw: normal around the variant's mean, clamped at zero
    /// and rounded to cents.
    fn sample_gross_revenue(&self, variant: Variant, rng: &mut impl Rng) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        let raw = self.config.revenue_mean.get(variant) + self.config.revenue_stddev * z;
        revenue::round_cents(raw).max(0.0)
    }

    fn effective_rate(&self, base: f64, rng: &mut impl Rng) -> f64 {
        if self.config.noise_level == 0.0 {
            return base;
        }
        let noise = (rng.gen::<f64>() - 0.5) * 2.0 * self.config.noise_level;
        (base + noise).clamp(0.0, 1.0)
    }
}
