//! Subscription pricing and revenue computation.

use rand::Rng;

use crate::user::{Country, PlanType};

/// Billing region used by the price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Us = 0,
    Ca = 1,
    Uk = 2,
    Eu = 3,
}

impl From<Country> for Region {
    fn from(country: Country) -> Region {
        match country {
            Country::Us => Region::Us,
            Country::Ca => Region::Ca,
            Country::Uk => Region::Uk,
            // FR and DE bill under the common EU price point.
            Country::Fr | Country::De => Region::Eu,
        }
    }
}

/// Pricing row of the monthly price table. Separate from [`PlanType`]: users
/// sign up for basic/premium/trial, while pricing is published for
/// basic/premium/deluxe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    Basic,
    Premium,
    Deluxe,
}

impl From<PlanType> for PlanTier {
    fn from(plan: PlanType) -> PlanTier {
        match plan {
            PlanType::Premium => PlanTier::Premium,
            // Plans without a pricing row of their own bill at the basic rate.
            PlanType::Basic | PlanType::Trial => PlanTier::Basic,
        }
    }
}

// Monthly base prices, indexed by [Region] discriminant: US, CA, UK, EU.
const BASIC_PRICES: [f64; 4] = [29.99, 39.99, 24.99, 27.99];
const PREMIUM_PRICES: [f64; 4] = [49.99, 64.99, 39.99, 44.99];
const DELUXE_PRICES: [f64; 4] = [79.99, 99.99, 59.99, 66.99];

const DAYS_PER_MONTH: f64 = 30.0;

/// Monthly base price for a pricing tier in a billing region.
pub fn tier_price(tier: PlanTier, region: Region) -> f64 {
    let row = match tier {
        PlanTier::Basic => &BASIC_PRICES,
        PlanTier::Premium => &PREMIUM_PRICES,
        PlanTier::Deluxe => &DELUXE_PRICES,
    };
    row[region as usize]
}

/// Monthly base price for a user's plan and country.
pub fn base_price(plan: PlanType, country: Country) -> f64 {
    tier_price(plan.into(), country.into())
}

/// Gross monthly revenue sample: base price scaled by a uniform multiplier in
/// [0.9, 1.1], rounded to cents. Fallback path; the engine's primary revenue
/// path draws from a per-variant normal distribution instead.
pub fn sample_gross_revenue(plan: PlanType, country: Country, rng: &mut impl Rng) -> f64 {
    round_cents(base_price(plan, country) * rng.gen_range(0.9..=1.1))
}

/// Net revenue after subtracting the pro-rated cost of the trial period.
/// Never negative.
pub fn adjusted_revenue(gross: f64, trial_days: u32, plan: PlanType, country: Country) -> f64 {
    let daily_rate = base_price(plan, country) / DAYS_PER_MONTH;
    let trial_cost = daily_rate * f64::from(trial_days);
    round_cents(gross - trial_cost).max(0.0)
}

/// Rounds to two decimal places.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
