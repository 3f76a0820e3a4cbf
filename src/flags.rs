//! Flag values and per-journey flag assignments.
//!
//! Flag evaluation returns heterogeneous values: the trial-duration flag is a
//! day count, the seasonal banner is free-form text, and the hero banner is a
//! structured object carrying a display string. [`FlagValue`] models all
//! three shapes; a single extraction function feeds the variant classifier.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use derive_more::From;
use serde::{Deserialize, Serialize};

/// Flag key for the trial-duration experiment.
pub const TRIAL_DAYS_FLAG: &str = "number-of-days-trial";
/// Flag key for the seasonal sale banner.
pub const SEASONAL_BANNER_FLAG: &str = "seasonal-sale-banner-text";
/// Flag key for the hero banner experiment.
pub const HERO_BANNER_FLAG: &str = "hero-banner-text";

/// Trial-day count substituted for missing or malformed flag values.
pub const DEFAULT_TRIAL_DAYS: u32 = 7;

/// An evaluated flag value.
///
/// Unlike an assignment in a typed flag SDK, the simulator receives whatever
/// shape the flag-evaluation collaborator returns, so the exact type is only
/// known per flag by convention.
#[derive(Debug, Clone, PartialEq, From, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// An integer value, e.g. a trial-duration day count.
    Integer(i64),
    /// A free-form text value.
    Text(String),
    /// A structured value carrying a display string.
    Object(BannerConfig),
}

/// Structured payload of the hero-banner flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BannerConfig {
    /// Display text shown in the banner; also drives variant classification.
    #[serde(rename = "banner-text")]
    pub banner_text: String,
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl FlagValue {
    /// Display text of the value: the structured object's banner text, or the
    /// value's textual form.
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            FlagValue::Integer(i) => Cow::Owned(i.to_string()),
            FlagValue::Text(s) => Cow::Borrowed(s.as_str()),
            FlagValue::Object(banner) => Cow::Borrowed(banner.banner_text.as_str()),
        }
    }

    /// Interprets the value as a trial-duration day count.
    ///
    /// Missing, negative, or non-numeric values coerce to
    /// [`DEFAULT_TRIAL_DAYS`] rather than failing. Numeric text is accepted.
    pub fn trial_days(&self) -> u32 {
        match self {
            FlagValue::Integer(i) => u32::try_from(*i).unwrap_or(DEFAULT_TRIAL_DAYS),
            FlagValue::Text(s) => s.trim().parse().unwrap_or(DEFAULT_TRIAL_DAYS),
            FlagValue::Object(_) => DEFAULT_TRIAL_DAYS,
        }
    }

    /// Truthiness used by the banner-click decision: non-empty text, non-zero
    /// number, or an object with non-empty banner text.
    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Integer(i) => *i != 0,
            FlagValue::Text(s) => !s.is_empty(),
            FlagValue::Object(banner) => !banner.banner_text.is_empty(),
        }
    }
}

/// Why the evaluator returned a particular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationReason {
    /// The value was picked from the flag's configured variations.
    Split,
    /// The flag was not configured; the caller's default was returned.
    Default,
}

/// A flag value together with the evaluation metadata reported by the
/// flag-evaluation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetail {
    /// The evaluated value.
    pub value: FlagValue,
    /// Index of the chosen variation, when one was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_index: Option<usize>,
    /// Reason for the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<EvaluationReason>,
}

/// The flags evaluated for one journey, read-only after evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagAssignment {
    /// Trial-duration evaluation, with metadata.
    pub trial_days: EvaluationDetail,
    /// Seasonal banner text (empty when the banner is off).
    pub seasonal_banner: FlagValue,
    /// Hero banner evaluation, with metadata.
    pub hero_banner: EvaluationDetail,
    /// When the flags were evaluated. All event timestamps attributed to this
    /// journey must be strictly after this instant.
    pub evaluated_at: DateTime<Utc>,
}

impl FlagAssignment {
    /// The trial-day count to use for revenue adjustment.
    pub fn trial_day_count(&self) -> u32 {
        self.trial_days.value.trial_days()
    }

    /// Flag-value snapshot reported per journey.
    pub fn snapshot(&self) -> HashMap<&'static str, FlagValue> {
        HashMap::from([
            (TRIAL_DAYS_FLAG, self.trial_days.value.clone()),
            (SEASONAL_BANNER_FLAG, self.seasonal_banner.clone()),
            (HERO_BANNER_FLAG, self.hero_banner.value.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_prefers_banner_field() {
        let value = FlagValue::Object(BannerConfig {
            banner_text: "Next Gen Experience".to_owned(),
        });
        assert_eq!(value.display_text(), "Next Gen Experience");
    }

    #[test]
    fn display_text_of_scalars() {
        assert_eq!(FlagValue::Integer(14).display_text(), "14");
        assert_eq!(FlagValue::from("Top Variant").display_text(), "Top Variant");
    }

    #[test]
    fn trial_days_accepts_numeric_shapes() {
        assert_eq!(FlagValue::Integer(14).trial_days(), 14);
        assert_eq!(FlagValue::from("21").trial_days(), 21);
    }

    #[test]
    fn malformed_trial_days_fall_back_to_default() {
        assert_eq!(FlagValue::Integer(-3).trial_days(), DEFAULT_TRIAL_DAYS);
        assert_eq!(FlagValue::from("soon").trial_days(), DEFAULT_TRIAL_DAYS);
        assert_eq!(
            FlagValue::Object(BannerConfig::default()).trial_days(),
            DEFAULT_TRIAL_DAYS
        );
    }

    #[test]
    fn truthiness_matches_banner_semantics() {
        assert!(!FlagValue::from("").is_truthy());
        assert!(FlagValue::from("Holiday Sale - 20% off!").is_truthy());
        assert!(!FlagValue::Integer(0).is_truthy());
        assert!(!FlagValue::Object(BannerConfig::default()).is_truthy());
    }

    #[test]
    fn flag_value_parses_untagged() {
        let value: FlagValue = serde_json::from_str("7").unwrap();
        assert_eq!(value, FlagValue::Integer(7));

        let value: FlagValue = serde_json::from_str(r#"{"banner-text":"Control"}"#).unwrap();
        assert_eq!(
            value,
            FlagValue::Object(BannerConfig {
                banner_text: "Control".to_owned()
            })
        );
    }
}
