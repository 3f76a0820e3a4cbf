//! Experiment variant classification.

use serde::{Deserialize, Serialize};

use crate::flags::FlagValue;

/// The experiment arm effectively assigned to a user, derived from the
/// hero-banner flag's display text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    #[serde(rename = "Control")]
    Control,
    #[serde(rename = "Variant 1")]
    VariantOne,
    #[serde(rename = "Next Generation")]
    NextGeneration,
}

impl Variant {
    /// Classifies banner text into a variant.
    ///
    /// Checks run in fixed precedence order and only the first match applies:
    /// "control", then "next", then "variant"/"top". Anything else is
    /// [`Variant::Control`]. Matching is case-insensitive substring search.
    pub fn classify(banner_text: &str) -> Variant {
        let text = banner_text.to_lowercase();
        if text.contains("control") {
            Variant::Control
        } else if text.contains("next") {
            Variant::NextGeneration
        } else if text.contains("variant") || text.contains("top") {
            Variant::VariantOne
        } else {
            Variant::Control
        }
    }

    /// Classifies a hero-banner flag value via its display text.
    pub fn from_flag(value: &FlagValue) -> Variant {
        Variant::classify(&value.display_text())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Control => "Control",
            Variant::VariantOne => "Variant 1",
            Variant::NextGeneration => "Next Generation",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::BannerConfig;

    use super::*;

    #[test]
    fn classifies_known_banner_texts() {
        assert_eq!(Variant::classify("CONTROL"), Variant::Control);
        assert_eq!(
            Variant::classify("Next Gen Experience"),
            Variant::NextGeneration
        );
        assert_eq!(Variant::classify("Top Variant"), Variant::VariantOne);
        assert_eq!(Variant::classify("xyz"), Variant::Control);
    }

    #[test]
    fn first_matching_rule_wins() {
        // "control" outranks everything; "next" outranks "variant"/"top".
        assert_eq!(Variant::classify("control of next top"), Variant::Control);
        assert_eq!(Variant::classify("Next Top Variant"), Variant::NextGeneration);
    }

    #[test]
    fn empty_text_defaults_to_control() {
        assert_eq!(Variant::classify(""), Variant::Control);
    }

    #[test]
    fn classifies_structured_flag_values() {
        let value = FlagValue::Object(BannerConfig {
            banner_text: "Next Gen Experience".to_owned(),
        });
        assert_eq!(Variant::from_flag(&value), Variant::NextGeneration);
    }
}
