//! Synthetic user profiles.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Countries modeled by the user generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Us,
    Uk,
    Fr,
    De,
    Ca,
}

impl Country {
    /// All modeled countries, in sampling order.
    pub const ALL: [Country; 5] = [
        Country::Us,
        Country::Uk,
        Country::Fr,
        Country::De,
        Country::Ca,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Uk => "UK",
            Country::Fr => "FR",
            Country::De => "DE",
            Country::Ca => "CA",
        }
    }
}

/// Pet-type category of a synthetic user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetType {
    Dog,
    Cat,
    Both,
}

impl PetType {
    pub const ALL: [PetType; 3] = [PetType::Dog, PetType::Cat, PetType::Both];
}

/// Subscription plan of a synthetic user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Basic,
    Premium,
    Trial,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Basic, PlanType::Premium, PlanType::Trial];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Basic => "basic",
            PlanType::Premium => "premium",
            PlanType::Trial => "trial",
        }
    }
}

/// Payment method of a synthetic user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    CreditCard,
    Paypal,
    ApplePay,
    GooglePay,
    Bank,
}

impl PaymentType {
    pub const ALL: [PaymentType; 5] = [
        PaymentType::CreditCard,
        PaymentType::Paypal,
        PaymentType::ApplePay,
        PaymentType::GooglePay,
        PaymentType::Bank,
    ];
}

/// Candidate sub-regions for a country. The country set is closed, so every
/// country has its own list.
pub fn sub_regions(country: Country) -> &'static [&'static str] {
    match country {
        Country::Us => &[
            "California",
            "Texas",
            "New York",
            "Florida",
            "Illinois",
            "Pennsylvania",
            "Ohio",
            "Georgia",
            "Washington",
            "Colorado",
        ],
        Country::Ca => &[
            "ON", "QC", "BC", "AB", "MB", "SK", "NS", "NB", "NL", "PE", "YT", "NT", "NU",
        ],
        Country::Fr => &[
            "Paris",
            "Bouches-du-Rhône",
            "Nord",
            "Rhône",
            "Haute-Garonne",
        ],
        Country::De => &[
            "Berlin",
            "Bavaria",
            "North Rhine-Westphalia",
            "Baden-Württemberg",
            "Hesse",
        ],
        Country::Uk => &[
            "Greater London",
            "West Midlands",
            "Greater Manchester",
            "West Yorkshire",
            "Kent",
        ],
    }
}

const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Avery", "Quinn",
    "Dana", "Robin",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Lopez", "Wilson", "Anderson",
];

/// A synthetic user, created once per journey and immutable thereafter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Unique key, stable for the lifetime of one journey.
    pub key: String,
    pub name: String,
    pub country: Country,
    /// Country-appropriate sub-region.
    pub state: String,
    pub pet_type: PetType,
    pub plan_type: PlanType,
    pub payment_type: PaymentType,
}

impl UserProfile {
    /// Generates one profile by independently sampling each attribute
    /// uniformly from its enumeration, then a sub-region from the country's
    /// candidate list.
    pub fn generate(rng: &mut impl Rng) -> UserProfile {
        let country = Country::ALL[rng.gen_range(0..Country::ALL.len())];
        let regions = sub_regions(country);
        let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
        let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];

        UserProfile {
            key: Uuid::new_v4().to_string(),
            name: format!("{first} {last}"),
            country,
            state: regions[rng.gen_range(0..regions.len())].to_owned(),
            pet_type: PetType::ALL[rng.gen_range(0..PetType::ALL.len())],
            plan_type: PlanType::ALL[rng.gen_range(0..PlanType::ALL.len())],
            payment_type: PaymentType::ALL[rng.gen_range(0..PaymentType::ALL.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn sub_region_comes_from_country_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let user = UserProfile::generate(&mut rng);
            assert!(
                sub_regions(user.country).contains(&user.state.as_str()),
                "{} is not a sub-region of {}",
                user.state,
                user.country.as_str()
            );
        }
    }

    #[test]
    fn keys_are_unique_across_journeys() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = UserProfile::generate(&mut rng);
        let b = UserProfile::generate(&mut rng);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn country_serializes_as_upper_code() {
        assert_eq!(serde_json::to_string(&Country::De).unwrap(), r#""DE""#);
    }

    #[test]
    fn payment_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentType::ApplePay).unwrap(),
            r#""apple_pay""#
        );
    }
}
