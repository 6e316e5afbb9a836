//! Static rule table.
//!
//! Rules are evaluated top to bottom against the lowercased question; the
//! first rule whose trigger matches AND which produces a value wins. Order
//! encodes priority, so specific salary patterns sit above the general one.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::profile::{keys, ProfileStore};

/// Substring trigger: every `all` phrase must occur, and at least one `any`
/// phrase when `any` is non-empty. `words` must match as whole words, so
/// "city" does not fire on "ethnicity".
#[derive(Debug)]
pub struct Trigger {
    all: &'static [&'static str],
    any: &'static [&'static str],
    words: &'static [&'static str],
}

impl Trigger {
    const fn any(phrases: &'static [&'static str]) -> Self {
        Self { all: &[], any: phrases, words: &[] }
    }

    const fn all(phrases: &'static [&'static str]) -> Self {
        Self { all: phrases, any: &[], words: &[] }
    }

    const fn all_any(all: &'static [&'static str], any: &'static [&'static str]) -> Self {
        Self { all, any, words: &[] }
    }

    const fn word(words: &'static [&'static str]) -> Self {
        Self { all: &[], any: &[], words }
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.all.iter().all(|p| lowered.contains(p))
            && (self.any.is_empty() || self.any.iter().any(|p| lowered.contains(p)))
            && (self.words.is_empty()
                || self
                    .words
                    .iter()
                    .any(|w| WORD_PATTERNS.get(w).is_some_and(|re| re.is_match(lowered))))
    }
}

static WORD_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    RULES
        .iter()
        .flat_map(|rule| rule.trigger.words.iter())
        .map(|word| {
            let pattern = format!(r"\b{}\b", regex::escape(word));
            (*word, Regex::new(&pattern).expect("word pattern is valid"))
        })
        .collect()
});

#[derive(Debug)]
pub enum RuleValue {
    Fixed(&'static str),
    /// First present profile key; `default` when none is set. With no default
    /// the rule yields nothing and evaluation continues.
    Profile {
        keys: &'static [&'static str],
        default: Option<&'static str>,
    },
    /// Monthly expected salary × 12.
    AnnualSalary,
    /// Compare named cities against the candidate's own city.
    Residency,
}

#[derive(Debug)]
pub struct StaticRule {
    pub name: &'static str,
    trigger: Trigger,
    value: RuleValue,
}

impl StaticRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.trigger.matches(lowered)
    }

    pub fn resolve(&self, lowered: &str, profile: &ProfileStore) -> Option<String> {
        match &self.value {
            RuleValue::Fixed(v) => Some((*v).to_string()),
            RuleValue::Profile { keys, default } => profile
                .first_value(keys)
                .map(str::to_string)
                .or_else(|| default.map(str::to_string)),
            RuleValue::AnnualSalary => Some(annual_salary(profile)),
            RuleValue::Residency => residency_answer(lowered, profile),
        }
    }
}

const DEFAULT_ANNUAL_SALARY: &str = "1080000";

const RESIDENCY_PHRASES: &[&str] = &["based in", "located in", "live in", "currently in", "reside in"];

/// Places that, when named, mean "somewhere other than the candidate's city".
const OTHER_CITIES: &[&str] = &["karachi", "lahore", "peshawar", "multan", "us", "uae", "america", "dubai"];

static OTHER_CITY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    OTHER_CITIES
        .iter()
        .map(|city| {
            let pattern = format!(r"\b{}\b", regex::escape(city));
            (*city, Regex::new(&pattern).expect("city pattern is valid"))
        })
        .collect()
});

pub static RULES: &[StaticRule] = &[
    StaticRule {
        name: "street_address",
        trigger: Trigger::any(&["street address", "address line"]),
        value: RuleValue::Profile {
            keys: &[keys::STREET_ADDRESS, keys::CURRENT_CITY],
            default: None,
        },
    },
    StaticRule {
        name: "city",
        trigger: Trigger::word(&["city"]),
        value: RuleValue::Profile {
            keys: &[keys::CURRENT_CITY, keys::LOCATION],
            default: None,
        },
    },
    StaticRule {
        name: "state",
        trigger: Trigger::word(&["state"]),
        value: RuleValue::Profile {
            keys: &[keys::STATE],
            default: None,
        },
    },
    StaticRule {
        name: "country",
        trigger: Trigger::any(&["country"]),
        value: RuleValue::Profile {
            keys: &[keys::COUNTRY],
            default: None,
        },
    },
    StaticRule {
        name: "notice_period",
        trigger: Trigger::any(&["notice", "joining", "availability"]),
        value: RuleValue::Profile {
            keys: &[keys::JOINING_DAYS],
            default: Some("10"),
        },
    },
    StaticRule {
        name: "hourly_rate",
        trigger: Trigger::any(&["hourly rate"]),
        value: RuleValue::Profile {
            keys: &[keys::EXPECTED_HOURLY_RATE],
            default: Some("25"),
        },
    },
    StaticRule {
        name: "years_of_experience",
        trigger: Trigger::any(&["how many", "years of experience"]),
        value: RuleValue::Profile {
            keys: &[keys::EXPERIENCE_YEARS],
            default: Some("5"),
        },
    },
    StaticRule {
        name: "agreement",
        trigger: Trigger::any(&["privacy policy", "agree to", "honesty", "accept", "terms"]),
        value: RuleValue::Fixed("Yes"),
    },
    StaticRule {
        name: "current_salary",
        trigger: Trigger::all(&["current", "salary"]),
        value: RuleValue::Profile {
            keys: &[keys::CURRENT_SALARY],
            default: Some("70000"),
        },
    },
    StaticRule {
        name: "expected_salary_annual",
        trigger: Trigger::all_any(&["expected", "salary"], &["year", "annual"]),
        value: RuleValue::AnnualSalary,
    },
    StaticRule {
        name: "expected_salary_monthly",
        trigger: Trigger::all(&["expected", "salary", "month"]),
        value: RuleValue::Profile {
            keys: &[keys::EXPECTED_SALARY],
            default: Some("90000"),
        },
    },
    StaticRule {
        name: "expected_salary",
        trigger: Trigger::all(&["expected", "salary"]),
        value: RuleValue::Profile {
            keys: &[keys::EXPECTED_SALARY],
            default: Some("90000"),
        },
    },
    StaticRule {
        name: "residency",
        trigger: Trigger::any(RESIDENCY_PHRASES),
        value: RuleValue::Residency,
    },
    StaticRule {
        name: "travel_relocation",
        trigger: Trigger::any(&[
            "travel onsite",
            "onsite role",
            "travel requirement",
            "willing to relocate",
            "relocate",
            "ok to travel",
            "comfortable with onsite",
            "on-site",
            "open to travel",
        ]),
        value: RuleValue::Fixed("Yes"),
    },
];

/// Runs the table. Returns the winning rule's name and its answer.
pub fn apply(question: &str, profile: &ProfileStore) -> Option<(&'static str, String)> {
    let lowered = question.to_lowercase();
    RULES
        .iter()
        .filter(|rule| rule.matches(&lowered))
        .find_map(|rule| rule.resolve(&lowered, profile).map(|v| (rule.name, v)))
}

fn annual_salary(profile: &ProfileStore) -> String {
    let monthly = profile.value_or(keys::EXPECTED_SALARY, "90000");
    let digits: String = monthly.chars().filter(|c| !matches!(c, ',' | '_' | ' ')).collect();
    match digits.parse::<u64>() {
        Ok(m) => m.saturating_mul(12).to_string(),
        Err(_) => DEFAULT_ANNUAL_SALARY.to_string(),
    }
}

fn residency_answer(lowered: &str, profile: &ProfileStore) -> Option<String> {
    let own_city = profile
        .value(keys::CURRENT_CITY)
        .map(str::to_lowercase)
        .unwrap_or_default();

    let names_other_city = OTHER_CITY_PATTERNS
        .iter()
        .any(|(city, re)| re.is_match(lowered) && !own_city.contains(city));
    if names_other_city {
        return Some("No".to_string());
    }

    if !own_city.is_empty() && lowered.contains(&own_city) {
        return Some("Yes".to_string());
    }
    None
}
