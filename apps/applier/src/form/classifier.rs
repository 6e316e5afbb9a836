//! Field Classifier: label + control kind → resolution strategy.
//!
//! Priority:
//!   (a) exact-purpose labels read a profile key directly (free-text kinds only)
//!   (b) count/experience labels read dedicated keys, default "N/A"
//!   (c) capability labels read dedicated keys, default "Yes"
//!   (d) everything else is delegated to the Answer Resolver

use crate::form::descriptor::FieldKind;
use crate::profile::keys;

/// Which Answer Resolver entry point handles delegated labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverPath {
    /// Rule → semantic → résumé chain (`AnswerResolver::resolve`).
    Dynamic,
    /// Profile-context prompt (`AnswerResolver::answer_generic`).
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// First present key wins; `default` when none is set. An empty default
    /// means "leave the field alone".
    Profile {
        keys: &'static [&'static str],
        default: &'static str,
    },
    Delegate(ResolverPath),
    ResumeUpload,
    Consent,
}

struct LabelRule {
    phrases: &'static [&'static str],
    /// Extra phrase that must also be present.
    with: Option<&'static str>,
    keys: &'static [&'static str],
    default: &'static str,
}

impl LabelRule {
    fn matches(&self, lowered: &str) -> bool {
        self.phrases.iter().any(|p| lowered.contains(p))
            && self.with.map_or(true, |w| lowered.contains(w))
    }
}

const fn rule(
    phrases: &'static [&'static str],
    keys: &'static [&'static str],
    default: &'static str,
) -> LabelRule {
    LabelRule {
        phrases,
        with: None,
        keys,
        default,
    }
}

const fn rule_with(
    phrases: &'static [&'static str],
    with: &'static str,
    keys: &'static [&'static str],
    default: &'static str,
) -> LabelRule {
    LabelRule {
        phrases,
        with: Some(with),
        keys,
        default,
    }
}

// (a) More specific labels first: "company name" must not hit "name".
static EXACT_PURPOSE: &[LabelRule] = &[
    rule(&["linkedin"], &[keys::LINKEDIN], ""),
    rule(&["email", "e-mail"], &[keys::EMAIL], ""),
    rule(&["phone", "mobile"], &[keys::PHONE], ""),
    rule(&["company"], &[keys::CURRENT_COMPANY], ""),
    rule(&["position", "job title", "current title"], &[keys::CURRENT_POSITION], ""),
    rule(
        &["education", "degree", "university"],
        &[keys::EDUCATION_LEVEL, keys::EDUCATION_MASTERS, keys::EDUCATION_BACHELORS],
        "",
    ),
    rule(&["skill", "technologies"], &[keys::KEY_SKILLS], ""),
    rule(&["location", "city"], &[keys::LOCATION, keys::CURRENT_CITY], ""),
    rule(&["name"], &[keys::FULL_NAME], ""),
];

// (b)
static COUNT_EXPERIENCE: &[LabelRule] = &[
    rule(&["full-stack projects"], &["FULLSTACK_PROJECTS"], "N/A"),
    rule(&["ai projects"], &["AI_PROJECTS"], "N/A"),
    rule(&["ml projects", "machine learning projects"], &["MACHINE_LEARNING_PROJECTS"], "N/A"),
    rule(&["web projects"], &["WEB_PROJECTS"], "N/A"),
    rule(&["automation projects"], &["AUTOMATION_PROJECTS"], "N/A"),
    rule(&["react experience"], &["REACT_EXPERIENCE"], "N/A"),
    rule(&["typescript experience"], &["TYPESCRIPT_EXPERIENCE"], "N/A"),
    rule(&["python experience"], &["PYTHON_EXPERIENCE"], "N/A"),
    rule(&["js experience", "javascript experience"], &["JAVASCRIPT_EXPERIENCE"], "N/A"),
    rule_with(&["experience"], "years", &[keys::EXPERIENCE_YEARS], "N/A"),
];

// (c)
static CAPABILITY: &[LabelRule] = &[
    rule(&["figma"], &["FIGMA_DESIGNS"], "Yes"),
    rule(&["portfolio"], &["PORTFOLIO_AVAILABLE"], "Yes"),
    rule(&["github"], &["GITHUB_AVAILABLE"], "Yes"),
    rule(&["chatgpt", "ai experience"], &["AI_CHATGPT_EXPERIENCE"], "Yes"),
    rule(&["coding assistant"], &["CODING_ASSISTANT_EXPERIENCE"], "Yes"),
    rule(&["team"], &["TEAM_COLLABORATION"], "Yes"),
    rule(&["agile"], &["AGILE_EXPERIENCE"], "Yes"),
    rule(&["ci/cd"], &["CI_CD_EXPERIENCE"], "Yes"),
    rule_with(&["english"], "proficiency", &["ENGLISH_PROFICIENCY"], "Professional"),
];

#[derive(Debug, Clone, Copy)]
pub struct FieldClassifier {
    fallback: ResolverPath,
}

impl FieldClassifier {
    pub fn new(fallback: ResolverPath) -> Self {
        Self { fallback }
    }

    pub fn classify(&self, label: &str, kind: FieldKind) -> ResolutionStrategy {
        match kind {
            FieldKind::FileUpload => return ResolutionStrategy::ResumeUpload,
            FieldKind::Checkbox => return ResolutionStrategy::Consent,
            _ => {}
        }

        let lowered = label.to_lowercase();

        let tables: &[&[LabelRule]] = if kind.is_free_text() {
            &[EXACT_PURPOSE, COUNT_EXPERIENCE, CAPABILITY]
        } else {
            &[COUNT_EXPERIENCE, CAPABILITY]
        };

        tables
            .iter()
            .flat_map(|table| table.iter())
            .find(|r| r.matches(&lowered))
            .map(|r| ResolutionStrategy::Profile {
                keys: r.keys,
                default: r.default,
            })
            .unwrap_or(ResolutionStrategy::Delegate(self.fallback))
    }
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new(ResolverPath::Dynamic)
    }
}

/// Labels on checkboxes that mean "I consent".
pub fn implies_consent(label: &str) -> bool {
    const CONSENT: &[&str] = &["agree", "consent", "privacy", "accept", "confirm"];
    let lowered = label.to_lowercase();
    CONSENT.iter().any(|k| lowered.contains(k))
}
