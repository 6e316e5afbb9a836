// Prompt templates for the two generative fallbacks.
// Placeholders are substituted with `.replace`; templates stay plain constants
// so they can be read and diffed without running anything.

use crate::profile::ProfileStore;

pub const RESUME_SYSTEM: &str = "You are an expert AI job applicant.";

/// Résumé-grounded answer for an arbitrary form question.
pub const RESUME_ANSWER_PROMPT: &str = "\
You are an AI job applicant filling out a job application form.
Here is your resume:

{resume}

Answer the following question as truthfully and professionally as possible:
Q: {question}
A:";

pub const RESUME_MAX_TOKENS: u32 = 200;
pub const RESUME_TEMPERATURE: f32 = 0.7;

pub const PROFILE_SYSTEM: &str =
    "You are a professional job application assistant. Provide concise, relevant answers.";

pub const PROFILE_MAX_TOKENS: u32 = 50;
pub const PROFILE_TEMPERATURE: f32 = 0.3;

const NUMBER_PROMPT: &str = "\
Based on this user profile, answer with ONLY A NUMBER for: {question}

Context: {context}

{instruction}";

const SENTENCE_PROMPT: &str = "\
Based on this user profile, answer the following job application question in 1 concise sentence (max 15 words):

Question: {question}

Context: {context}

Provide a professional, to-the-point answer suitable for a job application.";

const FULLSTACK_PROJECTS_INSTRUCTION: &str = "Return only a number (like 5, 10, 3.5) representing \
years or project count. No text, no words, just the number.";
const REACT_INSTRUCTION: &str = "Return only a number representing years of React experience \
(like 3, 5, 2.5). No text, no words, just the number.";
const TYPESCRIPT_INSTRUCTION: &str = "Return only a number representing years of TypeScript \
experience (like 2, 4, 3.5). No text, no words, just the number.";
const FULLSTACK_YEARS_INSTRUCTION: &str = "Return only a number representing years of full-stack \
development experience (like 3, 5, 4.5). No text, no words, just the number.";
const GENERIC_NUMBER_INSTRUCTION: &str = "Return only a number. No text, no words, just the number.";

pub fn resume_answer_prompt(resume: &str, question: &str) -> String {
    RESUME_ANSWER_PROMPT
        .replace("{resume}", resume)
        .replace("{question}", question)
}

/// Renders every shareable profile field as `Title Case Key: value (description)`.
pub fn profile_context(profile: &ProfileStore) -> String {
    let mut lines = vec!["User Profile:".to_string()];
    for field in profile.shareable_fields() {
        if field.value.trim().is_empty() {
            continue;
        }
        let title = title_case_key(&field.key);
        match field.description.as_deref() {
            Some(d) => lines.push(format!("{title}: {} ({d})", field.value)),
            None => lines.push(format!("{title}: {}", field.value)),
        }
    }
    lines.join("\n")
}

/// Profile-context prompt. `numeric` selects the bare-number variants.
pub fn profile_answer_prompt(question: &str, context: &str, numeric: bool) -> String {
    if !numeric {
        return SENTENCE_PROMPT
            .replace("{question}", question)
            .replace("{context}", context);
    }

    NUMBER_PROMPT
        .replace("{question}", question)
        .replace("{context}", context)
        .replace("{instruction}", number_instruction(question))
}

fn number_instruction(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("full-stack") && q.contains("projects") {
        FULLSTACK_PROJECTS_INSTRUCTION
    } else if q.contains("react") && q.contains("experience") {
        REACT_INSTRUCTION
    } else if q.contains("typescript") && q.contains("experience") {
        TYPESCRIPT_INSTRUCTION
    } else if q.contains("full-stack developer") && q.contains("experience") {
        FULLSTACK_YEARS_INSTRUCTION
    } else {
        GENERIC_NUMBER_INSTRUCTION
    }
}

fn title_case_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_prompt_embeds_question_verbatim() {
        let prompt = resume_answer_prompt("Rust engineer", "Why do you want this job?");
        assert!(prompt.contains("Rust engineer"));
        assert!(prompt.contains("Q: Why do you want this job?"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_title_case_key() {
        assert_eq!(title_case_key("EXPERIENCE_YEARS"), "Experience Years");
        assert_eq!(title_case_key("CV_PATH"), "Cv Path");
    }

    #[test]
    fn test_profile_context_lists_fields_with_descriptions() {
        let profile = ProfileStore::from_json_str(
            r#"{"FULL_NAME": {"value": "Ayesha Khan", "description": "Full name"},
                "EMAIL": "ayesha@example.com"}"#,
        )
        .unwrap();
        let context = profile_context(&profile);
        assert_eq!(
            context,
            "User Profile:\nEmail: ayesha@example.com\nFull Name: Ayesha Khan (Full name)"
        );
    }

    #[test]
    fn test_profile_context_omits_credentials() {
        let profile = ProfileStore::from_text_str("FULL_NAME: Ayesha Khan")
            .unwrap()
            .with_overrides([("PASSWORD", "hunter2-secret".to_string())])
            .unwrap();
        let context = profile_context(&profile);
        assert_eq!(context, "User Profile:\nFull Name: Ayesha Khan");
    }

    #[test]
    fn test_numeric_variants() {
        let react = profile_answer_prompt("How many years of React experience?", "ctx", true);
        assert!(react.contains("React experience (like 3, 5, 2.5)"));

        let generic = profile_answer_prompt("How many certifications?", "ctx", true);
        assert!(generic.ends_with("Return only a number. No text, no words, just the number."));

        let sentence = profile_answer_prompt("Why us?", "ctx", false);
        assert!(sentence.contains("max 15 words"));
    }
}
