//! Option matching for radio groups and dropdowns.
//!
//! All matching is case-insensitive substring containment of the answer in
//! the option text. An empty answer never matches anything.

use crate::answers::is_not_available;

/// How an option was picked, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    Matched,
    YesDefault,
    SecondOption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub text: String,
    pub reason: SelectionReason,
}

impl Selection {
    fn new(options: &[String], index: usize, reason: SelectionReason) -> Self {
        Self {
            index,
            text: options[index].trim().to_string(),
            reason,
        }
    }
}

fn position_containing(options: &[String], needle: &str) -> Option<usize> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    options
        .iter()
        .position(|o| o.to_lowercase().contains(&needle))
}

/// Radio group: a missing answer on a two-option group becomes "Yes";
/// otherwise the first option containing the answer. No match, no click.
pub fn choose_radio(options: &[String], answer: &str) -> Option<Selection> {
    let answer = if is_not_available(answer) && options.len() == 2 {
        "Yes"
    } else {
        answer
    };
    if is_not_available(answer) {
        return None;
    }
    position_containing(options, answer).map(|i| Selection::new(options, i, SelectionReason::Matched))
}

/// Native dropdown: match, then "Yes" on a two-option list, then the second
/// option whenever more than one exists. Index 0 is assumed to be a
/// placeholder such as "Select an option".
pub fn choose_dropdown(options: &[String], answer: &str) -> Option<Selection> {
    if !is_not_available(answer) {
        if let Some(i) = position_containing(options, answer) {
            return Some(Selection::new(options, i, SelectionReason::Matched));
        }
    }
    if options.len() == 2 {
        if let Some(i) = position_containing(options, "yes") {
            return Some(Selection::new(options, i, SelectionReason::YesDefault));
        }
    }
    if options.len() > 1 {
        return Some(Selection::new(options, 1, SelectionReason::SecondOption));
    }
    None
}

/// Custom listbox dropdown: match, then any "Yes" option.
pub fn choose_custom_dropdown(options: &[String], answer: &str) -> Option<Selection> {
    if !is_not_available(answer) {
        if let Some(i) = position_containing(options, answer) {
            return Some(Selection::new(options, i, SelectionReason::Matched));
        }
    }
    position_containing(options, "yes").map(|i| Selection::new(options, i, SelectionReason::YesDefault))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_radio_two_options_na_defaults_to_yes() {
        let selection = choose_radio(&opts(&["No", "Yes"]), "N/A").unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.text, "Yes");
    }

    #[test]
    fn test_radio_blank_answer_with_three_options_is_skipped() {
        assert_eq!(choose_radio(&opts(&["Low", "Medium", "High"]), "  "), None);
    }

    #[test]
    fn test_radio_matches_substring_case_insensitive() {
        let selection = choose_radio(&opts(&["Native", "Professional", "Basic"]), "professional").unwrap();
        assert_eq!(selection.index, 1);
    }

    #[test]
    fn test_radio_no_match_leaves_unselected() {
        assert_eq!(choose_radio(&opts(&["Yes", "No"]), "Maybe"), None);
    }

    #[test]
    fn test_dropdown_match_first() {
        let options = opts(&["Select an option", "Yes", "No"]);
        assert_eq!(choose_dropdown(&options, "No").unwrap().index, 2);
    }

    #[test]
    fn test_dropdown_two_options_prefers_yes() {
        let options = opts(&["No", "Yes"]);
        let selection = choose_dropdown(&options, "I have 5 years").unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.reason, SelectionReason::YesDefault);
    }

    #[test]
    fn test_dropdown_falls_back_to_second_option() {
        let options = opts(&["Select an option", "Bachelor's", "Master's"]);
        let selection = choose_dropdown(&options, "N/A").unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.reason, SelectionReason::SecondOption);
    }

    #[test]
    fn test_dropdown_single_option_unmatched() {
        assert_eq!(choose_dropdown(&opts(&["Select an option"]), "Yes"), None);
    }

    #[test]
    fn test_custom_dropdown_falls_back_to_yes() {
        let options = opts(&["Select", "No", "Yes, I can"]);
        let selection = choose_custom_dropdown(&options, "Definitely").unwrap();
        assert_eq!(selection.index, 2);
        assert_eq!(selection.reason, SelectionReason::YesDefault);
        assert_eq!(choose_custom_dropdown(&opts(&["Red", "Blue"]), "Green"), None);
    }
}
