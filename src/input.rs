//! Normalized turn input
//!
//! The hosting adapter translates platform intents/NLU into [`UserInput`]:
//! either a free-text command (with any number mentions already extracted)
//! or a structured button press. Keyword matching is prefix-based per word,
//! with an exact-word exclusion list guarding against negations.

use crate::engine::Mode;
use crate::levels::LevelId;

/// Structured payload of a suggestion button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// An answer value for the active level.
    Answer(i64),
    SetMode(Mode),
    SetLevel(LevelId),
    Repeat,
    Help,
    Back,
}

/// A suggestion button rendered alongside a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub title: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn new(title: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            title: title.into(),
            action,
        }
    }
}

/// Adapter-normalized input for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Command {
        text: String,
        /// Number mentions, in utterance order.
        numbers: Vec<i64>,
    },
    Button(ButtonAction),
}

impl UserInput {
    /// Build a command input, extracting number tokens from the text the way
    /// a minimal NLU layer would.
    pub fn command(text: impl Into<String>) -> Self {
        let text = text.into();
        let numbers = text
            .split_whitespace()
            .filter_map(|w| w.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
            .collect();
        Self::Command { text, numbers }
    }

    pub fn button(action: ButtonAction) -> Self {
        Self::Button(action)
    }

    /// The player's answer as a number: the last number mention of a
    /// command, or an answer button's value.
    pub fn answer_number(&self) -> Option<i64> {
        match self {
            UserInput::Command { numbers, .. } => numbers.last().copied(),
            UserInput::Button(ButtonAction::Answer(value)) => Some(*value),
            UserInput::Button(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            UserInput::Command { text, .. } => Some(text),
            UserInput::Button(_) => None,
        }
    }
}

/// Word-prefix command matching: true when no word equals an excluded word
/// and at least one word starts with an included prefix. Exclusion is
/// exact-word, not prefix: "not" must reject "not the bottom" without
/// swallowing "note".
pub fn cmd_matches(command: &str, include: &[&str], exclude: &[&str]) -> bool {
    let words: Vec<String> = command
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    if words.is_empty() {
        return false;
    }

    if exclude
        .iter()
        .any(|ex| words.iter().any(|w| w == &ex.to_lowercase()))
    {
        return false;
    }

    include
        .iter()
        .any(|inc| words.iter().any(|w| w.starts_with(&inc.to_lowercase())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numbers_in_order() {
        let input = UserInput::command("maybe 2, no, 3");
        assert_eq!(input.answer_number(), Some(3));

        let input = UserInput::command("no numbers here");
        assert_eq!(input.answer_number(), None);
    }

    #[test]
    fn button_answer_value() {
        let input = UserInput::button(ButtonAction::Answer(2));
        assert_eq!(input.answer_number(), Some(2));
        let input = UserInput::button(ButtonAction::Repeat);
        assert_eq!(input.answer_number(), None);
    }

    #[test]
    fn prefix_matching_with_negation_guard() {
        assert!(cmd_matches("start the training", &["train"], &["no", "not"]));
        assert!(!cmd_matches("not the training", &["train"], &["no", "not"]));
        assert!(!cmd_matches("", &["train"], &[]));
        assert!(cmd_matches("TRAINING please", &["train"], &[]));
    }

    #[test]
    fn exclusion_is_exact_word_not_prefix() {
        // "note" must not trip the "not" exclusion.
        assert!(cmd_matches("missing note", &["missing"], &["no", "not"]));
        assert!(cmd_matches("the bottom note", &["bottom"], &["no", "not"]));
        assert!(!cmd_matches("no missing note", &["missing"], &["no", "not"]));
        assert!(!cmd_matches("NOT the bottom", &["bottom"], &["no", "not"]));
    }
}
