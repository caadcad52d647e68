//! Tonic-location level
//!
//! Plays a triad note by note; the player says where the tonic sits in the
//! voicing. Answers arrive as keywords ("at the bottom") or as button
//! payloads carrying the position ordinal.

use std::sync::Arc;

use crate::content::{ContentItem, TonicPosition};
use crate::error::{Result, SolfaError};
use crate::input::{cmd_matches, Button, ButtonAction, UserInput};
use crate::levels::{debug_block, LevelCore, LevelId, LevelOps, Scores, Shared};
use crate::phrases::{fill_pair, LevelPhrases, PhraseBook};
use crate::reply::{Fragment, Reply};

#[derive(Default)]
pub struct TonicLocationLevel {
    core: LevelCore,
    secret: Option<Arc<ContentItem>>,
}

impl TonicLocationLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the player's position claim. Keywords are guarded against
    /// negations; an unparseable command is "not understood", not wrong.
    fn parse_answer(input: &UserInput) -> Option<TonicPosition> {
        match input {
            UserInput::Button(ButtonAction::Answer(value)) => {
                Some(TonicPosition::from_ordinal(*value))
            }
            UserInput::Button(_) => None,
            UserInput::Command { text, .. } => {
                const NEG: &[&str] = &["no", "not"];
                if cmd_matches(text, &["bottom", "low", "lowest", "down"], NEG) {
                    Some(TonicPosition::Bottom)
                } else if cmd_matches(text, &["middle", "mid", "center"], NEG) {
                    Some(TonicPosition::Middle)
                } else if cmd_matches(text, &["top", "high", "highest", "up"], NEG) {
                    Some(TonicPosition::Top)
                } else {
                    None
                }
            }
        }
    }

    fn debug_lines(item: &ContentItem, answer: Option<TonicPosition>) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(a) = answer {
            lines.push(format!("Answer: {a:?}"));
        }
        lines.push(format!(
            "Posed: {}, {}, {}, {:?}",
            item.file_key(),
            item.id(),
            item,
            item.tonic_position()
        ));
        lines
    }
}

impl LevelOps for TonicLocationLevel {
    fn id(&self) -> LevelId {
        LevelId::TonicLocation
    }

    fn phrases<'a>(&self, book: &'a PhraseBook) -> &'a LevelPhrases {
        &book.tonic_location
    }

    fn scores(&self) -> Scores {
        self.core.scores
    }

    fn reset(&mut self) {
        self.core.reset();
        self.secret = None;
    }

    fn get_reply(&mut self, sh: &mut Shared) -> Result<Option<Reply>> {
        if self.finished() {
            return Ok(None);
        }

        if self.secret.is_none() {
            let item = sh.draw("melodic triad with a known tonic position", |i| {
                i.is_triad()
                    && !i.is_simultaneous()
                    && i.tonic_position() != TonicPosition::Unknown
            })?;
            self.secret = Some(item);
        }
        let Some(item) = self.secret.clone() else {
            return Ok(None);
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);

        let intro = self.core.intro(phrases, &mut sh.rng);
        let task = phrases.tasks.pick(&mut sh.rng);
        let question = phrases.questions.pick(&mut sh.rng);
        let debug = debug_block(sh.debug, Self::debug_lines(&item, None));

        Ok(Some(sh.reply(
            &[
                Fragment::text(intro.0),
                Fragment::text(task.0),
                Fragment::text(question.0),
                debug,
            ],
            &[
                Fragment::text(intro.1),
                Fragment::text(task.1),
                Fragment::audio_for(&item),
                Fragment::text(question.1),
            ],
        )))
    }

    fn process_answer(&mut self, sh: &mut Shared, input: &UserInput) -> Result<Option<Reply>> {
        if self.finished() {
            return Ok(None);
        }

        let item = self
            .secret
            .clone()
            .ok_or(SolfaError::NoSecret { level: "tonic location" })?;

        let Some(answer) = Self::parse_answer(input) else {
            return Ok(Some(sh.dont_understand()));
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);

        let feedback = if answer == item.tonic_position() {
            self.core.scores.correct += 1;
            let right = book.root.rights.pick(&mut sh.rng);
            (vec![Fragment::text(right.0)], vec![Fragment::text(right.1)])
        } else {
            self.core.scores.incorrect += 1;
            let wrong = book.root.wrongs.pick(&mut sh.rng);
            let reveal = fill_pair(
                phrases.answers.pick(&mut sh.rng),
                &[("location", item.tonic_position().label())],
            );
            (
                vec![Fragment::text(wrong.0), Fragment::text(reveal.0)],
                vec![Fragment::text(wrong.1), Fragment::text(reveal.1)],
            )
        };

        self.secret = None;

        let cont = if self.finished() {
            (String::new(), String::new())
        } else {
            phrases.continues.pick(&mut sh.rng)
        };

        let next = self.get_reply(sh)?.unwrap_or_default();
        let debug = debug_block(sh.debug, Self::debug_lines(&item, Some(answer)));

        Ok(Some(sh.reply(
            &[
                Fragment::Group(feedback.0),
                Fragment::text(cont.0),
                debug,
                Fragment::text("\n"),
                Fragment::text(next.display),
            ],
            &[
                Fragment::Group(feedback.1),
                Fragment::text(cont.1),
                Fragment::text(next.speech),
            ],
        )))
    }

    fn buttons(&self, book: &PhraseBook) -> Vec<Button> {
        if self.finished() {
            return Vec::new();
        }
        self.phrases(book)
            .buttons
            .iter()
            .enumerate()
            .map(|(i, title)| Button::new(title.clone(), ButtonAction::Answer(i as i64)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::testutil::test_shared;

    #[test]
    fn keyword_answers_parse_with_negation_guard() {
        let p = |s: &str| TonicLocationLevel::parse_answer(&UserInput::command(s));
        assert_eq!(p("at the bottom"), Some(TonicPosition::Bottom));
        assert_eq!(p("in the MIDDLE"), Some(TonicPosition::Middle));
        assert_eq!(p("up top"), Some(TonicPosition::Top));
        assert_eq!(p("the bottom note"), Some(TonicPosition::Bottom));
        assert_eq!(p("not the bottom"), None);
        assert_eq!(p("hmm"), None);
    }

    #[test]
    fn button_ordinals_map_to_positions() {
        let p = |v: i64| TonicLocationLevel::parse_answer(&UserInput::button(ButtonAction::Answer(v)));
        assert_eq!(p(0), Some(TonicPosition::Bottom));
        assert_eq!(p(2), Some(TonicPosition::Top));
        assert_eq!(p(7), Some(TonicPosition::Unknown));
    }

    #[test]
    fn correct_keyword_scores() {
        let mut sh = test_shared(13);
        let mut level = TonicLocationLevel::new();
        level.get_reply(&mut sh).unwrap().unwrap();

        let pos = level.secret.as_ref().unwrap().tonic_position();
        let word = match pos {
            TonicPosition::Bottom => "bottom",
            TonicPosition::Middle => "middle",
            _ => "top",
        };
        level
            .process_answer(&mut sh, &UserInput::command(word))
            .unwrap()
            .unwrap();
        assert_eq!(level.scores().correct, 1);
    }

    #[test]
    fn unknown_position_never_matches_a_wrong_button() {
        let mut sh = test_shared(13);
        let mut level = TonicLocationLevel::new();
        level.get_reply(&mut sh).unwrap().unwrap();

        // An out-of-range payload is a recognized but wrong answer.
        level
            .process_answer(&mut sh, &UserInput::button(ButtonAction::Answer(9)))
            .unwrap()
            .unwrap();
        assert_eq!(level.scores().incorrect, 1);
    }
}
