//! Demo level: compare two notes
//!
//! Plays a melodic two-note interval and asks which note is higher (or
//! lower, per a coin flip held as part of the secret). Not scored towards
//! the exam, but counts its own nine tasks like every level.

use std::sync::Arc;

use crate::content::ContentItem;
use crate::error::{Result, SolfaError};
use crate::input::{Button, ButtonAction, UserInput};
use crate::levels::{debug_block, LevelCore, LevelId, LevelOps, Scores, Shared};
use crate::phrases::{fill, fill_pair, ordinal, LevelPhrases, PhraseBook};
use crate::reply::{Fragment, Reply};

#[derive(Debug, Clone)]
struct DemoSecret {
    item: Arc<ContentItem>,
    /// Asked for the higher note (true) or the lower one.
    higher: bool,
}

#[derive(Default)]
pub struct DemoLevel {
    core: LevelCore,
    secret: Option<DemoSecret>,
}

impl DemoLevel {
    pub fn new() -> Self {
        Self::default()
    }

    fn comparator_word(higher: bool) -> &'static str {
        if higher {
            "higher"
        } else {
            "lower"
        }
    }

    /// 1-based position of the note that satisfies the comparator.
    fn correct_position(secret: &DemoSecret) -> usize {
        if secret.higher == secret.item.is_ascending() {
            2
        } else {
            1
        }
    }

    /// "What you heard" reveal, templated with direction and interval name.
    fn what_pair(phrases: &LevelPhrases, item: &ContentItem) -> (String, String) {
        if item.name().is_empty() {
            return (String::new(), String::new());
        }
        let dir = if item.is_ascending() {
            "an ascending"
        } else {
            "a descending"
        };
        let base = phrases.whats.0.first().cloned().unwrap_or_default();
        (
            fill(&base.text, &[("dir", dir), ("name", item.name())]),
            fill(base.speech(), &[("dir", dir), ("name", item.speech_name())]),
        )
    }

    fn debug_lines(secret: &DemoSecret, answer: Option<i64>) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(a) = answer {
            lines.push(format!("Answer: {a}"));
        }
        lines.push(format!(
            "Interval: {}, {}, {}",
            secret.item.file_key(),
            secret.item.id(),
            secret.item
        ));
        lines.push(format!("Asked: {}", Self::comparator_word(secret.higher)));
        lines
    }
}

impl LevelOps for DemoLevel {
    fn id(&self) -> LevelId {
        LevelId::Demo
    }

    fn phrases<'a>(&self, book: &'a PhraseBook) -> &'a LevelPhrases {
        &book.demo
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
            let item = sh.draw("melodic interval for the demo", |i| {
                i.is_interval() && !i.is_simultaneous()
            })?;
            let higher = sh.coin();
            self.secret = Some(DemoSecret { item, higher });
        }
        let Some(secret) = self.secret.clone() else {
            return Ok(None);
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);
        let cmp = Self::comparator_word(secret.higher);

        let intro = self.core.intro(phrases, &mut sh.rng);
        let task = phrases.tasks.pick(&mut sh.rng);
        let question = fill_pair(phrases.questions.pick(&mut sh.rng), &[("cmp", cmp)]);
        let debug = debug_block(sh.debug, Self::debug_lines(&secret, None));

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
                Fragment::text(question.1),
                Fragment::audio_for(&secret.item),
            ],
        )))
    }

    fn process_answer(&mut self, sh: &mut Shared, input: &UserInput) -> Result<Option<Reply>> {
        if self.finished() {
            return Ok(None);
        }

        let secret = self
            .secret
            .clone()
            .ok_or(SolfaError::NoSecret { level: "demo" })?;

        let Some(answer) = input.answer_number() else {
            return Ok(Some(sh.dont_understand()));
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);
        let correct_pos = Self::correct_position(&secret);
        let what = Self::what_pair(phrases, &secret.item);

        let feedback = if answer == correct_pos as i64 {
            self.core.scores.correct += 1;
            let right = book.root.rights.pick(&mut sh.rng);
            (
                vec![Fragment::text(right.0), Fragment::text(what.0)],
                vec![Fragment::text(right.1), Fragment::text(what.1)],
            )
        } else {
            self.core.scores.incorrect += 1;
            let wrong = book.root.wrongs.pick(&mut sh.rng);
            let reveal = fill_pair(
                phrases.answers.pick(&mut sh.rng),
                &[("pos", ordinal(correct_pos))],
            );
            (
                vec![
                    Fragment::text(wrong.0),
                    Fragment::text(reveal.0),
                    Fragment::text(what.0),
                ],
                vec![
                    Fragment::text(wrong.1),
                    Fragment::text(reveal.1),
                    Fragment::text(what.1),
                ],
            )
        };

        self.secret = None;

        let cont = if self.finished() {
            (String::new(), String::new())
        } else {
            phrases.continues.pick(&mut sh.rng)
        };

        let next = self.get_reply(sh)?.unwrap_or_default();
        let debug = debug_block(sh.debug, Self::debug_lines(&secret, Some(answer)));

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
            .map(|(i, title)| Button::new(title.clone(), ButtonAction::Answer(i as i64 + 1)))
            .collect()
    }

    /// The demo is not scored.
    fn stats_reply(&self, _book: &PhraseBook) -> Option<Reply> {
        None
    }
}
