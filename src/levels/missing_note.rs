//! Missing-note level
//!
//! Plays a full triad, then the interval left when one chord tone is
//! omitted; the player names the omitted position. The interval row knows
//! which slot was cut and which triad it came from, so the turn needs two
//! joined draws, and both must succeed or the turn fails.

use std::sync::Arc;

use crate::content::ContentItem;
use crate::error::{Result, SolfaError};
use crate::input::{Button, ButtonAction, UserInput};
use crate::levels::{debug_block, LevelCore, LevelId, LevelOps, Scores, Shared};
use crate::phrases::{fill, fill_pair, ordinal, LevelPhrases, PhraseBook};
use crate::reply::{Fragment, Reply};

#[derive(Debug, Clone)]
struct MissingNoteSecret {
    /// The gapped interval; carries the missing slot index.
    interval: Arc<ContentItem>,
    /// The originating full triad.
    chord: Arc<ContentItem>,
}

#[derive(Default)]
pub struct MissingNoteLevel {
    core: LevelCore,
    secret: Option<MissingNoteSecret>,
}

impl MissingNoteLevel {
    pub fn new() -> Self {
        Self::default()
    }

    fn what_pair(phrases: &LevelPhrases, secret: &MissingNoteSecret) -> (String, String) {
        let quality = if secret.chord.is_chord_major() {
            "major"
        } else {
            "minor"
        };
        let inversion = secret.chord.inversion().label();
        let base = phrases.whats.0.first().cloned().unwrap_or_default();
        (
            fill(
                &base.text,
                &[
                    ("quality", quality),
                    ("inversion", inversion),
                    ("name", secret.interval.name()),
                ],
            ),
            fill(
                base.speech(),
                &[
                    ("quality", quality),
                    ("inversion", inversion),
                    ("name", secret.interval.speech_name()),
                ],
            ),
        )
    }

    fn debug_lines(secret: &MissingNoteSecret, answer: Option<i64>) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(a) = answer {
            lines.push(format!("Answer: {a}"));
        }
        lines.push(format!(
            "Chord: {}, {}, {}, {}",
            secret.chord.file_key(),
            secret.chord.id(),
            if secret.chord.is_chord_major() {
                "maj"
            } else {
                "min"
            },
            secret.chord
        ));
        lines.push(format!(
            "Interval: {}, {}, {}, missing slot: {}",
            secret.interval.file_key(),
            secret.interval.id(),
            secret.interval,
            secret.interval.missing_note().map_or(0, |i| i + 1)
        ));
        lines
    }
}

impl LevelOps for MissingNoteLevel {
    fn id(&self) -> LevelId {
        LevelId::MissingNote
    }

    fn phrases<'a>(&self, book: &'a PhraseBook) -> &'a LevelPhrases {
        &book.missing_note
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
            let interval = sh.draw("ascending gapped interval", |i| {
                i.is_interval()
                    && i.is_ascending()
                    && !i.is_simultaneous()
                    && i.missing_note().is_some()
                    && !i.name().is_empty()
            })?;

            let base_chord = interval.base_chord().to_string();
            let chord = sh.draw("base chord of the drawn interval", move |i| {
                i.is_triad() && !i.is_simultaneous() && i.id() == base_chord
            })?;

            self.secret = Some(MissingNoteSecret { interval, chord });
        }
        let Some(secret) = self.secret.clone() else {
            return Ok(None);
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);

        let intro = self.core.intro(phrases, &mut sh.rng);
        let task = phrases.tasks.pick(&mut sh.rng);
        let question = phrases.questions.pick(&mut sh.rng);
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
                Fragment::audio_for(&secret.chord),
                Fragment::audio_for(&secret.interval),
                Fragment::text(question.1),
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
            .ok_or(SolfaError::NoSecret { level: "missing note" })?;

        let Some(answer) = input.answer_number() else {
            return Ok(Some(sh.dont_understand()));
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);
        let missing = secret.interval.missing_note().map_or(-1, |i| i as i64);
        let what = Self::what_pair(phrases, &secret);

        let feedback = if answer - 1 == missing {
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
                &[("pos", ordinal((missing + 1) as usize))],
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
}
