//! Cadence level
//!
//! Builds a three-chord cadence (tonic, subdominant, dominant of one random
//! tonality, all simultaneous voicings), shuffles the presentation order,
//! and independently designates one ordinal to ask about. The designated
//! chord is played arpeggiated and as a chord before the full cadence, so
//! the asked position is decoupled from the presentation order by
//! construction.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::content::ContentItem;
use crate::error::{Result, SolfaError};
use crate::input::{Button, ButtonAction, UserInput};
use crate::levels::{debug_block, LevelCore, LevelId, LevelOps, Scores, Shared};
use crate::phrases::{fill, fill_pair, LevelPhrases, PhraseBook};
use crate::reply::{Fragment, Reply};

#[derive(Debug, Clone)]
struct CadenceSecret {
    /// Presentation order after the shuffle.
    chords: Vec<Arc<ContentItem>>,
    /// 0-based ordinal of the chord the player must locate.
    asked: usize,
}

#[derive(Default)]
pub struct CadenceLevel {
    core: LevelCore,
    secret: Option<CadenceSecret>,
}

impl CadenceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    fn what_pair(phrases: &LevelPhrases, chord: &ContentItem) -> (String, String) {
        if chord.name().is_empty() {
            return (String::new(), String::new());
        }
        let base = phrases.whats.0.first().cloned().unwrap_or_default();
        (
            fill(&base.text, &[("name", chord.name())]),
            fill(base.speech(), &[("name", chord.speech_name())]),
        )
    }

    fn debug_lines(secret: &CadenceSecret, answer: Option<i64>) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(a) = answer {
            lines.push(format!("Answer: {a}"));
        } else {
            for (i, chord) in secret.chords.iter().enumerate() {
                lines.push(format!(
                    "{}. {}, {}, {}",
                    i + 1,
                    chord.file_key(),
                    chord.id(),
                    chord.name()
                ));
            }
        }
        let asked = &secret.chords[secret.asked];
        lines.push(format!(
            "Designated: {}. {}, {}",
            secret.asked + 1,
            asked.id(),
            asked.name()
        ));
        lines
    }
}

impl LevelOps for CadenceLevel {
    fn id(&self) -> LevelId {
        LevelId::Cadence
    }

    fn phrases<'a>(&self, book: &'a PhraseBook) -> &'a LevelPhrases {
        &book.cadence
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
            let major = sh.coin();
            let tonality = if major { "major" } else { "minor" };

            let tonic = sh.draw(&format!("{tonality} tonic chord"), |i| {
                i.is_tonic() && i.is_tonality_major() == major && i.is_simultaneous()
            })?;
            let subdominant = sh.draw(&format!("{tonality} subdominant chord"), |i| {
                i.is_subdominant() && i.is_tonality_major() == major && i.is_simultaneous()
            })?;
            let dominant = sh.draw(&format!("{tonality} dominant chord"), |i| {
                i.is_dominant() && i.is_tonality_major() == major && i.is_simultaneous()
            })?;

            let mut chords = vec![tonic, subdominant, dominant];
            chords.shuffle(&mut sh.rng);
            let asked = sh.rng.gen_range(0..chords.len());
            self.secret = Some(CadenceSecret { chords, asked });
        }
        let Some(secret) = self.secret.clone() else {
            return Ok(None);
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);

        let intro = self.core.intro(phrases, &mut sh.rng);
        let task = phrases.tasks.pick(&mut sh.rng);
        let task_extra = phrases.tasks_extra.pick(&mut sh.rng);
        let question = phrases.questions.pick(&mut sh.rng);
        let debug = debug_block(sh.debug, Self::debug_lines(&secret, None));

        let designated = &secret.chords[secret.asked];
        let mut speech = vec![
            Fragment::text(intro.1),
            Fragment::text(task.1),
            Fragment::Audio(designated.file_key_arpeggio()),
            Fragment::Audio(designated.file_key()),
            Fragment::text(task_extra.1),
        ];
        speech.extend(secret.chords.iter().map(Fragment::audio_for));
        speech.push(Fragment::text(question.1));

        Ok(Some(sh.reply(
            &[
                Fragment::text(intro.0),
                Fragment::text(task.0),
                Fragment::text(task_extra.0),
                Fragment::text(question.0),
                debug,
            ],
            &speech,
        )))
    }

    fn process_answer(&mut self, sh: &mut Shared, input: &UserInput) -> Result<Option<Reply>> {
        if self.finished() {
            return Ok(None);
        }

        let secret = self
            .secret
            .clone()
            .ok_or(SolfaError::NoSecret { level: "cadence" })?;

        let Some(answer) = input.answer_number() else {
            return Ok(Some(sh.dont_understand()));
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);
        let designated = &secret.chords[secret.asked];
        let what = Self::what_pair(phrases, designated);

        let feedback = if answer == secret.asked as i64 + 1 {
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
                &[("pos", &(secret.asked + 1).to_string())],
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
