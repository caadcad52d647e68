//! Phrase book
//!
//! All user-visible wording lives here as lists of variants chosen at
//! random per emission. Each phrase has a display text and an optional
//! speech override. A built-in English book is the default; a JSON file
//! with the same shape can replace it.

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::{Result, SolfaError};

/// A display/speech phrase pair. The speech side falls back to the text.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Phrase {
    pub text: String,
    #[serde(default)]
    pub speech: Option<String>,
}

impl Phrase {
    pub fn t(text: &str) -> Self {
        Self {
            text: text.to_string(),
            speech: None,
        }
    }

    pub fn ts(text: &str, speech: &str) -> Self {
        Self {
            text: text.to_string(),
            speech: Some(speech.to_string()),
        }
    }

    pub fn speech(&self) -> &str {
        match &self.speech {
            Some(s) if !s.is_empty() => s,
            _ => &self.text,
        }
    }

    pub fn pair(&self) -> (String, String) {
        (self.text.clone(), self.speech().to_string())
    }
}

/// A list of phrase variants; emission picks one at random.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(transparent)]
pub struct PhraseSet(pub Vec<Phrase>);

impl PhraseSet {
    pub fn of(texts: &[&str]) -> Self {
        Self(texts.iter().map(|t| Phrase::t(t)).collect())
    }

    pub fn pick<R: Rng>(&self, rng: &mut R) -> (String, String) {
        match self.0.choose(rng) {
            Some(p) => p.pair(),
            None => (String::new(), String::new()),
        }
    }
}

/// Minimal `{key}` placeholder substitution.
pub fn fill(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in args {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Substitute the same arguments into both channels of a pair.
pub fn fill_pair(pair: (String, String), args: &[(&str, &str)]) -> (String, String) {
    (fill(&pair.0, args), fill(&pair.1, args))
}

/// English ordinal word for small answer positions (1-based).
pub fn ordinal(position: usize) -> &'static str {
    match position {
        1 => "first",
        2 => "second",
        3 => "third",
        _ => "last",
    }
}

pub fn plural<'a>(count: u32, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Cross-cutting phrases not tied to any level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RootPhrases {
    pub dont_understand: Phrase,
    pub something_went_wrong: Phrase,
    pub rights: PhraseSet,
    pub wrongs: PhraseSet,
    pub level_complete: Phrase,
    pub exam_complete: Phrase,
    pub no_score: Phrase,
    pub level_not_scored: Phrase,
    pub no_way_back: Phrase,
    pub repeat_button: String,
    pub back_button: String,
    pub help_button: String,
}

impl Default for RootPhrases {
    fn default() -> Self {
        Self {
            dont_understand: Phrase::t("I didn't catch that, please say it again."),
            something_went_wrong: Phrase::t("Oops, something went wrong..."),
            rights: PhraseSet::of(&["Right!", "Correct!", "Well done!"]),
            wrongs: PhraseSet::of(&["Wrong.", "Not this time.", "No, that's not it."]),
            level_complete: Phrase::t("Level complete!"),
            exam_complete: Phrase::t("The exam is over!"),
            no_score: Phrase::t("No score yet. Take the exam to earn one."),
            level_not_scored: Phrase::t("Demo and training rounds are not scored."),
            no_way_back: Phrase::t("This is the main menu, there is no way back from here."),
            repeat_button: "Repeat".to_string(),
            back_button: "Back".to_string(),
            help_button: "Rules".to_string(),
        }
    }
}

/// Main-menu phrases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MenuPhrases {
    /// Long first-contact greeting; the speech channel is followed by a
    /// showcase audio cue.
    pub greeting: Phrase,
    /// Short menu prompts for returning visits.
    pub options: PhraseSet,
    /// Training sub-menu, templated with the three level names.
    pub train_menu: Phrase,
    pub train_button: String,
    pub rules: Phrase,
}

impl Default for MenuPhrases {
    fn default() -> Self {
        Self {
            greeting: Phrase::t(
                "Welcome to the ear trainer! I play intervals and chords, \
                 and you learn to tell them apart. Here is how we will sound:",
            ),
            options: PhraseSet::of(&[
                "What shall we do: a demo, a training, or the exam?",
                "Your call: demo, training, or exam?",
            ]),
            train_menu: Phrase::t(
                "Choose a training: 1 \u{2014} {missing_note}, 2 \u{2014} {tonic_location}, \
                 3 \u{2014} {cadence}.",
            ),
            train_button: "Training".to_string(),
            rules: Phrase::t(
                "The rules are simple. Pick an activity from the menu. Trainings drill one \
                 skill at a time and are not scored; the exam strings all three together, \
                 nine questions each, and keeps your score. Say \"back\" to return.",
            ),
        }
    }
}

/// Per-level phrases.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LevelPhrases {
    pub name: Phrase,
    /// Played once per level reset, long form.
    pub intro_long: PhraseSet,
    /// Played when re-entering a level that was reset but not yet started.
    pub intro_short: PhraseSet,
    pub tasks: PhraseSet,
    /// Second task line; used by levels that present in two steps.
    pub tasks_extra: PhraseSet,
    pub questions: PhraseSet,
    /// Correct-answer reveal, templated per level.
    pub answers: PhraseSet,
    /// "What you heard" reveal, templated per level.
    pub whats: PhraseSet,
    pub continues: PhraseSet,
    /// Answer button titles, in payload order.
    pub buttons: Vec<String>,
}

/// The complete phrase book.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PhraseBook {
    pub root: RootPhrases,
    pub menu: MenuPhrases,
    pub demo: LevelPhrases,
    pub missing_note: LevelPhrases,
    pub tonic_location: LevelPhrases,
    pub cadence: LevelPhrases,
    pub exam: LevelPhrases,
}

impl PhraseBook {
    /// The built-in English book.
    pub fn builtin() -> Self {
        Self {
            root: RootPhrases::default(),
            menu: MenuPhrases::default(),
            demo: LevelPhrases {
                name: Phrase::t("Demo"),
                intro_long: PhraseSet::of(&[
                    "This is the demo. I play two notes in a row; you tell me which one \
                     answers my question. No score here, just your ears warming up.",
                ]),
                intro_short: PhraseSet::of(&["The demo again. Listen closely."]),
                tasks: PhraseSet::of(&["Here are two notes."]),
                questions: PhraseSet::of(&[
                    "Which note is {cmp}: the first or the second?",
                ]),
                answers: PhraseSet::of(&["The {pos} note was the correct answer."]),
                whats: PhraseSet::of(&["It was {dir} {name}."]),
                continues: PhraseSet::of(&["Let's continue.", "Next one!"]),
                buttons: vec!["First".to_string(), "Second".to_string()],
                ..Default::default()
            },
            missing_note: LevelPhrases {
                name: Phrase::t("Missing note"),
                intro_long: PhraseSet::of(&[
                    "Missing note. I play a full chord, then the same chord with one \
                     note left out. Find the gap.",
                ]),
                intro_short: PhraseSet::of(&["Missing note again. Ready?"]),
                tasks: PhraseSet::of(&["A chord, and then the same chord missing one note."]),
                questions: PhraseSet::of(&[
                    "Which note did I leave out: the first, the second, or the third?",
                ]),
                answers: PhraseSet::of(&["The {pos} note was missing."]),
                whats: PhraseSet::of(&[
                    "It was a {quality} triad in {inversion}, and what remained was {name}.",
                ]),
                continues: PhraseSet::of(&["Let's keep going.", "Another one."]),
                buttons: vec![
                    "First".to_string(),
                    "Second".to_string(),
                    "Third".to_string(),
                ],
                ..Default::default()
            },
            tonic_location: LevelPhrases {
                name: Phrase::t("Tonic location"),
                intro_long: PhraseSet::of(&[
                    "Tonic location. I play a chord note by note; you find where its \
                     tonic sits in the voicing.",
                ]),
                intro_short: PhraseSet::of(&["Tonic location again."]),
                tasks: PhraseSet::of(&["Here is the chord."]),
                questions: PhraseSet::of(&[
                    "Where is the tonic: at the bottom, in the middle, or at the top?",
                ]),
                answers: PhraseSet::of(&["{location}."]),
                continues: PhraseSet::of(&["Moving on.", "Next chord."]),
                buttons: vec![
                    "Bottom".to_string(),
                    "Middle".to_string(),
                    "Top".to_string(),
                ],
                ..Default::default()
            },
            cadence: LevelPhrases {
                name: Phrase::t("Cadence"),
                intro_long: PhraseSet::of(&[
                    "Cadence. I play three chords that make a cadence, and one chord to \
                     find among them.",
                ]),
                intro_short: PhraseSet::of(&["The cadence task again."]),
                tasks: PhraseSet::of(&[
                    "Listen to the chord you must find, note by note, and then in full.",
                ]),
                tasks_extra: PhraseSet::of(&["Now the whole cadence:"]),
                questions: PhraseSet::of(&[
                    "Where in the cadence was that chord: first, second, or third?",
                ]),
                answers: PhraseSet::of(&["It was chord number {pos}."]),
                whats: PhraseSet::of(&["The chord was {name}."]),
                continues: PhraseSet::of(&["On we go.", "Try the next one."]),
                buttons: vec![
                    "First".to_string(),
                    "Second".to_string(),
                    "Third".to_string(),
                ],
                ..Default::default()
            },
            exam: LevelPhrases {
                name: Phrase::t("Exam"),
                intro_long: PhraseSet::of(&[
                    "Exam time! Three sections in a row: missing note, tonic location, \
                     and cadence. Nine questions each, and I keep the score.",
                ]),
                intro_short: PhraseSet::of(&["Back to the exam."]),
                ..Default::default()
            },
        }
    }

    /// Load a phrase book from a JSON file. Missing sections fall back to
    /// empty, not to the built-in texts; partial overrides should start from
    /// a dump of the built-in book.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SolfaError::DataLoad {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn fill_replaces_all_occurrences() {
        assert_eq!(
            fill("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]),
            "x and y and x"
        );
    }

    #[test]
    fn empty_set_picks_empty_pair() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(PhraseSet::default().pick(&mut rng), (String::new(), String::new()));
    }

    #[test]
    fn speech_falls_back_to_text() {
        let p = Phrase::t("hello");
        assert_eq!(p.speech(), "hello");
        let p = Phrase::ts("hello", "h+ello");
        assert_eq!(p.speech(), "h+ello");
    }

    #[test]
    fn builtin_book_has_level_buttons() {
        let book = PhraseBook::builtin();
        assert_eq!(book.demo.buttons.len(), 2);
        assert_eq!(book.missing_note.buttons.len(), 3);
        assert_eq!(book.tonic_location.buttons.len(), 3);
        assert_eq!(book.cadence.buttons.len(), 3);
    }

    #[test]
    fn book_loads_from_json() {
        let json = r#"{
            "root": { "dont_understand": { "text": "what?" } },
            "demo": { "name": { "text": "Demo", "speech": "D+emo" } }
        }"#;
        let book: PhraseBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.root.dont_understand.text, "what?");
        assert_eq!(book.demo.name.speech(), "D+emo");
    }
}
