//! Game levels
//!
//! One level per activity, all behind the [`LevelOps`] capability set. The
//! engine owns the level instances; levels reach shared collaborators (store,
//! sampler, phrase book, audio resolver) through the [`Shared`] context they
//! are handed each call, never through back-references.

pub mod cadence;
pub mod demo;
pub mod exam;
pub mod missing_note;
pub mod tonic_location;

pub use cadence::CadenceLevel;
pub use demo::DemoLevel;
pub use exam::ExamLevel;
pub use missing_note::MissingNoteLevel;
pub use tonic_location::TonicLocationLevel;

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::content::{ContentItem, ContentStore, Sampler};
use crate::error::{Result, SolfaError};
use crate::input::{Button, UserInput};
use crate::phrases::{plural, LevelPhrases, PhraseBook};
use crate::reply::{
    format_display, format_speech, AudioTagResolver, Fragment, Reply,
};

/// Questions per level before it counts as finished.
pub const MAX_TASKS: u32 = 9;

/// Identifies a level variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelId {
    Demo,
    MissingNote,
    TonicLocation,
    Cadence,
    Exam,
}

/// Per-level answer counters. Reset together, never partially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub correct: u32,
    pub incorrect: u32,
}

impl Scores {
    pub fn total(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn started(&self) -> bool {
        self.total() > 0
    }

    pub fn finished(&self) -> bool {
        self.total() >= MAX_TASKS
    }
}

/// Shared collaborators handed to every level call. Owned by the engine and
/// mutated only under the per-session lock.
pub struct Shared {
    pub store: Arc<ContentStore>,
    pub phrases: Arc<PhraseBook>,
    pub resolver: Arc<dyn AudioTagResolver>,
    pub sampler: Sampler,
    pub rng: SmallRng,
    pub debug: bool,
}

impl Shared {
    pub fn new(
        store: Arc<ContentStore>,
        phrases: Arc<PhraseBook>,
        resolver: Arc<dyn AudioTagResolver>,
    ) -> Self {
        Self {
            store,
            phrases,
            resolver,
            sampler: Sampler::new(),
            rng: SmallRng::from_entropy(),
            debug: false,
        }
    }

    /// Deterministic variant for tests.
    pub fn with_seed(
        store: Arc<ContentStore>,
        phrases: Arc<PhraseBook>,
        resolver: Arc<dyn AudioTagResolver>,
        seed: u64,
    ) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            ..Self::new(store, phrases, resolver)
        }
    }

    /// Draw an unseen item; `None` from the sampler is a data-integrity gap
    /// and surfaces as [`SolfaError::ContentUnavailable`].
    pub fn draw<P>(&mut self, what: &str, predicate: P) -> Result<Arc<ContentItem>>
    where
        P: Fn(&ContentItem) -> bool,
    {
        self.try_draw(predicate)
            .ok_or_else(|| SolfaError::ContentUnavailable {
                what: what.to_string(),
            })
    }

    pub fn try_draw<P>(&mut self, predicate: P) -> Option<Arc<ContentItem>>
    where
        P: Fn(&ContentItem) -> bool,
    {
        let Shared {
            store,
            sampler,
            rng,
            ..
        } = self;
        sampler.draw(store, rng, predicate)
    }

    pub fn coin(&mut self) -> bool {
        self.rng.gen()
    }

    pub fn display(&self, fragments: &[Fragment]) -> String {
        format_display(fragments)
    }

    pub fn speech(&self, fragments: &[Fragment]) -> String {
        format_speech(fragments, self.resolver.as_ref())
    }

    pub fn reply(&self, display: &[Fragment], speech: &[Fragment]) -> Reply {
        Reply::new(self.display(display), self.speech(speech))
    }

    /// The standard "didn't understand" reply. Never consumes the turn.
    pub fn dont_understand(&self) -> Reply {
        let (text, speech) = self.phrases.root.dont_understand.pair();
        Reply::new(text, speech)
    }
}

/// Scoring and first-run state embedded in every leaf level.
#[derive(Debug, Clone)]
pub(crate) struct LevelCore {
    pub scores: Scores,
    pub first_run: bool,
}

impl Default for LevelCore {
    fn default() -> Self {
        Self {
            scores: Scores::default(),
            first_run: true,
        }
    }
}

impl LevelCore {
    /// Zero the counters and re-arm the first-run intro.
    pub fn reset(&mut self) {
        self.scores = Scores::default();
        self.first_run = true;
    }

    /// Intro line for the next reply: long form exactly once per reset,
    /// short form until the first answer, nothing afterwards.
    pub fn intro(&mut self, phrases: &LevelPhrases, rng: &mut SmallRng) -> (String, String) {
        let first = std::mem::replace(&mut self.first_run, false);
        if first {
            phrases.intro_long.pick(rng)
        } else if !self.scores.started() {
            phrases.intro_short.pick(rng)
        } else {
            (String::new(), String::new())
        }
    }
}

/// Display-only debug block appended to level replies when enabled.
pub(crate) fn debug_block(enabled: bool, lines: Vec<String>) -> Fragment {
    if !enabled {
        return Fragment::none();
    }
    let mut fragments = vec![Fragment::text("\n#DEBUG\n")];
    fragments.extend(lines.into_iter().map(|l| Fragment::text(format!("{l}\n"))));
    Fragment::Group(fragments)
}

/// Capability set common to all level variants.
pub trait LevelOps: Send {
    fn id(&self) -> LevelId;

    /// This level's section of the phrase book.
    fn phrases<'a>(&self, book: &'a PhraseBook) -> &'a LevelPhrases;

    fn scores(&self) -> Scores;

    /// Zero scores, clear the secret, restore the first-run flag.
    fn reset(&mut self);

    /// Pose (or repeat) the current question. Draws a fresh secret when none
    /// is held; an impossible draw is fatal to the turn. `Ok(None)` when the
    /// level is already finished.
    fn get_reply(&mut self, sh: &mut Shared) -> Result<Option<Reply>>;

    /// Score a submitted answer and chain the next question into the same
    /// reply. Unrecognized input returns the "didn't understand" phrase
    /// without touching score or secret. `Ok(None)` when already finished.
    fn process_answer(&mut self, sh: &mut Shared, input: &UserInput) -> Result<Option<Reply>>;

    /// Answer suggestion buttons for the current question.
    fn buttons(&self, book: &PhraseBook) -> Vec<Button>;

    fn name<'a>(&self, book: &'a PhraseBook) -> &'a str {
        &self.phrases(book).name.text
    }

    fn speech_name<'a>(&self, book: &'a PhraseBook) -> &'a str {
        self.phrases(book).name.speech()
    }

    fn started(&self) -> bool {
        self.scores().started()
    }

    fn finished(&self) -> bool {
        self.scores().finished()
    }

    /// Read-only score summary; `None` for levels that are not scored.
    fn stats_reply(&self, book: &PhraseBook) -> Option<Reply> {
        let scores = self.scores();
        let tail = if scores.incorrect > 0 {
            format!(" and {} incorrectly", scores.incorrect)
        } else {
            String::new()
        };
        let line = |name: &str| {
            format!(
                "In \u{201c}{name}\u{201d} you answered {} {} correctly{tail}.",
                scores.correct,
                plural(scores.correct, "question", "questions"),
            )
        };
        Some(Reply::new(
            line(self.name(book)),
            line(self.speech_name(book)),
        ))
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::content::{Inversion, ItemSpec, Note, TonicPosition};
    use crate::reply::NullResolver;

    pub fn note(s: &str) -> Option<Note> {
        Some(Note::parse(s).unwrap())
    }

    /// A pool covering every level's predicate: melodic intervals (one per
    /// base chord, ascending with a missing slot), their base triads with
    /// known tonic positions, and T/S/D chord voicings in both tonalities.
    pub fn test_store() -> ContentStore {
        let mut items = Vec::new();

        // Base triads (melodic) with tonic positions, joined to intervals.
        for (chord_id, notes, pos, inv, major) in [
            ("c1", ["C4", "E4", "G4"], TonicPosition::Bottom, Inversion::Root, true),
            ("c2", ["E4", "G4", "C5"], TonicPosition::Top, Inversion::First, true),
            ("c3", ["A3", "C4", "E4"], TonicPosition::Bottom, Inversion::Root, false),
        ] {
            items.push(ContentItem::new(ItemSpec {
                id: chord_id.into(),
                cells: notes.iter().map(|n| note(n)).collect(),
                chord_label: Some("T5".into()),
                chord_major: major,
                tonality_major: major,
                tonic_position: pos,
                inversion: inv,
                ..Default::default()
            }));
        }

        // Ascending intervals cut from the triads above (missing middle).
        for (id, base, low, high) in [
            ("i1", "c1", "C4", "G4"),
            ("i2", "c2", "E4", "C5"),
            ("i3", "c3", "A3", "E4"),
        ] {
            items.push(ContentItem::new(ItemSpec {
                id: id.into(),
                cells: vec![note(low), None, note(high)],
                base_chord: base.into(),
                interval_label: Some("test interval".into()),
                ..Default::default()
            }));
        }

        // A descending melodic interval for the demo pool.
        items.push(ContentItem::new(ItemSpec {
            id: "i4".into(),
            cells: vec![note("G4"), note("C4")],
            interval_label: Some("descending fifth".into()),
            ..Default::default()
        }));

        // Cadence chords: T/S/D voicings, both tonalities.
        for (id, label, major) in [
            ("vt_maj", "T5", true),
            ("vs_maj", "S5", true),
            ("vd_maj", "D5", true),
            ("vt_min", "T5", false),
            ("vs_min", "S5", false),
            ("vd_min", "D5", false),
        ] {
            items.push(ContentItem::new(ItemSpec {
                id: id.into(),
                simultaneous: true,
                cells: vec![note("C4"), note("E4"), note("G4")],
                chord_label: Some(label.into()),
                tonality_major: major,
                chord_major: major,
                ..Default::default()
            }));
        }

        ContentStore::from_items(items)
    }

    pub fn test_shared(seed: u64) -> Shared {
        Shared::with_seed(
            Arc::new(test_store()),
            Arc::new(PhraseBook::builtin()),
            Arc::new(NullResolver),
            seed,
        )
    }
}
