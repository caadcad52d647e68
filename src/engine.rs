//! Top-level mode controller
//!
//! One [`Engine`] per session. It owns the demo level and the exam (which in
//! turn owns the three training children), tracks the current mode, and
//! routes each turn: menu keyword matching, level answer processing, back
//! navigation, stats and rules queries. Every public operation takes
//! `&mut self`; the session registry serializes turns behind one mutex, so
//! nothing here locks.

use std::sync::Arc;

use log::debug;

use crate::content::ContentStore;
use crate::error::{Result, SolfaError};
use crate::input::{cmd_matches, Button, ButtonAction, UserInput};
use crate::levels::{DemoLevel, ExamLevel, LevelId, LevelOps, Shared};
use crate::phrases::{fill, PhraseBook};
use crate::reply::{AudioTagResolver, Fragment, Reply};

/// Speech prefix applied when the cosmetic voice effect is on. The engine
/// only stores the flag; the adapter calls [`Engine::decorate_speech`].
pub const VOICE_EFFECT_TAG: &str = "<speaker effect=\"megaphone\">";

const NEG: &[&str] = &["no", "not", "don't", "dont"];

/// Session mode. `Unknown` means no turn has happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Unknown,
    Init,
    Menu,
    Demo,
    TrainMenu,
    Train,
    Exam,
}

pub struct Engine {
    mode: Mode,
    demo: DemoLevel,
    exam: ExamLevel,
    /// Training child bound while in [`Mode::Train`].
    current: Option<LevelId>,
    shared: Shared,
    voice_effect: bool,
}

impl Engine {
    pub fn new(
        store: Arc<ContentStore>,
        phrases: Arc<PhraseBook>,
        resolver: Arc<dyn AudioTagResolver>,
    ) -> Self {
        Self::with_shared(Shared::new(store, phrases, resolver))
    }

    pub fn with_shared(shared: Shared) -> Self {
        Self {
            mode: Mode::Init,
            demo: DemoLevel::new(),
            exam: ExamLevel::new(),
            current: None,
            shared,
            voice_effect: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_voice_effect(&mut self, on: bool) {
        self.voice_effect = on;
    }

    pub fn voice_effect(&self) -> bool {
        self.voice_effect
    }

    /// Prefix speech with the platform effect marker when the toggle is on.
    pub fn decorate_speech(&self, speech: &str) -> String {
        if self.voice_effect && !speech.is_empty() {
            format!("{VOICE_EFFECT_TAG}{speech}")
        } else {
            speech.to_string()
        }
    }

    /// Switch mode. Every transition clears the sampler's used set; entering
    /// a level mode resets that level so a revisit starts a fresh run.
    pub fn set_mode(&mut self, mode: Mode) {
        debug!("mode {:?} -> {:?}", self.mode, mode);
        self.shared.sampler.clear_used();
        match mode {
            Mode::Demo => {
                self.demo.reset();
                self.current = None;
            }
            Mode::Exam => {
                self.exam.reset();
                self.current = None;
            }
            _ => {}
        }
        self.mode = mode;
    }

    /// Bind and reset one training child, then enter [`Mode::Train`].
    pub fn set_level(&mut self, id: LevelId) {
        self.shared.sampler.clear_used();
        if let Some(child) = self.exam.child_mut(id) {
            child.reset();
            self.current = Some(id);
            self.mode = Mode::Train;
        }
    }

    fn active_parts(&mut self) -> (Option<&mut (dyn LevelOps + 'static)>, &mut Shared) {
        let Engine {
            mode,
            demo,
            exam,
            current,
            shared,
            ..
        } = self;
        let level: Option<&mut (dyn LevelOps + 'static)> = match mode {
            Mode::Demo => Some(demo),
            Mode::Exam => Some(exam),
            Mode::Train => current
                .and_then(|id| exam.child_mut(id))
                .map(|child| child.as_mut()),
            _ => None,
        };
        (level, shared)
    }

    /// Pose (or repeat) the current turn's prompt.
    pub fn get_reply(&mut self) -> Result<Reply> {
        match self.mode {
            Mode::Unknown => Err(SolfaError::ModeNotSet),
            Mode::Init => self.greeting_reply(),
            Mode::Menu => Ok(self.menu_reply()),
            Mode::TrainMenu => Ok(self.train_menu_reply()),
            Mode::Demo | Mode::Train | Mode::Exam => {
                let was_exam = self.mode == Mode::Exam;
                let (level, shared) = self.active_parts();
                let Some(level) = level else {
                    return Err(SolfaError::ModeNotSet);
                };
                match level.get_reply(shared)? {
                    Some(reply) => Ok(reply),
                    None => self.complete_level(None, was_exam),
                }
            }
        }
    }

    /// Route one player turn.
    pub fn process_user_reply(&mut self, input: &UserInput) -> Result<Reply> {
        if let UserInput::Button(action) = input {
            match action {
                ButtonAction::SetMode(mode) => {
                    self.set_mode(*mode);
                    return self.get_reply();
                }
                ButtonAction::SetLevel(id) => {
                    self.set_level(*id);
                    return self.get_reply();
                }
                ButtonAction::Repeat => return self.get_reply(),
                ButtonAction::Help => return Ok(self.get_rules_reply()),
                ButtonAction::Back => return self.process_back(),
                ButtonAction::Answer(_) => {}
            }
        }

        // Navigation keywords work everywhere, but never shadow an answer.
        if let (Some(text), None) = (input.text(), input.answer_number()) {
            if cmd_matches(text, &["back", "menu", "return"], &[]) {
                return self.process_back();
            }
            if cmd_matches(text, &["repeat", "again"], &[]) {
                return self.get_reply();
            }
            if cmd_matches(text, &["rule", "help", "how"], NEG) {
                return Ok(self.get_rules_reply());
            }
            if cmd_matches(text, &["score", "stat", "result"], NEG) {
                return Ok(self.get_stats_reply());
            }
        }

        match self.mode {
            Mode::Unknown => Err(SolfaError::ModeNotSet),
            Mode::Init => Ok(self.dont_understand()),
            Mode::Menu => self.process_menu_choice(input),
            Mode::TrainMenu => self.process_train_choice(input),
            Mode::Demo | Mode::Train | Mode::Exam => self.level_turn(input),
        }
    }

    /// One step up: level → its owning menu, train menu → main menu. The
    /// main menu itself has nowhere to go and says so.
    pub fn process_back(&mut self) -> Result<Reply> {
        match self.mode {
            Mode::Demo | Mode::Exam => {
                self.set_mode(Mode::Menu);
                self.get_reply()
            }
            Mode::Train => {
                self.set_mode(Mode::TrainMenu);
                self.get_reply()
            }
            Mode::TrainMenu => {
                self.set_mode(Mode::Menu);
                self.get_reply()
            }
            Mode::Menu => {
                let (text, speech) = self.shared.phrases.root.no_way_back.pair();
                Ok(Reply::new(text, speech))
            }
            Mode::Unknown | Mode::Init => Ok(self.dont_understand()),
        }
    }

    /// Score summary. Demo and training runs are not scored; the exam's
    /// summary appears once the exam has started.
    pub fn get_stats_reply(&self) -> Reply {
        let book = &self.shared.phrases;
        match self.mode {
            Mode::Demo | Mode::Train => {
                let (text, speech) = book.root.level_not_scored.pair();
                Reply::new(text, speech)
            }
            _ if self.exam.started() => self
                .exam
                .stats_reply(book)
                .unwrap_or_else(|| Reply::new(String::new(), String::new())),
            _ => {
                let (text, speech) = book.root.no_score.pair();
                Reply::new(text, speech)
            }
        }
    }

    pub fn get_rules_reply(&self) -> Reply {
        let (text, speech) = self.shared.phrases.menu.rules.pair();
        Reply::new(text, speech)
    }

    /// Suggestion buttons for the current mode.
    pub fn buttons(&self) -> Vec<Button> {
        let book = &self.shared.phrases;
        match self.mode {
            Mode::Unknown | Mode::Init | Mode::Menu => vec![
                Button::new(book.demo.name.text.clone(), ButtonAction::SetMode(Mode::Demo)),
                Button::new(
                    book.menu.train_button.clone(),
                    ButtonAction::SetMode(Mode::TrainMenu),
                ),
                Button::new(book.exam.name.text.clone(), ButtonAction::SetMode(Mode::Exam)),
                Button::new(book.root.help_button.clone(), ButtonAction::Help),
            ],
            Mode::TrainMenu => vec![
                Button::new(
                    book.missing_note.name.text.clone(),
                    ButtonAction::SetLevel(LevelId::MissingNote),
                ),
                Button::new(
                    book.tonic_location.name.text.clone(),
                    ButtonAction::SetLevel(LevelId::TonicLocation),
                ),
                Button::new(
                    book.cadence.name.text.clone(),
                    ButtonAction::SetLevel(LevelId::Cadence),
                ),
                Button::new(book.root.back_button.clone(), ButtonAction::Back),
            ],
            Mode::Demo | Mode::Train | Mode::Exam => {
                let mut buttons = match self.mode {
                    Mode::Demo => self.demo.buttons(book),
                    Mode::Exam => self.exam.buttons(book),
                    _ => self
                        .current
                        .and_then(|id| self.exam.child(id))
                        .map(|child| child.buttons(book))
                        .unwrap_or_default(),
                };
                buttons.push(Button::new(
                    book.root.repeat_button.clone(),
                    ButtonAction::Repeat,
                ));
                buttons.push(Button::new(book.root.back_button.clone(), ButtonAction::Back));
                buttons
            }
        }
    }

    fn dont_understand(&self) -> Reply {
        self.shared.dont_understand()
    }

    /// First contact: long greeting with a showcase chord, then the menu.
    fn greeting_reply(&mut self) -> Result<Reply> {
        let book = Arc::clone(&self.shared.phrases);
        let showcase = self.shared.try_draw(|i| {
            i.is_simultaneous() && (i.is_chord_major() || i.is_tonality_major())
        });

        let (text, speech) = book.menu.greeting.pair();
        let greeting = self.shared.reply(
            &[Fragment::text(text)],
            &[
                Fragment::text(speech),
                showcase.as_ref().map(Fragment::audio_for).unwrap_or_else(Fragment::none),
            ],
        );

        self.set_mode(Mode::Menu);
        let menu = self.menu_reply();
        Ok(Reply::new(
            format!("{}\n{}", greeting.display, menu.display),
            format!("{} {}", greeting.speech, menu.speech),
        ))
    }

    fn menu_reply(&mut self) -> Reply {
        let book = Arc::clone(&self.shared.phrases);
        let (text, speech) = book.menu.options.pick(&mut self.shared.rng);
        Reply::new(text, speech)
    }

    fn train_menu_reply(&self) -> Reply {
        let book = &self.shared.phrases;
        let args = [
            ("missing_note", book.missing_note.name.text.as_str()),
            ("tonic_location", book.tonic_location.name.text.as_str()),
            ("cadence", book.cadence.name.text.as_str()),
        ];
        Reply::new(
            fill(&book.menu.train_menu.text, &args),
            fill(book.menu.train_menu.speech(), &args),
        )
    }

    fn process_menu_choice(&mut self, input: &UserInput) -> Result<Reply> {
        let Some(text) = input.text() else {
            return Ok(self.dont_understand());
        };
        if cmd_matches(text, &["demo", "warm"], NEG) {
            self.set_mode(Mode::Demo);
            return self.get_reply();
        }
        if cmd_matches(text, &["train", "practice", "drill"], NEG) {
            self.set_mode(Mode::TrainMenu);
            return self.get_reply();
        }
        if cmd_matches(text, &["exam", "test"], NEG) {
            self.set_mode(Mode::Exam);
            return self.get_reply();
        }
        Ok(self.dont_understand())
    }

    fn process_train_choice(&mut self, input: &UserInput) -> Result<Reply> {
        let by_number = match input.answer_number() {
            Some(1) => Some(LevelId::MissingNote),
            Some(2) => Some(LevelId::TonicLocation),
            Some(3) => Some(LevelId::Cadence),
            _ => None,
        };
        let by_keyword = input.text().and_then(|text| {
            if cmd_matches(text, &["missing", "gap", "omit"], NEG) {
                Some(LevelId::MissingNote)
            } else if cmd_matches(text, &["tonic", "location", "position"], NEG) {
                Some(LevelId::TonicLocation)
            } else if cmd_matches(text, &["cadence"], NEG) {
                Some(LevelId::Cadence)
            } else {
                None
            }
        });

        match by_number.or(by_keyword) {
            Some(id) => {
                self.set_level(id);
                self.get_reply()
            }
            None => Ok(self.dont_understand()),
        }
    }

    fn level_turn(&mut self, input: &UserInput) -> Result<Reply> {
        let was_exam = self.mode == Mode::Exam;
        let (level, shared) = self.active_parts();
        let Some(level) = level else {
            return Err(SolfaError::ModeNotSet);
        };

        let reply = level.process_answer(shared, input)?;
        let finished = level.finished();

        match reply {
            Some(reply) if !finished => Ok(reply),
            maybe => self.complete_level(maybe, was_exam),
        }
    }

    /// The active level has run out of questions: fold its last output with
    /// the completion phrase (plus exam stats), then fall back to the menu.
    fn complete_level(&mut self, last: Option<Reply>, was_exam: bool) -> Result<Reply> {
        let book = Arc::clone(&self.shared.phrases);

        let mut display = Vec::new();
        let mut speech = Vec::new();
        let mut push = |reply: Reply| {
            if !reply.display.is_empty() {
                display.push(reply.display);
            }
            if !reply.speech.is_empty() {
                speech.push(reply.speech);
            }
        };

        if let Some(last) = last {
            push(last);
        }
        let complete = if was_exam {
            book.root.exam_complete.pair()
        } else {
            book.root.level_complete.pair()
        };
        push(Reply::new(complete.0, complete.1));
        if was_exam {
            if let Some(stats) = self.exam.stats_reply(&book) {
                push(stats);
            }
        }

        self.set_mode(Mode::Menu);
        push(self.menu_reply());

        Ok(Reply::new(display.join("\n"), speech.join(". ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::testutil::test_shared;
    use crate::levels::MAX_TASKS;

    fn test_engine(seed: u64) -> Engine {
        Engine::with_shared(test_shared(seed))
    }

    #[test]
    fn greeting_transitions_to_menu() {
        let mut engine = test_engine(1);
        assert_eq!(engine.mode(), Mode::Init);

        let reply = engine.get_reply().unwrap();
        assert_eq!(engine.mode(), Mode::Menu);
        assert!(reply.display.contains("Welcome"));
        // The showcase cue lands only in the speech channel.
        assert!(!reply.display.contains("_ver"));
    }

    #[test]
    fn unknown_mode_is_a_contract_violation() {
        let mut engine = test_engine(1);
        engine.mode = Mode::Unknown;
        assert!(matches!(engine.get_reply(), Err(SolfaError::ModeNotSet)));
        assert!(matches!(
            engine.process_user_reply(&UserInput::command("demo")),
            Err(SolfaError::ModeNotSet)
        ));
    }

    #[test]
    fn menu_keywords_route_to_modes() {
        let mut engine = test_engine(2);
        engine.get_reply().unwrap();

        engine.process_user_reply(&UserInput::command("the demo please")).unwrap();
        assert_eq!(engine.mode(), Mode::Demo);

        engine.process_back().unwrap();
        engine.process_user_reply(&UserInput::command("training")).unwrap();
        assert_eq!(engine.mode(), Mode::TrainMenu);

        engine.process_back().unwrap();
        engine.process_user_reply(&UserInput::command("not the exam")).unwrap();
        assert_eq!(engine.mode(), Mode::Menu);

        engine.process_user_reply(&UserInput::command("the exam")).unwrap();
        assert_eq!(engine.mode(), Mode::Exam);
    }

    #[test]
    fn train_menu_accepts_numbers_and_keywords() {
        let mut engine = test_engine(3);
        engine.get_reply().unwrap();
        engine.set_mode(Mode::TrainMenu);

        engine.process_user_reply(&UserInput::command("2")).unwrap();
        assert_eq!(engine.mode(), Mode::Train);
        assert_eq!(engine.current, Some(LevelId::TonicLocation));

        engine.set_mode(Mode::TrainMenu);
        engine.process_user_reply(&UserInput::command("the cadence one")).unwrap();
        assert_eq!(engine.current, Some(LevelId::Cadence));
    }

    #[test]
    fn finished_level_falls_back_to_menu() {
        let mut engine = test_engine(4);
        engine.get_reply().unwrap();
        engine.set_mode(Mode::Demo);
        engine.get_reply().unwrap();

        let mut last = Reply::default();
        for _ in 0..MAX_TASKS {
            last = engine
                .process_user_reply(&UserInput::button(ButtonAction::Answer(1)))
                .unwrap();
        }
        assert_eq!(engine.mode(), Mode::Menu);
        assert!(last.display.contains("Level complete"));
    }

    #[test]
    fn exam_completion_includes_stats() {
        let mut engine = test_engine(5);
        engine.get_reply().unwrap();
        engine.set_mode(Mode::Exam);
        engine.get_reply().unwrap();

        let mut last = Reply::default();
        for _ in 0..MAX_TASKS * 3 {
            last = engine
                .process_user_reply(&UserInput::button(ButtonAction::Answer(1)))
                .unwrap();
        }
        assert_eq!(engine.mode(), Mode::Menu);
        assert!(last.display.contains("exam is over"));
        assert!(last.display.contains("you answered"));
    }

    #[test]
    fn back_walks_up_one_step_at_a_time() {
        let mut engine = test_engine(6);
        engine.get_reply().unwrap();
        engine.set_mode(Mode::TrainMenu);
        engine.process_user_reply(&UserInput::command("missing note")).unwrap();
        assert_eq!(engine.mode(), Mode::Train);

        engine.process_user_reply(&UserInput::command("go back")).unwrap();
        assert_eq!(engine.mode(), Mode::TrainMenu);
        engine.process_back().unwrap();
        assert_eq!(engine.mode(), Mode::Menu);

        let reply = engine.process_back().unwrap();
        assert_eq!(engine.mode(), Mode::Menu);
        assert!(reply.display.contains("no way back"));
    }

    #[test]
    fn stats_depend_on_mode_and_progress() {
        let mut engine = test_engine(7);
        engine.get_reply().unwrap();
        assert!(engine.get_stats_reply().display.contains("No score yet"));

        engine.set_mode(Mode::Demo);
        assert!(engine.get_stats_reply().display.contains("not scored"));

        engine.set_mode(Mode::Exam);
        engine.get_reply().unwrap();
        engine
            .process_user_reply(&UserInput::button(ButtonAction::Answer(1)))
            .unwrap();
        engine.set_mode(Mode::Menu);
        assert!(engine.get_stats_reply().display.contains("you answered"));
    }

    #[test]
    fn repeat_returns_the_same_question() {
        let mut engine = test_engine(8);
        engine.get_reply().unwrap();
        engine.set_mode(Mode::Demo);
        engine.get_reply().unwrap();
        engine
            .process_user_reply(&UserInput::button(ButtonAction::Answer(1)))
            .unwrap();

        // Past the intro lines, a repeat re-poses the held secret verbatim.
        let first = engine.get_reply().unwrap();
        let again = engine
            .process_user_reply(&UserInput::button(ButtonAction::Repeat))
            .unwrap();
        assert_eq!(first.speech, again.speech);
    }

    #[test]
    fn buttons_follow_the_mode() {
        let mut engine = test_engine(9);
        engine.get_reply().unwrap();
        assert_eq!(engine.buttons().len(), 4);

        engine.set_mode(Mode::TrainMenu);
        let titles: Vec<_> = engine.buttons().into_iter().map(|b| b.title).collect();
        assert!(titles.contains(&"Cadence".to_string()));

        engine.set_mode(Mode::Demo);
        engine.get_reply().unwrap();
        let actions: Vec<_> = engine.buttons().into_iter().map(|b| b.action).collect();
        assert!(actions.contains(&ButtonAction::Answer(1)));
        assert!(actions.contains(&ButtonAction::Repeat));
        assert!(actions.contains(&ButtonAction::Back));
    }

    #[test]
    fn voice_effect_prefixes_speech() {
        let mut engine = test_engine(10);
        assert_eq!(engine.decorate_speech("hello"), "hello");
        engine.set_voice_effect(true);
        assert!(engine.decorate_speech("hello").starts_with(VOICE_EFFECT_TAG));
        assert_eq!(engine.decorate_speech(""), "");
    }
}
