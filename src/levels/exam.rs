//! Exam level
//!
//! A composite over the three scored activities. The exam walks its
//! children in a fixed order, one question at a time, and counts as
//! finished only when every child has answered its full run. Scores are
//! the sum of the children's; resetting the exam resets all of them. The
//! training mode borrows individual children through [`ExamLevel::child_mut`]
//! so exam and training progress share one set of counters.

use std::sync::Arc;

use rand::rngs::SmallRng;

use crate::error::Result;
use crate::input::{Button, UserInput};
use crate::levels::{
    CadenceLevel, LevelId, LevelOps, MissingNoteLevel, Scores, Shared, TonicLocationLevel,
};
use crate::phrases::{LevelPhrases, PhraseBook};
use crate::reply::Reply;

pub struct ExamLevel {
    children: Vec<Box<dyn LevelOps>>,
    first_run: bool,
}

impl Default for ExamLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamLevel {
    pub fn new() -> Self {
        Self {
            children: vec![
                Box::new(MissingNoteLevel::new()),
                Box::new(TonicLocationLevel::new()),
                Box::new(CadenceLevel::new()),
            ],
            first_run: true,
        }
    }

    /// Borrow one child by id. Training addresses children directly so a
    /// trained level keeps its progress when the player moves to the exam.
    pub fn child_mut(&mut self, id: LevelId) -> Option<&mut Box<dyn LevelOps>> {
        self.children.iter_mut().find(|c| c.id() == id)
    }

    pub fn child(&self, id: LevelId) -> Option<&dyn LevelOps> {
        self.children
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.as_ref())
    }

    fn active_index(&self) -> Option<usize> {
        self.children.iter().position(|c| !c.finished())
    }

    fn intro(&mut self, phrases: &LevelPhrases, rng: &mut SmallRng) -> (String, String) {
        let first = std::mem::replace(&mut self.first_run, false);
        if first {
            phrases.intro_long.pick(rng)
        } else if !self.started() {
            phrases.intro_short.pick(rng)
        } else {
            (String::new(), String::new())
        }
    }
}

impl LevelOps for ExamLevel {
    fn id(&self) -> LevelId {
        LevelId::Exam
    }

    fn phrases<'a>(&self, book: &'a PhraseBook) -> &'a LevelPhrases {
        &book.exam
    }

    fn scores(&self) -> Scores {
        self.children.iter().fold(Scores::default(), |acc, c| {
            let s = c.scores();
            Scores {
                correct: acc.correct + s.correct,
                incorrect: acc.incorrect + s.incorrect,
            }
        })
    }

    fn started(&self) -> bool {
        self.children.iter().any(|c| c.started())
    }

    fn finished(&self) -> bool {
        self.children.iter().all(|c| c.finished())
    }

    fn reset(&mut self) {
        for child in &mut self.children {
            child.reset();
        }
        self.first_run = true;
    }

    fn get_reply(&mut self, sh: &mut Shared) -> Result<Option<Reply>> {
        let Some(active) = self.active_index() else {
            return Ok(None);
        };

        let book = Arc::clone(&sh.phrases);
        let phrases = self.phrases(&book);
        let intro = self.intro(phrases, &mut sh.rng);

        let Some(child) = self.children[active].get_reply(sh)? else {
            return Ok(None);
        };
        if intro.0.is_empty() && intro.1.is_empty() {
            return Ok(Some(child));
        }
        Ok(Some(Reply::new(
            format!("{}\n{}", intro.0, child.display),
            format!("{} {}", intro.1, child.speech),
        )))
    }

    fn process_answer(&mut self, sh: &mut Shared, input: &UserInput) -> Result<Option<Reply>> {
        let Some(active) = self.active_index() else {
            return Ok(None);
        };

        let Some(reply) = self.children[active].process_answer(sh, input)? else {
            return Ok(None);
        };

        // The answered child may have just run out of questions; open the
        // next one in the same reply so the exam never stalls.
        if !self.children[active].finished() {
            return Ok(Some(reply));
        }
        let Some(next) = self.get_reply(sh)? else {
            return Ok(Some(reply));
        };
        Ok(Some(Reply::new(
            format!("{}\n{}", reply.display, next.display),
            format!("{}. {}", reply.speech, next.speech),
        )))
    }

    fn buttons(&self, book: &PhraseBook) -> Vec<Button> {
        match self.active_index() {
            Some(active) => self.children[active].buttons(book),
            None => Vec::new(),
        }
    }

    /// Total across the exam plus a line per child the player has started.
    fn stats_reply(&self, book: &PhraseBook) -> Option<Reply> {
        let total = self.scores();
        let mut display = vec![format!(
            "In the exam you answered {} of {} questions correctly.",
            total.correct,
            total.total()
        )];
        let mut speech = display.clone();

        for child in &self.children {
            if !child.started() {
                continue;
            }
            if let Some(line) = child.stats_reply(book) {
                display.push(line.display);
                speech.push(line.speech);
            }
        }
        Some(Reply::new(display.join("\n"), speech.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonAction, UserInput};
    use crate::levels::testutil::test_shared;
    use crate::levels::MAX_TASKS;

    fn answer_current(level: &mut ExamLevel, sh: &mut Shared) {
        level
            .process_answer(sh, &UserInput::button(ButtonAction::Answer(1)))
            .unwrap()
            .unwrap();
    }

    #[test]
    fn walks_children_in_order() {
        let mut sh = test_shared(31);
        let mut exam = ExamLevel::new();

        exam.get_reply(&mut sh).unwrap().unwrap();
        assert_eq!(exam.children[exam.active_index().unwrap()].id(), LevelId::MissingNote);

        for _ in 0..MAX_TASKS {
            answer_current(&mut exam, &mut sh);
        }
        assert_eq!(
            exam.children[exam.active_index().unwrap()].id(),
            LevelId::TonicLocation
        );
        assert_eq!(exam.scores().total(), MAX_TASKS);
    }

    #[test]
    fn finished_only_when_every_child_is() {
        let mut sh = test_shared(32);
        let mut exam = ExamLevel::new();
        exam.get_reply(&mut sh).unwrap().unwrap();

        for _ in 0..MAX_TASKS * 3 {
            assert!(!exam.finished());
            answer_current(&mut exam, &mut sh);
        }
        assert!(exam.finished());
        assert_eq!(exam.scores().total(), MAX_TASKS * 3);
        assert!(exam.get_reply(&mut sh).unwrap().is_none());
    }

    #[test]
    fn trained_child_progress_counts_towards_the_exam() {
        let mut sh = test_shared(33);
        let mut exam = ExamLevel::new();

        {
            let child = exam.child_mut(LevelId::TonicLocation).unwrap();
            child.get_reply(&mut sh).unwrap().unwrap();
            child
                .process_answer(&mut sh, &UserInput::button(ButtonAction::Answer(0)))
                .unwrap()
                .unwrap();
        }
        assert_eq!(exam.scores().total(), 1);
        assert!(exam.started());
    }

    #[test]
    fn reset_cascades_to_children() {
        let mut sh = test_shared(34);
        let mut exam = ExamLevel::new();
        exam.get_reply(&mut sh).unwrap().unwrap();
        answer_current(&mut exam, &mut sh);

        exam.reset();
        assert_eq!(exam.scores(), Scores::default());
        assert!(!exam.started());
        assert!(exam.first_run);
    }

    #[test]
    fn stats_cover_started_children_only() {
        let mut sh = test_shared(35);
        let mut exam = ExamLevel::new();
        exam.get_reply(&mut sh).unwrap().unwrap();
        answer_current(&mut exam, &mut sh);

        let book = Arc::clone(&sh.phrases);
        let stats = exam.stats_reply(&book).unwrap();
        let missing_name = &book.missing_note.name.text;
        let tonic_name = &book.tonic_location.name.text;
        assert!(stats.display.contains(missing_name.as_str()));
        assert!(!stats.display.contains(tonic_name.as_str()));
    }
}
