//! Quiz session state machine.
//!
//! A session walks the questions of one quiz:
//! `Answering -> Revealed -> Answering (next) | Complete`.
//! An answer can be changed until it is submitted; after submission the
//! explanation is revealed and the answer is locked.
use crate::core::curriculum::{Question, Quiz};
use crate::core::error::CoreError;
use crate::core::progress::{ProgressEngine, ProgressUpdate};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Answering,
    Revealed,
    Complete,
}

impl QuizState {
    fn name(&self) -> &'static str {
        match self {
            QuizState::Answering => "answering",
            QuizState::Revealed => "revealed",
            QuizState::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizOutcome {
    pub score: usize,
    pub total: usize,
    pub score_percentage: f64,
    pub passed: bool,
}

#[derive(Debug)]
pub struct QuizSession<'q> {
    quiz: &'q Quiz,
    question_index: usize,
    selected: Option<usize>,
    state: QuizState,
    score: usize,
    answer_log: Vec<AnswerRecord>,
    reward_claimed: bool,
}

impl<'q> QuizSession<'q> {
    pub fn new(quiz: &'q Quiz) -> Result<Self, CoreError> {
        if quiz.questions.is_empty() {
            return Err(CoreError::InvalidCurriculum(format!(
                "quiz '{}' has no questions",
                quiz.title
            )));
        }
        Ok(Self {
            quiz,
            question_index: 0,
            selected: None,
            state: QuizState::Answering,
            score: 0,
            answer_log: Vec::new(),
            reward_claimed: false,
        })
    }

    pub fn quiz(&self) -> &'q Quiz {
        self.quiz
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_revealed(&self) -> bool {
        self.state != QuizState::Answering
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn current_question(&self) -> &'q Question {
        &self.quiz.questions[self.question_index]
    }

    pub fn selected_answer(&self) -> Option<usize> {
        self.selected
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    pub fn select_answer(&mut self, index: usize) -> Result<(), CoreError> {
        self.expect_state(QuizState::Answering, "select an answer")?;
        let options = self.current_question().options.len();
        if index >= options {
            return Err(CoreError::OptionOutOfRange { index, options });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Locks in the selected answer and reveals the explanation.
    /// Returns whether the answer was correct.
    pub fn submit(&mut self) -> Result<bool, CoreError> {
        self.expect_state(QuizState::Answering, "submit")?;
        let selected = self.selected.ok_or(CoreError::NoSelection)?;

        let correct = selected == self.current_question().correct_answer;
        self.answer_log.push(AnswerRecord {
            question_index: self.question_index,
            correct,
        });
        if correct {
            self.score += 1;
        }
        self.state = QuizState::Revealed;
        debug!(
            question = self.question_index,
            correct,
            score = self.score,
            "Answer submitted"
        );
        Ok(correct)
    }

    /// Moves to the next question, or completes the quiz after the last one.
    pub fn advance(&mut self) -> Result<QuizState, CoreError> {
        self.expect_state(QuizState::Revealed, "advance")?;
        if self.question_index + 1 < self.quiz.total_questions() {
            self.question_index += 1;
            self.selected = None;
            self.state = QuizState::Answering;
        } else {
            self.state = QuizState::Complete;
            debug!(score = self.score, "Quiz complete");
        }
        Ok(self.state)
    }

    /// Starts over. Progress already credited is left untouched.
    pub fn retake(&mut self) {
        self.question_index = 0;
        self.selected = None;
        self.state = QuizState::Answering;
        self.score = 0;
        self.answer_log.clear();
        self.reward_claimed = false;
    }

    pub fn score_percentage(&self) -> f64 {
        self.score as f64 / self.quiz.total_questions() as f64 * 100.0
    }

    pub fn passed(&self) -> bool {
        self.score_percentage() >= f64::from(self.quiz.passing_score)
    }

    /// Final result, available once the quiz is complete.
    pub fn outcome(&self) -> Option<QuizOutcome> {
        (self.state == QuizState::Complete).then(|| QuizOutcome {
            score: self.score,
            total: self.quiz.total_questions(),
            score_percentage: self.score_percentage(),
            passed: self.passed(),
        })
    }

    /// Credits the quiz XP for a completed, passed session. Returns `None`
    /// when the session is not complete, did not pass, or already paid out.
    pub fn claim_reward(
        &mut self,
        engine: &mut ProgressEngine<'_>,
    ) -> Result<Option<ProgressUpdate>, CoreError> {
        match self.outcome() {
            Some(outcome) if outcome.passed && !self.reward_claimed => {
                let update = engine.record_quiz_pass(self.quiz.module, self.quiz.xp_reward)?;
                self.reward_claimed = true;
                Ok(Some(update))
            }
            _ => Ok(None),
        }
    }

    fn expect_state(&self, expected: QuizState, action: &'static str) -> Result<(), CoreError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidQuizTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}
