use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use quiz_core::model::{AnswerChoice, CheckedResume, NormalResume, Question};

use super::plan::{QuizMode, SessionPlan, SessionQuestion};
use super::progress::SessionProgress;
use super::view::SessionSummary;
use crate::error::SessionError;

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Question `i` is shown and not yet answered.
    Presenting(usize),
    /// Question `i` is shown with its correctness revealed.
    Answered(usize),
    /// Terminal; the summary is available.
    Complete,
}

/// Result of answering or revealing a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub selected: Option<AnswerChoice>,
    /// `None` when the bank's answer token could not be parsed.
    pub correct_choice: Option<AnswerChoice>,
    pub is_correct: bool,
}

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    Completed,
}

/// Non-fatal notices produced while starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartNotice {
    /// The saved index was past the end; the session starts from the top.
    RestartedFromBeginning { saved_index: usize, total: usize },
}

/// Resume pointer for the session's mode, if it is resumable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeSnapshot {
    Normal(NormalResume),
    Checked(CheckedResume),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session over a resolved question list.
///
/// Steps through the questions one at a time. Scoring is idempotent per
/// question: a question contributes to the score or the incorrect list at most
/// once, on its first answer or reveal.
pub struct QuizSession {
    mode: QuizMode,
    round: Option<String>,
    subjects: Vec<String>,
    questions: Vec<SessionQuestion>,
    current: usize,
    score: usize,
    incorrect: Vec<Arc<Question>>,
    completed: bool,
}

impl QuizSession {
    /// Start a session at `start_index`.
    ///
    /// An index past the end starts from the first question and reports
    /// `StartNotice::RestartedFromBeginning`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySet` if the plan has no questions.
    pub fn start(
        plan: SessionPlan,
        start_index: usize,
    ) -> Result<(Self, Option<StartNotice>), SessionError> {
        if plan.questions.is_empty() {
            return Err(SessionError::EmptySet);
        }
        let total = plan.questions.len();
        let (current, notice) = if start_index < total {
            (start_index, None)
        } else {
            (
                0,
                Some(StartNotice::RestartedFromBeginning {
                    saved_index: start_index,
                    total,
                }),
            )
        };

        Ok((
            Self {
                mode: plan.mode,
                round: plan.round,
                subjects: plan.subjects,
                questions: plan.questions,
                current,
                score: 0,
                incorrect: Vec::new(),
                completed: false,
            },
            notice,
        ))
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    /// Selected round; only set for normal sessions.
    #[must_use]
    pub fn round(&self) -> Option<&str> {
        self.round.as_deref()
    }

    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    #[must_use]
    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn incorrect(&self) -> &[Arc<Question>] {
        &self.incorrect
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Complete
        } else if self.questions[self.current].answered {
            Phase::Answered(self.current)
        } else {
            Phase::Presenting(self.current)
        }
    }

    /// The question on screen; `None` once complete.
    #[must_use]
    pub fn current_question(&self) -> Option<&SessionQuestion> {
        if self.completed {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.questions.iter().filter(|q| q.answered).count();
        SessionProgress {
            total: self.total(),
            answered,
            remaining: self.total().saturating_sub(answered),
            is_complete: self.completed,
        }
    }

    /// Answer the current question with option `n`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion,
    /// `SessionError::AlreadyAnswered` if the question was answered or
    /// revealed (state unchanged) and `SessionError::InvalidOption` if `n`
    /// does not name a present option.
    pub fn select_option(&mut self, n: u8) -> Result<AnswerOutcome, SessionError> {
        if self.completed {
            return Err(SessionError::Completed);
        }
        let entry = &self.questions[self.current];
        if entry.answered {
            return Err(SessionError::AlreadyAnswered);
        }
        let choice = AnswerChoice::new(n)
            .filter(|choice| entry.question.option(*choice).is_some())
            .ok_or(SessionError::InvalidOption(n))?;

        let correct_choice = correct_choice_of(&entry.question);
        let is_correct = correct_choice == Some(choice);
        Ok(self.record(Some(choice), correct_choice, is_correct))
    }

    /// Reveal the answer without selecting; counts as incorrect.
    ///
    /// Revealing an already answered question returns its existing outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion.
    pub fn reveal(&mut self) -> Result<AnswerOutcome, SessionError> {
        if self.completed {
            return Err(SessionError::Completed);
        }
        let entry = &self.questions[self.current];
        let correct_choice = correct_choice_of(&entry.question);
        if entry.answered {
            return Ok(AnswerOutcome {
                selected: entry.selected,
                correct_choice,
                is_correct: entry.is_correct,
            });
        }
        Ok(self.record(None, correct_choice, false))
    }

    fn record(
        &mut self,
        selected: Option<AnswerChoice>,
        correct_choice: Option<AnswerChoice>,
        is_correct: bool,
    ) -> AnswerOutcome {
        let mode = self.mode;
        let entry = &mut self.questions[self.current];
        entry.answered = true;
        entry.is_correct = is_correct;
        entry.selected = selected;

        if is_correct {
            self.score += 1;
        } else if mode != QuizMode::Review {
            let question = Arc::clone(&entry.question);
            if !self.incorrect.iter().any(|q| q.is_same_as(&question)) {
                self.incorrect.push(question);
            }
        }
        debug!(index = self.current, is_correct, "question answered");

        AnswerOutcome {
            selected,
            correct_choice,
            is_correct,
        }
    }

    /// Move to the next question, or complete after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unanswered` if the current question has not been
    /// answered or revealed and `SessionError::Completed` after completion.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        if self.completed {
            return Err(SessionError::Completed);
        }
        if !self.questions[self.current].answered {
            return Err(SessionError::Unanswered);
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            Ok(Advance::Moved(self.current))
        } else {
            self.completed = true;
            Ok(Advance::Completed)
        }
    }

    /// Step back one question. Answer state of the target is kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstQuestion` at index 0 and
    /// `SessionError::Completed` after completion.
    pub fn back(&mut self) -> Result<usize, SessionError> {
        if self.completed {
            return Err(SessionError::Completed);
        }
        if self.current == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        self.current -= 1;
        Ok(self.current)
    }

    /// Jump straight to the result.
    pub fn finish(&mut self) -> SessionSummary {
        self.completed = true;
        self.summary()
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            mode: self.mode,
            score: self.score,
            total: self.total(),
            incorrect: self.incorrect.clone(),
        }
    }

    /// Resume pointer at the current index; review sessions have none.
    #[must_use]
    pub fn resume_snapshot(&self) -> Option<ResumeSnapshot> {
        match self.mode {
            QuizMode::Normal => Some(ResumeSnapshot::Normal(NormalResume {
                round: self.round.clone().unwrap_or_default(),
                subjects: self.subjects.clone(),
                question_index: self.current,
            })),
            QuizMode::Checked => Some(ResumeSnapshot::Checked(CheckedResume {
                subjects: self.subjects.clone(),
                question_index: self.current,
            })),
            QuizMode::Review => None,
        }
    }

    /// Round to continue from when moving to the next round: the selected
    /// round, or the round of the first question for review sessions.
    #[must_use]
    pub fn continuation_round(&self) -> Option<&str> {
        match self.mode {
            QuizMode::Normal => self.round.as_deref(),
            QuizMode::Review => self.questions.first().map(|q| q.question.round()),
            QuizMode::Checked => None,
        }
    }
}

fn correct_choice_of(question: &Question) -> Option<AnswerChoice> {
    match question.correct_choice() {
        Ok(choice) => Some(choice),
        Err(err) => {
            warn!(key = %question.key(), %err, "no option counts as correct");
            None
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode)
            .field("round", &self.round)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("incorrect_len", &self.incorrect.len())
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
