use std::sync::Arc;

use tracing::info;
use url::Url;

use quiz_core::QuestionBank;
use quiz_core::model::{NoteChange, Question, QuestionKey};
use storage::{QuizRecords, StorageError};

use super::plan::{QuestionSetResolver, QuizMode, SessionRequest};
use super::service::{Advance, AnswerOutcome, QuizSession, ResumeSnapshot, StartNotice};
use super::view::{QuestionView, SessionSummary, clipboard_text};
use crate::checked_service::{CheckedService, ImportMode};
use crate::error::{ImportError, SessionError};
use crate::explanation_service::ExplanationService;

/// A freshly started session plus anything the learner should be told.
#[derive(Debug)]
pub struct StartedSession {
    pub session: QuizSession,
    pub notice: Option<StartNotice>,
}

/// Drives quiz sessions and writes their progress through to storage.
///
/// Every method mutates the session first and then awaits a single record
/// write, so a failed write never leaves the session half-updated.
#[derive(Clone)]
pub struct QuizLoopService {
    bank: Arc<QuestionBank>,
    records: QuizRecords,
    checked: CheckedService,
    explanations: ExplanationService,
    asset_base: Option<Url>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, records: QuizRecords) -> Self {
        Self {
            bank,
            checked: CheckedService::new(records.clone()),
            explanations: ExplanationService::new(records.clone()),
            records,
            asset_base: None,
        }
    }

    /// Base URL that relative image references are resolved against.
    #[must_use]
    pub fn with_asset_base(mut self, asset_base: Option<Url>) -> Self {
        self.asset_base = asset_base;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn asset_base(&self) -> Option<&Url> {
        self.asset_base.as_ref()
    }

    //
    // ─── STARTING ──────────────────────────────────────────────────────────────
    //

    /// Resolve `request` and start at `resume_index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` or `SessionError::EmptySet` when the
    /// criteria resolve to nothing and `SessionError::Storage` on write
    /// failures.
    pub async fn start_session(
        &self,
        request: SessionRequest,
        resume_index: usize,
    ) -> Result<StartedSession, SessionError> {
        let checked = self.records.checked().await?;
        let plan = QuestionSetResolver::new(&self.bank, &checked).resolve(request)?;
        let (session, notice) = QuizSession::start(plan, resume_index)?;
        self.persist_resume(&session).await?;
        info!(
            mode = ?session.mode(),
            round = session.round().unwrap_or("-"),
            questions = session.total(),
            index = session.current_index(),
            "quiz session started"
        );
        Ok(StartedSession { session, notice })
    }

    /// Pick up the last normal quiz where it was left.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoResumeState` when nothing was saved and
    /// `SessionError::ResumeDataMissing` (after clearing the record) when the
    /// saved criteria no longer match any question.
    pub async fn continue_last_quiz(&self) -> Result<StartedSession, SessionError> {
        let state = self
            .records
            .last_quiz()
            .await?
            .ok_or(SessionError::NoResumeState)?;
        let request = SessionRequest::Normal {
            round: state.round,
            subjects: state.subjects,
        };
        match self.start_session(request, state.question_index).await {
            Err(SessionError::EmptySet | SessionError::Selection(_)) => {
                self.records.clear_last_quiz().await?;
                Err(SessionError::ResumeDataMissing)
            }
            other => other,
        }
    }

    /// Pick up the last checked-bookmark quiz where it was left.
    ///
    /// # Errors
    ///
    /// Same as [`Self::continue_last_quiz`].
    pub async fn continue_last_checked_quiz(&self) -> Result<StartedSession, SessionError> {
        let state = self
            .records
            .last_checked_quiz()
            .await?
            .ok_or(SessionError::NoResumeState)?;
        let request = SessionRequest::Checked {
            subjects: state.subjects,
        };
        match self.start_session(request, state.question_index).await {
            Err(SessionError::EmptySet | SessionError::Selection(_)) => {
                self.records.clear_last_checked_quiz().await?;
                Err(SessionError::ResumeDataMissing)
            }
            other => other,
        }
    }

    /// Start a fresh checked-bookmark quiz, dropping any saved progress.
    ///
    /// # Errors
    ///
    /// See [`Self::start_session`].
    pub async fn start_checked_quiz(
        &self,
        subjects: Vec<String>,
    ) -> Result<StartedSession, SessionError> {
        self.records.clear_last_checked_quiz().await?;
        self.start_session(SessionRequest::Checked { subjects }, 0)
            .await
    }

    /// Retry the questions answered wrongly in a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoIncorrectQuestions` when there is nothing to
    /// review.
    pub async fn start_review(
        &self,
        summary: &SessionSummary,
    ) -> Result<StartedSession, SessionError> {
        if summary.incorrect.is_empty() {
            return Err(SessionError::NoIncorrectQuestions);
        }
        let request = SessionRequest::Review {
            questions: summary.incorrect.clone(),
        };
        self.start_session(request, 0).await
    }

    /// Normal quiz over the round after this session's, same subjects.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoNextRound` for checked sessions or the last
    /// round and `SessionError::NextRoundEmpty` when the subjects do not
    /// appear in the next round.
    pub async fn start_next_round(
        &self,
        session: &QuizSession,
    ) -> Result<StartedSession, SessionError> {
        let round = session
            .continuation_round()
            .ok_or(SessionError::NoNextRound)?;
        let next = self
            .bank
            .next_round_after(round)
            .ok_or(SessionError::NoNextRound)?
            .to_owned();
        let request = SessionRequest::Normal {
            round: next.clone(),
            subjects: session.subjects().to_vec(),
        };
        match self.start_session(request, 0).await {
            Err(SessionError::EmptySet) => Err(SessionError::NextRoundEmpty { round: next }),
            other => other,
        }
    }

    //
    // ─── STEPPING ──────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// See [`QuizSession::select_option`].
    pub fn select_option(
        &self,
        session: &mut QuizSession,
        n: u8,
    ) -> Result<AnswerOutcome, SessionError> {
        session.select_option(n)
    }

    /// # Errors
    ///
    /// See [`QuizSession::reveal`].
    pub fn reveal(&self, session: &mut QuizSession) -> Result<AnswerOutcome, SessionError> {
        session.reveal()
    }

    /// Move on and record the new position, or wrap up after the last question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::advance`]; `SessionError::Storage` on write failures.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<Advance, SessionError> {
        let step = session.advance()?;
        match step {
            Advance::Moved(_) => self.persist_resume(session).await?,
            Advance::Completed => self.complete(session).await?,
        }
        Ok(step)
    }

    /// # Errors
    ///
    /// See [`QuizSession::back`]; `SessionError::Storage` on write failures.
    pub async fn back(&self, session: &mut QuizSession) -> Result<usize, SessionError> {
        let index = session.back()?;
        self.persist_resume(session).await?;
        Ok(index)
    }

    /// End the session now and show the result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if saved progress cannot be cleared.
    pub async fn finish(&self, session: &mut QuizSession) -> Result<SessionSummary, SessionError> {
        let summary = session.finish();
        self.complete(session).await?;
        Ok(summary)
    }

    #[must_use]
    pub fn session_summary(&self, session: &QuizSession) -> SessionSummary {
        session.summary()
    }

    async fn persist_resume(&self, session: &QuizSession) -> Result<(), StorageError> {
        match session.resume_snapshot() {
            Some(ResumeSnapshot::Normal(state)) => self.records.save_last_quiz(&state).await,
            Some(ResumeSnapshot::Checked(state)) => {
                self.records.save_last_checked_quiz(&state).await
            }
            None => Ok(()),
        }
    }

    async fn complete(&self, session: &QuizSession) -> Result<(), StorageError> {
        match session.mode() {
            QuizMode::Normal => self.records.clear_last_quiz().await?,
            QuizMode::Checked => self.records.clear_last_checked_quiz().await?,
            QuizMode::Review => {}
        }
        info!(
            mode = ?session.mode(),
            score = session.score(),
            total = session.total(),
            incorrect = session.incorrect().len(),
            "quiz session completed"
        );
        Ok(())
    }

    //
    // ─── PRESENTATION ──────────────────────────────────────────────────────────
    //

    /// Display data for the current question; `None` once complete.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the checked set or notes cannot be read.
    pub async fn question_view(
        &self,
        session: &QuizSession,
    ) -> Result<Option<QuestionView>, StorageError> {
        let Some(entry) = session.current_question() else {
            return Ok(None);
        };
        let key = entry.question.key();
        let is_checked = self.checked.is_checked(key).await?;
        let note = self.explanations.get(key).await?;
        Ok(Some(QuestionView::build(
            entry,
            session.current_index(),
            session.total(),
            self.asset_base.as_ref(),
            is_checked,
            note,
        )))
    }

    #[must_use]
    pub fn clipboard_text(&self, question: &Question) -> String {
        clipboard_text(question, self.asset_base.as_ref())
    }

    //
    // ─── BOOKMARKS & NOTES ─────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn toggle_checked(&self, key: &QuestionKey) -> Result<bool, StorageError> {
        self.checked.toggle(key).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn set_checked(&self, key: &QuestionKey, checked: bool) -> Result<(), StorageError> {
        self.checked.set(key, checked).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn is_checked(&self, key: &QuestionKey) -> Result<bool, StorageError> {
        self.checked.is_checked(key).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn export_checked(&self) -> Result<Option<String>, StorageError> {
        self.checked.export().await
    }

    /// # Errors
    ///
    /// See [`CheckedService::import`].
    pub async fn import_checked(&self, text: &str, mode: ImportMode) -> Result<usize, ImportError> {
        self.checked.import(text, mode).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn save_explanation(
        &self,
        key: QuestionKey,
        text: &str,
    ) -> Result<NoteChange, StorageError> {
        self.explanations.save(key, text).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn explanation_for(&self, key: &QuestionKey) -> Result<Option<String>, StorageError> {
        self.explanations.get(key).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn export_explanations(&self) -> Result<Option<String>, StorageError> {
        self.explanations.export().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn clear_explanations(&self) -> Result<(), StorageError> {
        self.explanations.clear().await
    }
}
