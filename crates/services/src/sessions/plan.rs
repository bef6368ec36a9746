use std::collections::BTreeSet;
use std::sync::Arc;

use quiz_core::QuestionBank;
use quiz_core::model::{AnswerChoice, CheckedSet, Question, QuestionKey};

use crate::error::{SelectionError, SessionError};

/// How a session's question list was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    /// One round, filtered by subjects.
    Normal,
    /// A previous session's incorrect answers. Never resumable.
    Review,
    /// Bookmarked questions across rounds, filtered by subjects.
    Checked,
}

/// Criteria for building a session.
#[derive(Debug, Clone)]
pub enum SessionRequest {
    Normal { round: String, subjects: Vec<String> },
    Review { questions: Vec<Arc<Question>> },
    Checked { subjects: Vec<String> },
}

impl SessionRequest {
    #[must_use]
    pub fn mode(&self) -> QuizMode {
        match self {
            Self::Normal { .. } => QuizMode::Normal,
            Self::Review { .. } => QuizMode::Review,
            Self::Checked { .. } => QuizMode::Checked,
        }
    }
}

/// A question plus the per-session answer state.
///
/// Built fresh for every session so the flags always start cleared, even when
/// the same `Question` was seen in an earlier session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuestion {
    pub question: Arc<Question>,
    pub answered: bool,
    pub is_correct: bool,
    pub selected: Option<AnswerChoice>,
}

impl SessionQuestion {
    #[must_use]
    pub fn fresh(question: Arc<Question>) -> Self {
        Self {
            question,
            answered: false,
            is_correct: false,
            selected: None,
        }
    }
}

/// Ordered question list ready to drive a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub mode: QuizMode,
    pub round: Option<String>,
    pub subjects: Vec<String>,
    pub questions: Vec<SessionQuestion>,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }
}

/// Resolves session criteria against the bank and the checked set.
pub struct QuestionSetResolver<'a> {
    bank: &'a QuestionBank,
    checked: &'a CheckedSet,
}

impl<'a> QuestionSetResolver<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank, checked: &'a CheckedSet) -> Self {
        Self { bank, checked }
    }

    /// Build the ordered question list for `request`.
    ///
    /// Checked sessions are ordered by round and then question number; every
    /// other mode by question number alone. Sorting is stable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` when a required round or subject is
    /// missing and `SessionError::EmptySet` when nothing matches.
    pub fn resolve(&self, request: SessionRequest) -> Result<SessionPlan, SessionError> {
        let mode = request.mode();
        let (round, subjects, mut questions) = match request {
            SessionRequest::Normal { round, subjects } => {
                let round = round.trim().to_owned();
                if round.is_empty() {
                    return Err(SelectionError::NoRoundSelected.into());
                }
                let subjects = distinct(subjects);
                if subjects.is_empty() {
                    return Err(SelectionError::NoSubjectSelected.into());
                }
                let questions = self.bank.questions_for_round_and_subjects(&round, &subjects);
                (Some(round), subjects, questions)
            }
            SessionRequest::Review { questions } => {
                let subjects = distinct(questions.iter().map(|q| q.subject().to_owned()));
                (None, subjects, questions)
            }
            SessionRequest::Checked { subjects } => {
                let subjects = distinct(subjects);
                if subjects.is_empty() {
                    return Err(SelectionError::NoSubjectSelected.into());
                }
                let questions = self.bank.questions_matching(|round, subject, number| {
                    subjects.iter().any(|s| s == subject)
                        && self.checked.contains(&QuestionKey::new(round, number))
                });
                (None, subjects, questions)
            }
        };

        if questions.is_empty() {
            return Err(SessionError::EmptySet);
        }

        match mode {
            QuizMode::Checked => questions.sort_by(|a, b| a.key().cmp(b.key())),
            QuizMode::Normal | QuizMode::Review => questions.sort_by_key(|q| q.number()),
        }

        Ok(SessionPlan {
            mode,
            round,
            subjects,
            questions: questions.into_iter().map(SessionQuestion::fresh).collect(),
        })
    }
}

/// Drop blanks and duplicates, keeping first-seen order.
fn distinct(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionRecord;

    fn question(round: &str, subject: &str, number: u32) -> Question {
        Question::from_record(QuestionRecord {
            round: round.into(),
            subject: subject.into(),
            number,
            body: format!("{round}-{number}"),
            reference: None,
            option1: Some("a".into()),
            option2: Some("b".into()),
            option3: None,
            option4: None,
            answer: "1".into(),
            explanation: None,
        })
        .unwrap()
    }

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            question("20240101", "A", 2),
            question("20240101", "A", 1),
            question("20240101", "B", 3),
            question("20240202", "A", 1),
            question("20231201", "Math", 5),
            question("20230101", "Math", 7),
        ])
    }

    fn numbers(plan: &SessionPlan) -> Vec<u32> {
        plan.questions.iter().map(|q| q.question.number()).collect()
    }

    #[test]
    fn normal_filters_round_and_subjects_sorted_by_number() {
        let bank = bank();
        let checked = CheckedSet::new();
        let plan = QuestionSetResolver::new(&bank, &checked)
            .resolve(SessionRequest::Normal {
                round: "20240101".into(),
                subjects: vec!["A".into(), "B".into()],
            })
            .unwrap();
        assert_eq!(plan.mode, QuizMode::Normal);
        assert_eq!(plan.round.as_deref(), Some("20240101"));
        assert_eq!(numbers(&plan), vec![1, 2, 3]);
        assert!(plan.questions.iter().all(|q| !q.answered && !q.is_correct));
    }

    #[test]
    fn normal_requires_round_and_subject() {
        let bank = bank();
        let checked = CheckedSet::new();
        let resolver = QuestionSetResolver::new(&bank, &checked);

        let err = resolver
            .resolve(SessionRequest::Normal {
                round: " ".into(),
                subjects: vec!["A".into()],
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Selection(SelectionError::NoRoundSelected)
        ));

        let err = resolver
            .resolve(SessionRequest::Normal {
                round: "20240101".into(),
                subjects: Vec::new(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Selection(SelectionError::NoSubjectSelected)
        ));
    }

    #[test]
    fn normal_with_no_match_is_empty_set() {
        let bank = bank();
        let checked = CheckedSet::new();
        let err = QuestionSetResolver::new(&bank, &checked)
            .resolve(SessionRequest::Normal {
                round: "20240101".into(),
                subjects: vec!["Physics".into()],
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptySet));
    }

    #[test]
    fn checked_orders_round_major_not_insertion_order() {
        let bank = bank();
        let checked: CheckedSet = [
            QuestionKey::new("20231201", 5),
            QuestionKey::new("20230101", 7),
            QuestionKey::new("20240101", 2),
        ]
        .into_iter()
        .collect();
        let plan = QuestionSetResolver::new(&bank, &checked)
            .resolve(SessionRequest::Checked {
                subjects: vec!["Math".into()],
            })
            .unwrap();
        let keys: Vec<String> = plan
            .questions
            .iter()
            .map(|q| q.question.key().to_string())
            .collect();
        assert_eq!(keys, vec!["20230101-7", "20231201-5"]);
        assert_eq!(plan.round, None);
    }

    #[test]
    fn checked_without_matches_is_empty_set() {
        let bank = bank();
        let checked = CheckedSet::new();
        let err = QuestionSetResolver::new(&bank, &checked)
            .resolve(SessionRequest::Checked {
                subjects: vec!["Math".into()],
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptySet));
    }

    #[test]
    fn review_keeps_given_questions_and_sorts_by_number() {
        let bank = bank();
        let checked = CheckedSet::new();
        let given = vec![
            Arc::clone(&bank.questions()[2]),
            Arc::clone(&bank.questions()[0]),
        ];
        let plan = QuestionSetResolver::new(&bank, &checked)
            .resolve(SessionRequest::Review { questions: given })
            .unwrap();
        assert_eq!(plan.mode, QuizMode::Review);
        assert_eq!(numbers(&plan), vec![2, 3]);
        assert_eq!(plan.subjects, vec!["B".to_owned(), "A".to_owned()]);
    }

    #[test]
    fn distinct_drops_blanks_and_duplicates() {
        let values = vec!["A".into(), " ".into(), "B".into(), "A".into()];
        assert_eq!(distinct(values), vec!["A".to_owned(), "B".to_owned()]);
    }
}
