use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::Question;

/// The full question bank, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Arc<Question>>,
    rounds: Vec<String>,
    subjects: Vec<String>,
}

impl QuestionBank {
    /// Index a list of validated questions, keeping their bank order.
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        let rounds: BTreeSet<String> = questions.iter().map(|q| q.round().to_owned()).collect();
        let subjects: BTreeSet<String> =
            questions.iter().map(|q| q.subject().to_owned()).collect();
        Self {
            questions: questions.into_iter().map(Arc::new).collect(),
            rounds: rounds.into_iter().collect(),
            subjects: subjects.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Distinct rounds, ascending.
    #[must_use]
    pub fn rounds(&self) -> &[String] {
        &self.rounds
    }

    /// Distinct subjects, ascending.
    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    #[must_use]
    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    /// Questions of `round` whose subject is one of `subjects`, in bank order.
    #[must_use]
    pub fn questions_for_round_and_subjects(
        &self,
        round: &str,
        subjects: &[String],
    ) -> Vec<Arc<Question>> {
        self.questions_matching(|q_round, subject, _| {
            q_round == round && subjects.iter().any(|s| s == subject)
        })
    }

    /// Questions accepted by `predicate(round, subject, number)`, in bank order.
    pub fn questions_matching<F>(&self, mut predicate: F) -> Vec<Arc<Question>>
    where
        F: FnMut(&str, &str, u32) -> bool,
    {
        self.questions
            .iter()
            .filter(|q| predicate(q.round(), q.subject(), q.number()))
            .cloned()
            .collect()
    }

    /// The round that follows `round` in ascending order.
    #[must_use]
    pub fn next_round_after(&self, round: &str) -> Option<&str> {
        let pos = self.rounds.iter().position(|r| r == round)?;
        self.rounds.get(pos + 1).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_record as record;

    fn bank() -> QuestionBank {
        let records = vec![
            record("20240202", "Math", 1, "1"),
            record("20240101", "Science", 2, "2"),
            record("20240101", "Math", 3, "3"),
            record("20240101", "Math", 1, "1"),
        ];
        QuestionBank::new(
            records
                .into_iter()
                .map(|r| Question::from_record(r).unwrap())
                .collect(),
        )
    }

    #[test]
    fn derives_sorted_distinct_rounds_and_subjects() {
        let bank = bank();
        assert_eq!(bank.rounds(), ["20240101", "20240202"]);
        assert_eq!(bank.subjects(), ["Math", "Science"]);
        assert_eq!(bank.len(), 4);
    }

    #[test]
    fn filters_by_round_and_subject_in_bank_order() {
        let bank = bank();
        let found = bank.questions_for_round_and_subjects("20240101", &["Math".to_owned()]);
        let numbers: Vec<u32> = found.iter().map(|q| q.number()).collect();
        assert_eq!(numbers, vec![3, 1]);
    }

    #[test]
    fn next_round_follows_sorted_order() {
        let bank = bank();
        assert_eq!(bank.next_round_after("20240101"), Some("20240202"));
        assert_eq!(bank.next_round_after("20240202"), None);
        assert_eq!(bank.next_round_after("unknown"), None);
    }
}
