use std::sync::Arc;

use url::Url;

use quiz_core::model::{AnswerChoice, Content, Question, QuestionKey, decode_commas};

use super::plan::{QuizMode, SessionQuestion};

/// Result screen data for a finished (or abandoned) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub mode: QuizMode,
    pub score: usize,
    pub total: usize,
    pub incorrect: Vec<Arc<Question>>,
}

impl SessionSummary {
    /// Score as a percentage rounded to one decimal place. Zero for an empty
    /// session.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let tenths = (self.score as f64 * 1000.0 / self.total as f64).round();
        tenths / 10.0
    }
}

/// Display-ready content: decoded text or a resolved image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentView {
    Text(String),
    Image { url: String },
}

impl ContentView {
    #[must_use]
    pub fn from_content(content: &Content, asset_base: Option<&Url>) -> Self {
        match content {
            Content::Text(_) => Self::Text(content.display_text()),
            Content::Image(path) => Self::Image {
                url: path.resolve(asset_base),
            },
        }
    }
}

/// How an option should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    /// Question still open.
    Open,
    /// The correct answer, shown once the question is answered.
    Correct,
    /// The learner picked this and it was wrong.
    WrongSelection,
    /// Answered question, neither picked nor correct.
    Dimmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub choice: AnswerChoice,
    pub content: ContentView,
    pub state: OptionState,
}

/// Everything the presentation layer needs to draw one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub key: QuestionKey,
    pub subject: String,
    /// 1-based position within the session.
    pub position: usize,
    pub total: usize,
    pub body: String,
    pub reference: Option<ContentView>,
    pub options: Vec<OptionView>,
    pub answered: bool,
    pub is_correct: bool,
    pub correct_choice: Option<AnswerChoice>,
    /// Bank explanation; only exposed once answered.
    pub explanation: Option<String>,
    pub is_checked: bool,
    pub note: Option<String>,
}

impl QuestionView {
    #[must_use]
    pub fn build(
        entry: &SessionQuestion,
        index: usize,
        total: usize,
        asset_base: Option<&Url>,
        is_checked: bool,
        note: Option<String>,
    ) -> Self {
        let question = &entry.question;
        let correct_choice = question.correct_choice().ok();
        let options = question
            .options()
            .map(|(choice, content)| OptionView {
                choice,
                content: ContentView::from_content(content, asset_base),
                state: option_state(entry, choice, correct_choice),
            })
            .collect();

        Self {
            key: question.key().clone(),
            subject: question.subject().to_owned(),
            position: index + 1,
            total,
            body: question.display_body(),
            reference: question
                .reference()
                .map(|content| ContentView::from_content(content, asset_base)),
            options,
            answered: entry.answered,
            is_correct: entry.is_correct,
            correct_choice,
            explanation: entry
                .answered
                .then(|| question.explanation().map(decode_commas))
                .flatten(),
            is_checked,
            note,
        }
    }
}

fn option_state(
    entry: &SessionQuestion,
    choice: AnswerChoice,
    correct: Option<AnswerChoice>,
) -> OptionState {
    if !entry.answered {
        OptionState::Open
    } else if correct == Some(choice) {
        OptionState::Correct
    } else if entry.selected == Some(choice) {
        OptionState::WrongSelection
    } else {
        OptionState::Dimmed
    }
}

/// Plain-text rendering of a question for pasting elsewhere.
#[must_use]
pub fn clipboard_text(question: &Question, asset_base: Option<&Url>) -> String {
    let mut text = format!("[{}] {}", question.key(), question.display_body());

    if let Some(reference) = question.reference() {
        text.push_str("\n\n<Reference>\n");
        match ContentView::from_content(reference, asset_base) {
            ContentView::Text(body) => text.push_str(&body),
            ContentView::Image { url } => text.push_str(&format!("[Reference image: {url}]")),
        }
    }

    let options: Vec<String> = question
        .options()
        .map(|(choice, content)| match ContentView::from_content(content, asset_base) {
            ContentView::Text(body) => format!("{choice}. {body}"),
            ContentView::Image { url } => format!("{choice}. [Option image: {url}]"),
        })
        .collect();
    if !options.is_empty() {
        text.push_str("\n\n");
        text.push_str(&options.join("\n"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionRecord;

    fn question(reference: Option<&str>, option2: &str) -> Question {
        Question::from_record(QuestionRecord {
            round: "20240101".into(),
            subject: "A".into(),
            number: 7,
            body: "Pick one_ please".into(),
            reference: reference.map(Into::into),
            option1: Some("first".into()),
            option2: Some(option2.into()),
            option3: None,
            option4: None,
            answer: "②".into(),
            explanation: Some("because_ reasons".into()),
        })
        .unwrap()
    }

    #[test]
    fn percentage_keeps_one_decimal_and_handles_empty() {
        let summary = |score, total| SessionSummary {
            mode: QuizMode::Normal,
            score,
            total,
            incorrect: Vec::new(),
        };
        assert_eq!(summary(2, 3).percentage(), 66.7);
        assert_eq!(summary(1, 3).percentage(), 33.3);
        assert_eq!(summary(1, 8).percentage(), 12.5);
        assert_eq!(summary(3, 3).percentage(), 100.0);
        assert_eq!(summary(0, 0).percentage(), 0.0);
    }

    #[test]
    fn clipboard_text_with_reference_and_images() {
        let base = Url::parse("https://cdn.example.com/quiz/").unwrap();
        let q = question(Some("images/ref.png"), "images/opt2.jpg");
        assert_eq!(
            clipboard_text(&q, Some(&base)),
            "[20240101-7] Pick one, please\n\n<Reference>\n\
             [Reference image: https://cdn.example.com/quiz/images/ref.png]\n\n\
             1. first\n2. [Option image: https://cdn.example.com/quiz/images/opt2.jpg]"
        );
    }

    #[test]
    fn clipboard_text_without_reference() {
        let q = question(None, "second");
        assert_eq!(
            clipboard_text(&q, None),
            "[20240101-7] Pick one, please\n\n1. first\n2. second"
        );
    }

    #[test]
    fn view_highlights_after_answering() {
        let mut entry = SessionQuestion::fresh(Arc::new(question(None, "second")));
        let view = QuestionView::build(&entry, 0, 3, None, false, None);
        assert_eq!(view.position, 1);
        assert_eq!(view.body, "Pick one, please");
        assert!(view.options.iter().all(|o| o.state == OptionState::Open));
        assert_eq!(view.explanation, None);

        entry.answered = true;
        entry.selected = AnswerChoice::new(1);
        let view = QuestionView::build(&entry, 0, 3, None, true, Some("note".into()));
        assert_eq!(view.options[0].state, OptionState::WrongSelection);
        assert_eq!(view.options[1].state, OptionState::Correct);
        assert_eq!(view.explanation.as_deref(), Some("because, reasons"));
        assert!(view.is_checked);
        assert_eq!(view.note.as_deref(), Some("note"));
    }
}
