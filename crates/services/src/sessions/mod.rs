mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{QuestionSetResolver, QuizMode, SessionPlan, SessionQuestion, SessionRequest};
pub use progress::SessionProgress;
pub use service::{Advance, AnswerOutcome, Phase, QuizSession, ResumeSnapshot, StartNotice};
pub use view::{
    ContentView, OptionState, OptionView, QuestionView, SessionSummary, clipboard_text,
};
pub use workflow::{QuizLoopService, StartedSession};
