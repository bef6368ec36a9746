#![forbid(unsafe_code)]

pub mod app_services;
pub mod bank_loader;
pub mod checked_service;
pub mod error;
pub mod explanation_service;
pub mod sessions;

pub use sessions as session;

pub use app_services::AppServices;
pub use bank_loader::{BankSource, load_bank, load_bank_with, parse_bank};
pub use checked_service::{CheckedService, ImportMode};
pub use error::{AppServicesError, ImportError, LoadError, SelectionError, SessionError};
pub use explanation_service::ExplanationService;

pub use sessions::{
    Advance, AnswerOutcome, Phase, QuestionView, QuizLoopService, QuizMode, QuizSession,
    SessionRequest, SessionSummary, StartNotice, StartedSession,
};
