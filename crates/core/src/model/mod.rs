mod answer;
mod checked;
pub mod content;
mod key;
mod notes;
mod question;
mod resume;

pub use answer::{AnswerChoice, AnswerParseError};
pub use checked::CheckedSet;
pub use content::{Content, ImagePath, decode_commas, encode_commas};
pub use key::{QuestionKey, QuestionKeyParseError};
pub use notes::{ExplanationNotes, NoteChange};
pub use question::{Question, QuestionError, QuestionRecord};
pub use resume::{CheckedResume, NormalResume};

#[cfg(test)]
pub(crate) use question::tests::record as test_record;
