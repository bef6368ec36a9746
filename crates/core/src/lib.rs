#![forbid(unsafe_code)]

pub mod bank;
pub mod model;

pub use bank::QuestionBank;
