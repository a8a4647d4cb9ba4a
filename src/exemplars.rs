//! # Application Samples
//!
//! * Question answering: one system instruction, one templated question, one model call.

pub mod question_answering;
