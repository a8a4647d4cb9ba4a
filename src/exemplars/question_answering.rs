//! Answer a single question with a fixed assistant instruction.
//!
//! The whole application is `prompt | llm | StrOutputParser`, built once and invoked once per question.

use std::sync::Arc;

use anyhow::Result;

use crate::chain::Runnable;
use crate::chat::{ChatMessage, ChatPromptTemplate, Role};
use crate::filler::PromptInputs;
use crate::utils::llm::ChatResponse;
use crate::utils::postprocess::StrOutputParser;
use crate::utils::tracers::Tracer;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Please response to the user queries";
pub const QUESTION_TEMPLATE: &str = "Question:{{question}}";
pub const QUESTION_PLACEHOLDER: &str = "question";
pub const RUN_NAME: &str = "question_answering";

/// A shareable question-answering chain: placeholder values in, answer text out.
pub type QaChain = Arc<dyn Runnable<Input = PromptInputs, Output = String>>;

pub fn qa_prompt() -> ChatPromptTemplate {
    ChatPromptTemplate::from_messages([(Role::System, SYSTEM_INSTRUCTION), (Role::User, QUESTION_TEMPLATE)])
}

pub fn question_inputs(question: impl Into<String>) -> PromptInputs {
    PromptInputs::new().with(QUESTION_PLACEHOLDER, question)
}

/// Compose the chain around `model`; every invocation is reported to `tracer`.
pub fn qa_chain<M>(model: M, tracer: Arc<dyn Tracer>) -> QaChain
where
    M: Runnable<Input = Vec<ChatMessage>, Output = ChatResponse> + 'static,
{
    Arc::new((qa_prompt() | model | StrOutputParser).traced(tracer, RUN_NAME))
}

pub async fn ask(chain: &QaChain, question: impl Into<String>) -> Result<String> {
    chain.invoke(question_inputs(question)).await
}
