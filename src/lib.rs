//! # chatbot
//!
//! Ask a hosted chat model a question through a small, explicit prompt pipeline.
//!
//! ## Usage
//! The library is used by the `chatbot-web` binary in this workspace, which serves a one-field web form.
//! To use the library directly, add a path dependency in `Cargo.toml`
//! ```toml
//! chatbot = { path = "../chatbot" }
//! ```
//!
//! ## Concepts and Design
//! The pipeline is data-driven: each step takes a value and returns a value, and every step can be
//! inspected on its own. Cycle speed is NOT a priority since the model takes far longer to respond
//! than anything done locally.
//!
//! ### Prompt Template and Placeholder
//!
//! A template of prompts, for example
//!
//! ```text
//! Question:{{question}}
//! ```
//!
//! `{{question}}` is a placeholder, a slot to be filled, named `"question"`. The name can be any string
//! without braces and line breaks.
//!
//! ### Partial Prompt
//!
//! An incomplete construction of a template. A [`PartialPrompt`](crate::prompt::PartialPrompt) comes only from
//! [`PromptTemplate::construct_prompt`](crate::prompt::PromptTemplate::construct_prompt); it records which placeholder
//! is filled with what value, and can be completed into a string once nothing is left unfilled.
//!
//! ### Filler
//!
//! Anything that fills one or more placeholders in a partial prompt: anything that implements
//! [`FillPlaceholders`](crate::filler::FillPlaceholders) and [`Fill`](crate::filler::Fill) or
//! [`FillWith<CTX>`](crate::filler::FillWith). [`PromptInputs`](crate::filler::PromptInputs) is the plain
//! name-to-value filler.
//!
//! ### Chat Prompt
//!
//! Chat models take role-tagged messages. A [`ChatPromptTemplate`](crate::chat::ChatPromptTemplate) is an
//! ordered list of role-tagged templates that formats into [`ChatMessage`](crate::chat::ChatMessage)s.
//!
//! ### Endpoint or LLM
//!
//! The endpoint of the pipeline is the model, [`OpenAIChat`](crate::utils::llm::openai::OpenAIChat), which
//! consumes messages and produces a [`ChatResponse`](crate::utils::llm::ChatResponse). Post-processing, like
//! [`StrOutputParser`](crate::utils::postprocess::StrOutputParser), lives in [utilities](crate::utils).
//!
//! ### Chain
//!
//! Steps implement [`Runnable`](crate::chain::Runnable) and compose with `|`:
//! `prompt | llm | StrOutputParser`. A chain can be traced, reporting each run to a
//! [`Tracer`](crate::utils::tracers::Tracer) such as LangSmith.
//!
//! ## Attribution
//! * `async_openai`: [crate::utils::llm::openai::ConversationConfig] mirrors its request settings.
//! * `tiktoken-rs`: In [crate::utils::token::tiktoken], we re-export the `tiktoken-rs` crate.

pub mod chain;
pub mod chat;
pub mod config;
pub mod exemplars;
pub mod filler;
pub mod prompt;
pub mod utils;
