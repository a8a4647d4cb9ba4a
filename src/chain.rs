//! # Chain
//!
//! Every pipeline stage is a [Runnable]: something that turns one input into one output,
//! asynchronously. Stages compose with `|`:
//!
//! ```ignore
//! let chain = prompt | llm | StrOutputParser;
//! let answer: String = chain.invoke(PromptInputs::from([("question", "hi")])).await?;
//! ```
//!
//! `a | b` is a [Sequence] that feeds the output of `a` into `b` and stops at the first error.
//! The left-hand side of `|` must be a type of this crate ([ChatPromptTemplate](crate::chat::ChatPromptTemplate),
//! [Sequence] or [Traced]); anything implementing [Runnable] can be on the right-hand side.

use std::ops::BitOr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde::Serialize;

use crate::chat::ChatPromptTemplate;
use crate::utils::tracers::{Run, Tracer};

#[async_trait]
pub trait Runnable: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn invoke(&self, input: Self::Input) -> Result<Self::Output>;

    /// Report every invocation of this runnable to `tracer` under `name`.
    fn traced(self, tracer: Arc<dyn Tracer>, name: impl Into<String>) -> Traced<Self>
    where
        Self: Sized,
    {
        Traced {
            inner: self,
            tracer,
            name: name.into(),
        }
    }
}

#[async_trait]
impl<R: Runnable + ?Sized> Runnable for Arc<R> {
    type Input = R::Input;
    type Output = R::Output;

    async fn invoke(&self, input: Self::Input) -> Result<Self::Output> {
        (**self).invoke(input).await
    }
}

#[async_trait]
impl<R: Runnable + ?Sized> Runnable for Box<R> {
    type Input = R::Input;
    type Output = R::Output;

    async fn invoke(&self, input: Self::Input) -> Result<Self::Output> {
        (**self).invoke(input).await
    }
}

/// Two runnables run one after the other.
#[derive(Debug, Clone)]
pub struct Sequence<A, B> {
    pub first: A,
    pub second: B,
}

#[async_trait]
impl<A, B> Runnable for Sequence<A, B>
where
    A: Runnable,
    B: Runnable<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    async fn invoke(&self, input: A::Input) -> Result<B::Output> {
        let intermediate = self.first.invoke(input).await?;
        self.second.invoke(intermediate).await
    }
}

impl<R> BitOr<R> for ChatPromptTemplate
where
    R: Runnable<Input = Vec<crate::chat::ChatMessage>>,
{
    type Output = Sequence<ChatPromptTemplate, R>;

    fn bitor(self, rhs: R) -> Self::Output {
        Sequence { first: self, second: rhs }
    }
}

impl<A, B, C> BitOr<C> for Sequence<A, B>
where
    A: Runnable,
    B: Runnable<Input = A::Output>,
    C: Runnable<Input = B::Output>,
{
    type Output = Sequence<Sequence<A, B>, C>;

    fn bitor(self, rhs: C) -> Self::Output {
        Sequence { first: self, second: rhs }
    }
}

/// A runnable whose invocations are reported to a [Tracer]. Built by [Runnable::traced].
pub struct Traced<R> {
    inner: R,
    tracer: Arc<dyn Tracer>,
    name: String,
}

#[async_trait]
impl<R> Runnable for Traced<R>
where
    R: Runnable,
    R::Input: Serialize,
    R::Output: Serialize,
{
    type Input = R::Input;
    type Output = R::Output;

    async fn invoke(&self, input: R::Input) -> Result<R::Output> {
        let mut run = Run::chain(self.name.as_str(), &input);
        self.tracer.on_run_start(&run).await;
        let result = self.inner.invoke(input).await;
        match &result {
            Ok(output) => run.finish_ok(output),
            Err(e) => run.finish_err(e),
        }
        debug!("run {} ({}) finished in {:?}", run.id, run.name, run.latency());
        self.tracer.on_run_end(&run).await;
        result
    }
}

impl<R, C> BitOr<C> for Traced<R>
where
    R: Runnable,
    C: Runnable<Input = R::Output>,
{
    type Output = Sequence<Traced<R>, C>;

    fn bitor(self, rhs: C) -> Self::Output {
        Sequence { first: self, second: rhs }
    }
}

#[cfg(test)]
mod test_chain {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::Runnable;
    use crate::chat::{ChatMessage, ChatPromptTemplate, Role};
    use crate::filler::PromptInputs;
    use crate::utils::llm::ChatResponse;
    use crate::utils::postprocess::StrOutputParser;
    use crate::utils::tracers::{Run, Tracer};

    /// Replies with a fixed text and records the messages it was given.
    struct StubModel {
        pub reply: String,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl StubModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Runnable for StubModel {
        type Input = Vec<ChatMessage>;
        type Output = ChatResponse;

        async fn invoke(&self, input: Vec<ChatMessage>) -> Result<ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(input);
            Ok(ChatResponse::text("stub", self.reply.clone()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl Runnable for FailingModel {
        type Input = Vec<ChatMessage>;
        type Output = ChatResponse;

        async fn invoke(&self, _input: Vec<ChatMessage>) -> Result<ChatResponse> {
            Err(anyhow!("quota exceeded"))
        }
    }

    #[derive(Default)]
    struct RecordingTracer {
        started: Mutex<Vec<Run>>,
        ended: Mutex<Vec<Run>>,
    }

    #[async_trait]
    impl Tracer for RecordingTracer {
        async fn on_run_start(&self, run: &Run) {
            self.started.lock().unwrap().push(run.clone());
        }

        async fn on_run_end(&self, run: &Run) {
            self.ended.lock().unwrap().push(run.clone());
        }
    }

    fn prompt() -> ChatPromptTemplate {
        ChatPromptTemplate::from_messages([(Role::System, "Be helpful."), (Role::User, "Question:{{question}}")])
    }

    #[tokio::test]
    async fn test_output_is_model_text() {
        let model = Arc::new(StubModel::new("T"));
        let chain = prompt() | model.clone() | StrOutputParser;
        let answer = chain.invoke(PromptInputs::from([("question", "q")])).await.unwrap();
        assert_eq!("T", answer);
        assert_eq!(1, model.calls.load(Ordering::SeqCst));
        let seen = model.seen.lock().unwrap();
        assert_eq!(ChatMessage::user("Question:q"), seen[0][1]);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let chain = prompt() | FailingModel | StrOutputParser;
        let err = chain.invoke(PromptInputs::from([("question", "q")])).await.unwrap_err();
        assert_eq!("quota exceeded", err.to_string());
    }

    #[tokio::test]
    async fn test_format_error_stops_before_model() {
        let model = Arc::new(StubModel::new("T"));
        let chain = prompt() | model.clone() | StrOutputParser;
        assert!(chain.invoke(PromptInputs::new()).await.is_err());
        assert_eq!(0, model.calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_traced_reports_start_and_end() {
        let tracer = Arc::new(RecordingTracer::default());
        let chain = (prompt() | StubModel::new("T") | StrOutputParser).traced(tracer.clone(), "qa");
        let answer = chain.invoke(PromptInputs::from([("question", "q")])).await.unwrap();
        assert_eq!("T", answer);

        let started = tracer.started.lock().unwrap();
        let ended = tracer.ended.lock().unwrap();
        assert_eq!(1, started.len());
        assert_eq!(1, ended.len());
        assert_eq!(started[0].id, ended[0].id);
        assert_eq!("qa", ended[0].name);
        assert_eq!(serde_json::json!({"question": "q"}), ended[0].inputs);
        assert_eq!(Some(serde_json::json!({"output": "T"})), ended[0].outputs);
        assert!(ended[0].error.is_none());
        assert!(ended[0].end_time.is_some());
    }

    #[tokio::test]
    async fn test_traced_records_error() {
        let tracer = Arc::new(RecordingTracer::default());
        let chain = (prompt() | FailingModel | StrOutputParser).traced(tracer.clone(), "qa");
        assert!(chain.invoke(PromptInputs::from([("question", "q")])).await.is_err());
        let ended = tracer.ended.lock().unwrap();
        assert_eq!(Some("quota exceeded".to_string()), ended[0].error);
        assert!(ended[0].outputs.is_none());
    }
}
