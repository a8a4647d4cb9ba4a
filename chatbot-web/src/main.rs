mod cli;
mod page;
mod server;

use anyhow::Result;
use chatbot::config::{load_dotenv, Credentials, TracingConfig};
use chatbot::exemplars::question_answering::qa_chain;
use chatbot::utils::llm::openai::OpenAIChat;
use chatbot::utils::tracers::tracer_from_config;
use clap::Parser;
use log::info;

use crate::cli::Cli;
use crate::server::AppState;

#[actix_web::main]
async fn main() -> Result<()> {
    server::init_logging();
    load_dotenv();
    let cli = Cli::parse();

    let credentials = Credentials::from_env()?;
    let tracer = tracer_from_config(&TracingConfig::from_env()?);
    let llm = OpenAIChat::from_credentials(&credentials, cli.conversation_config());
    info!("Answering with {} at temperature {}", llm.config.model, llm.config.temperature);

    let app_state = AppState {
        chain: qa_chain(llm, tracer),
    };
    server::startup(cli.host, cli.port, app_state).await?;
    Ok(())
}
