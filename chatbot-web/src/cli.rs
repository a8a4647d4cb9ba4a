use chatbot::utils::llm::openai::{ConversationConfig, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use clap::Parser;

/// Serve a one-field web form that answers questions with a hosted chat model.
///
/// Credentials are read from the environment (or a `.env` file): OPENAI_API_KEY is required,
/// LANGCHAIN_API_KEY enables LangSmith tracing.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "chatbot-web", version, about)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "CHATBOT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "CHATBOT_PORT", default_value_t = 8501)]
    pub port: u16,

    /// Chat model to ask
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature, between 0 and 2
    #[arg(long, env = "OPENAI_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE, value_parser = parse_temperature)]
    pub temperature: f32,
}

fn parse_temperature(value: &str) -> Result<f32, String> {
    let temperature: f32 = value.parse().map_err(|e| format!("{value} is not a number: {e}"))?;
    if (0.0..=2.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(format!("{temperature} is not between 0 and 2"))
    }
}

impl Cli {
    pub fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig {
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
