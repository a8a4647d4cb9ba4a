use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;

use anyhow::Result;
use lazy_static::lazy_static;
pub use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::chat::ChatMessage;
use crate::utils::token::CountToken;

const TOKENS_PER_MESSAGE: usize = 3;
const TOKENS_PER_NAME: usize = 1;
/// Every reply is primed with `<|start|>assistant<|message|>`.
const TOKENS_PER_REPLY_PRIMER: usize = 3;

lazy_static! {
    /// const map from model name to max tokens.
    pub static ref MODEL_TO_MAX_TOKENS: HashMap<&'static str, usize> = HashMap::from([
        ("gpt-4", 8192),
        ("gpt-4-0613", 8192),
        ("gpt-4-32k", 32768),
        ("gpt-4-32k-0613", 32768),
        ("gpt-3.5-turbo", 16385),
        ("gpt-3.5-turbo-0125", 16385),
        ("gpt-3.5-turbo-1106", 16385),
        ("gpt-3.5-turbo-16k", 16384),
        ("gpt-3.5-turbo-0613", 4096),
        ("gpt-3.5-turbo-16k-0613", 16384),
    ]);
}

/// Error when no tokenizer is known for a model.
#[derive(Debug, Clone)]
pub struct UnsupportedModel {
    pub model: String,
}

impl fmt::Display for UnsupportedModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UnsupportedModel: no tokenizer is known for model {}", self.model)
    }
}

impl Error for UnsupportedModel {}

/// Counter using the Tiktoken tokenizer.
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The model family of the tokenizer. read-only.
    #[readonly]
    pub model: String,
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter for a model listed in [MODEL_TO_MAX_TOKENS].
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        if !MODEL_TO_MAX_TOKENS.contains_key(model.as_str()) {
            return Err(UnsupportedModel { model }.into());
        }
        let family = if model.starts_with("gpt-4-32k") {
            "gpt-4-32k"
        } else if model.starts_with("gpt-4") {
            "gpt-4"
        } else {
            "gpt-3.5-turbo"
        };
        let bpe = get_bpe_from_model(family)?;
        Ok(Tiktoken {
            model: family.to_string(),
            bpe,
        })
    }

    /// Count the number of tokens in a chat message, following the OpenAI cookbook.
    pub fn count_msg_token(&self, msg: &ChatMessage) -> usize {
        let name_token_count = msg.name.as_ref().map_or(0, |name| self.count_token(name) + TOKENS_PER_NAME);
        self.count_token(msg.role.as_str()) + self.count_token(msg.content.as_str()) + name_token_count + TOKENS_PER_MESSAGE
    }

    /// Estimate the prompt tokens of a whole request.
    pub fn count_prompt_tokens(&self, messages: &[ChatMessage]) -> usize {
        messages.iter().map(|msg| self.count_msg_token(msg)).sum::<usize>() + TOKENS_PER_REPLY_PRIMER
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}

#[cfg(test)]
mod test_tiktoken {
    use super::{Tiktoken, UnsupportedModel};
    use crate::chat::ChatMessage;
    use crate::utils::token::CountToken;

    #[test]
    fn test_unsupported_model() {
        let err = Tiktoken::new("my-local-llama").err().unwrap();
        assert_eq!("my-local-llama", err.downcast_ref::<UnsupportedModel>().unwrap().model);
    }

    #[test]
    fn test_message_overhead() {
        let tiktoken = Tiktoken::new("gpt-3.5-turbo").unwrap();
        let msg = ChatMessage::user("hello");
        let expected = tiktoken.count_token("user") + tiktoken.count_token("hello") + 3;
        assert_eq!(expected, tiktoken.count_msg_token(&msg));

        let mut named = msg.clone();
        named.name = Some("alice".to_string());
        assert_eq!(expected + tiktoken.count_token("alice") + 1, tiktoken.count_msg_token(&named));
    }

    #[test]
    fn test_prompt_tokens() {
        let tiktoken = Tiktoken::new("gpt-4").unwrap();
        let messages = vec![ChatMessage::system("Be helpful."), ChatMessage::user("Question:")];
        let per_message: usize = messages.iter().map(|m| tiktoken.count_msg_token(m)).sum();
        assert_eq!(per_message + 3, tiktoken.count_prompt_tokens(&messages));
    }
}
