use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use log::{debug, info, warn};

use crate::chain::Runnable;
use crate::chat::{ChatMessage, Role};
use crate::config::Credentials;
use crate::utils::llm::{ChatResponse, MalformedResponse, TokenUsage};
use crate::utils::token::tiktoken::{Tiktoken, MODEL_TO_MAX_TOKENS};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Settings of a chat completion request that stay fixed for the lifetime of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// A chat model served by the OpenAI chat completions API.
///
/// Retries, authentication and HTTP handling are left to [async_openai]; any failure is returned
/// to the caller unchanged.
#[derive(Clone)]
pub struct OpenAIChat {
    pub client: Client<OpenAIConfig>,
    pub config: ConversationConfig,
    tokenizer: Option<Tiktoken>,
}

impl OpenAIChat {
    pub fn new(client: Client<OpenAIConfig>, config: ConversationConfig) -> Self {
        let tokenizer = match Tiktoken::new(config.model.as_str()) {
            Ok(tokenizer) => Some(tokenizer),
            Err(e) => {
                info!("Prompt token estimation disabled for model {}: {}", config.model, e);
                None
            }
        };
        Self {
            client,
            config,
            tokenizer,
        }
    }

    /// Build a client from the loaded credentials.
    pub fn from_credentials(credentials: &Credentials, config: ConversationConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(credentials.openai_api_key.as_str());
        if let Some(api_base) = &credentials.openai_api_base {
            openai_config = openai_config.with_api_base(api_base.as_str());
        }
        Self::new(Client::with_config(openai_config), config)
    }

    fn estimate_prompt_tokens(&self, messages: &[ChatMessage]) {
        let Some(tokenizer) = &self.tokenizer else {
            return;
        };
        let estimate = tokenizer.count_prompt_tokens(messages);
        debug!("Estimated {} prompt tokens for model {}", estimate, self.config.model);
        if let Some(max_tokens) = MODEL_TO_MAX_TOKENS.get(self.config.model.as_str()) {
            if estimate > *max_tokens {
                warn!("Estimated {} prompt tokens exceed the {} token context window of {}", estimate, max_tokens, self.config.model);
            }
        }
    }
}

pub(crate) fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.as_str();
    let request_message = match message.role {
        Role::System => {
            let mut args = ChatCompletionRequestSystemMessageArgs::default();
            args.content(content);
            if let Some(name) = &message.name {
                args.name(name.as_str());
            }
            ChatCompletionRequestMessage::System(args.build()?)
        }
        Role::User => {
            let mut args = ChatCompletionRequestUserMessageArgs::default();
            args.content(content);
            if let Some(name) = &message.name {
                args.name(name.as_str());
            }
            ChatCompletionRequestMessage::User(args.build()?)
        }
        Role::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            args.content(content);
            if let Some(name) = &message.name {
                args.name(name.as_str());
            }
            ChatCompletionRequestMessage::Assistant(args.build()?)
        }
    };
    Ok(request_message)
}

pub(crate) fn from_completion(response: CreateChatCompletionResponse) -> Result<ChatResponse> {
    let usage = response.usage.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });
    let choice = response.choices.into_iter().next().ok_or_else(|| MalformedResponse {
        reason: "the completion has no choices".to_string(),
    })?;
    let finish_reason = choice
        .finish_reason
        .and_then(|reason| serde_json::to_value(reason).ok())
        .and_then(|value| value.as_str().map(str::to_string));
    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        model: response.model,
        finish_reason,
        usage,
    })
}

#[async_trait]
impl Runnable for OpenAIChat {
    type Input = Vec<ChatMessage>;
    type Output = ChatResponse;

    async fn invoke(&self, input: Vec<ChatMessage>) -> Result<ChatResponse> {
        self.estimate_prompt_tokens(&input);
        let messages = input.iter().map(to_request_message).collect::<Result<Vec<_>>>()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.config.model.as_str())
            .temperature(self.config.temperature)
            .messages(messages)
            .build()?;
        let response = self.client.chat().create(request).await?;
        let response = from_completion(response)?;
        if let Some(usage) = &response.usage {
            debug!("{} used {} prompt + {} completion tokens", response.model, usage.prompt_tokens, usage.completion_tokens);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod test_openai {
    use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionRequestUserMessageContent, CreateChatCompletionResponse};
    use serde_json::json;

    use super::{from_completion, to_request_message, ConversationConfig};
    use crate::chat::ChatMessage;
    use crate::utils::llm::{MalformedResponse, TokenUsage};

    fn completion(choices: serde_json::Value) -> CreateChatCompletionResponse {
        serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-3.5-turbo-0125",
            "choices": choices,
            "usage": {"prompt_tokens": 30, "completion_tokens": 5, "total_tokens": 35}
        }))
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ConversationConfig::default();
        assert_eq!("gpt-3.5-turbo", config.model);
        assert_eq!(0.7, config.temperature);
    }

    #[test]
    fn test_request_messages() {
        match to_request_message(&ChatMessage::system("be nice")).unwrap() {
            ChatCompletionRequestMessage::System(message) => assert_eq!("be nice", message.content),
            other => panic!("unexpected message {:?}", other),
        }
        match to_request_message(&ChatMessage::user("Question:")).unwrap() {
            ChatCompletionRequestMessage::User(message) => match message.content {
                ChatCompletionRequestUserMessageContent::Text(text) => assert_eq!("Question:", text),
                other => panic!("unexpected content {:?}", other),
            },
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_content_is_copied_verbatim() {
        let response = completion(json!([{
            "index": 0,
            "message": {"role": "assistant", "content": "  T \n"},
            "finish_reason": "stop"
        }]));
        let response = from_completion(response).unwrap();
        assert_eq!("  T \n", response.content);
        assert_eq!("gpt-3.5-turbo-0125", response.model);
        assert_eq!(Some("stop".to_string()), response.finish_reason);
        assert_eq!(Some(TokenUsage { prompt_tokens: 30, completion_tokens: 5, total_tokens: 35 }), response.usage);
    }

    #[test]
    fn test_null_content_is_empty() {
        let response = completion(json!([{
            "index": 0,
            "message": {"role": "assistant", "content": null},
            "finish_reason": "stop"
        }]));
        assert_eq!("", from_completion(response).unwrap().content);
    }

    #[test]
    fn test_no_choices() {
        let err = from_completion(completion(json!([]))).unwrap_err();
        assert!(err.downcast_ref::<MalformedResponse>().is_some());
    }
}
