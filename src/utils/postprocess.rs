//! Post-processing of model replies.

use anyhow::Result;
use async_trait::async_trait;

use crate::chain::Runnable;
use crate::utils::llm::ChatResponse;

/// Takes the text out of a [ChatResponse], unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl StrOutputParser {
    #[inline]
    pub fn parse(&self, response: ChatResponse) -> String {
        response.content
    }
}

#[async_trait]
impl Runnable for StrOutputParser {
    type Input = ChatResponse;
    type Output = String;

    async fn invoke(&self, input: ChatResponse) -> Result<String> {
        Ok(self.parse(input))
    }
}

#[cfg(test)]
mod test_postprocess {
    use super::StrOutputParser;
    use crate::utils::llm::ChatResponse;

    #[test]
    fn test_identity() {
        for text in ["T", "", "  padded\n", "# markdown\n\n* item"] {
            assert_eq!(text, StrOutputParser.parse(ChatResponse::text("m", text)));
        }
    }
}
