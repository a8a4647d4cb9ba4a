use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::prompt::PartialPrompt;

pub trait FillPlaceholders {
    fn placeholders_to_fill(&self) -> &Vec<String>;
}

pub trait Fill: FillPlaceholders {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}

pub trait FillWith<CTX>: FillPlaceholders {
    fn fill_with(&self, partial_prompt: &mut PartialPrompt, context: CTX) -> Result<CTX>;
}

impl<T: FillWith<()>> Fill for T {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        self.fill_with(partial_prompt, ())
    }
}

/// Named values for the placeholders of one or more templates, e.g. `{"question": "..."}`.
///
/// As a filler, it fills every placeholder of a partial prompt that it has a value for and
/// ignores the rest, so one set of inputs can be applied to all messages of a chat template.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PromptInputs {
    values: BTreeMap<String, String>,
    #[serde(skip)]
    names: Vec<String>,
}

impl PromptInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous value for the same placeholder.
    pub fn with(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(placeholder, value);
        self
    }

    pub fn insert(&mut self, placeholder: impl Into<String>, value: impl Into<String>) {
        let placeholder = placeholder.into();
        if self.values.insert(placeholder.clone(), value.into()).is_none() {
            self.names.push(placeholder);
        }
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.values.get(placeholder).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Equal when the values are, regardless of insertion order.
impl PartialEq for PromptInputs {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for PromptInputs {}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for PromptInputs {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().fold(Self::new(), |inputs, (k, v)| inputs.with(k, v))
    }
}

impl FillPlaceholders for PromptInputs {
    fn placeholders_to_fill(&self) -> &Vec<String> {
        &self.names
    }
}

impl FillWith<()> for PromptInputs {
    fn fill_with(&self, partial_prompt: &mut PartialPrompt, context: ()) -> Result<()> {
        for (placeholder, value) in &self.values {
            if partial_prompt.template.placeholders.contains(placeholder) {
                partial_prompt.try_fill(placeholder.as_str(), value.as_str())?;
            }
        }
        Ok(context)
    }
}

#[cfg(test)]
mod test_filler {
    use super::{Fill, FillPlaceholders, PromptInputs};
    use crate::prompt::PromptTemplate;

    #[test]
    fn test_fill_known_placeholders_only() {
        let inputs = PromptInputs::from([("question", "why?"), ("unused", "x")]);
        let mut partial = PromptTemplate::new("Question:{{question}}").construct_prompt();
        inputs.fill(&mut partial).unwrap();
        assert_eq!("Question:why?", partial.complete().unwrap());
    }

    #[test]
    fn test_missing_value_leaves_placeholder_unfilled() {
        let inputs = PromptInputs::new().with("topic", "rust");
        let mut partial = PromptTemplate::new("Question:{{question}}").construct_prompt();
        inputs.fill(&mut partial).unwrap();
        assert!(partial.is_unfilled("question"));
        assert!(partial.complete().is_err());
    }

    #[test]
    fn test_insert_replaces_value() {
        let inputs = PromptInputs::new().with("question", "a").with("question", "b");
        assert_eq!(Some("b"), inputs.get("question"));
        assert_eq!(&vec!["question".to_string()], inputs.placeholders_to_fill());
        assert_eq!(1, inputs.len());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let ab = PromptInputs::from([("a", "1"), ("b", "2")]);
        let ba = PromptInputs::from([("b", "2"), ("a", "1")]);
        assert_eq!(ab, ba);
        assert_ne!(ab, PromptInputs::from([("a", "1"), ("b", "3")]));
    }

    #[test]
    fn test_serialize_as_map() {
        let inputs = PromptInputs::new().with("question", "hi");
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(serde_json::json!({"question": "hi"}), json);
    }
}
