use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub const PLACEHOLDER: &str = "{userInput}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    TemplateNotFound(String),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::TemplateNotFound(page) =>
                write!(f, "Page '{}' has no prompt template", page),
        }
    }
}

impl Error for PromptError {}

/// How user input is joined to a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// First `{userInput}` is replaced; without a placeholder the input is dropped.
    Substitution,
    /// Input follows the template after a blank line.
    Concatenation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: Cow<'static, str>,
}

impl PromptTemplate {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn contains_placeholder(&self) -> bool {
        self.text.contains(PLACEHOLDER)
    }

    pub fn bind(&self, mode: BindMode, input: &str) -> String {
        match mode {
            BindMode::Substitution => self.substitute(input),
            BindMode::Concatenation => self.concatenate(input),
        }
    }

    /// User input is inserted as-is, without escaping.
    pub fn substitute(&self, input: &str) -> String {
        self.text.replacen(PLACEHOLDER, input, 1)
    }

    pub fn concatenate(&self, content: &str) -> String {
        format!("{}\n\n{}", self.text, content)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&'static str> for PromptTemplate {
    fn from(text: &'static str) -> Self {
        Self::new(text)
    }
}
