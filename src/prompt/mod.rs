//! Operator dialogue
//!
//! The resolver talks to the operator only through [`Prompter`], so the same
//! repair logic runs against a real terminal or a scripted test double.

pub mod mock;
mod terminal;

pub use terminal::TerminalPrompter;

use crate::PtmError;

/// One entry of a selection list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub note: Option<String>,
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Questions the resolver can ask
pub trait Prompter {
    /// Free text; an empty answer yields `default`
    fn input(&mut self, question: &str, default: &str) -> Result<String, PtmError>;

    /// Free text that should not be echoed back
    fn password(&mut self, question: &str) -> Result<String, PtmError>;

    /// Yes/no question
    fn confirm(&mut self, question: &str) -> Result<bool, PtmError>;

    /// Pick exactly one of `choices`, returning its text
    fn select(&mut self, question: &str, choices: &[Choice]) -> Result<String, PtmError>;

    /// Pick any number of `choices`
    fn multi_select(&mut self, question: &str, choices: &[String]) -> Result<Vec<String>, PtmError>;

    /// Tell the operator something (typically why an answer was rejected)
    fn message(&mut self, text: &str);
}
