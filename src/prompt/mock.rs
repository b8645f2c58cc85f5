//! Scripted prompter for testing
//!
//! Answers are consumed in order; a question asked with no matching answer
//! queued fails with [`PtmError::Prompt`].

use super::{Choice, Prompter};
use crate::PtmError;
use std::collections::VecDeque;

/// One queued answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Free text (also used for passwords)
    Text(String),
    /// Accept the default of a free text question
    Default,
    Confirm(bool),
    Select(String),
    MultiSelect(Vec<String>),
}

/// Prompter replaying a fixed script
///
/// # Example
/// ```
/// use ptm_rs::prompt::{Prompter, mock::ScriptedPrompter};
///
/// let mut prompter = ScriptedPrompter::new().text("9001").confirm(false);
/// assert_eq!(prompter.input("Identifier", "9000").unwrap(), "9001");
/// assert!(!Prompter::confirm(&mut prompter, "Resize?").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    questions: Vec<String>,
    messages: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, answer: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Text(answer.into()));
        self
    }

    pub fn default_answer(mut self) -> Self {
        self.answers.push_back(Answer::Default);
        self
    }

    pub fn confirm(mut self, answer: bool) -> Self {
        self.answers.push_back(Answer::Confirm(answer));
        self
    }

    pub fn select(mut self, answer: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Select(answer.into()));
        self
    }

    pub fn multi_select(mut self, answers: &[&str]) -> Self {
        self.answers.push_back(Answer::MultiSelect(
            answers.iter().map(|a| a.to_string()).collect(),
        ));
        self
    }

    /// Every question asked so far, in order
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Every message shown so far, in order
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, question: &str) -> Result<Answer, PtmError> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| PtmError::Prompt(format!("no scripted answer for: {}", question)))
    }

    fn mismatch(question: &str, answer: &Answer) -> PtmError {
        PtmError::Prompt(format!("unexpected answer {:?} for: {}", answer, question))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, question: &str, default: &str) -> Result<String, PtmError> {
        match self.next(question)? {
            Answer::Text(text) => Ok(text),
            Answer::Default => Ok(default.to_string()),
            other => Err(Self::mismatch(question, &other)),
        }
    }

    fn password(&mut self, question: &str) -> Result<String, PtmError> {
        match self.next(question)? {
            Answer::Text(text) => Ok(text),
            other => Err(Self::mismatch(question, &other)),
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool, PtmError> {
        match self.next(question)? {
            Answer::Confirm(value) => Ok(value),
            other => Err(Self::mismatch(question, &other)),
        }
    }

    fn select(&mut self, question: &str, choices: &[Choice]) -> Result<String, PtmError> {
        match self.next(question)? {
            Answer::Select(text) if choices.iter().any(|c| c.text == text) => Ok(text),
            other => Err(Self::mismatch(question, &other)),
        }
    }

    fn multi_select(&mut self, question: &str, choices: &[String]) -> Result<Vec<String>, PtmError> {
        match self.next(question)? {
            Answer::MultiSelect(selected) if selected.iter().all(|s| choices.contains(s)) => {
                Ok(selected)
            }
            other => Err(Self::mismatch(question, &other)),
        }
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_in_order() {
        let mut prompter = ScriptedPrompter::new()
            .default_answer()
            .select("local-lvm")
            .multi_select(&["a.pub"]);

        assert_eq!(prompter.input("Name", "ptm-template").unwrap(), "ptm-template");
        assert_eq!(
            Prompter::select(&mut prompter, "Storage", &[Choice::new("local-lvm")]).unwrap(),
            "local-lvm"
        );
        assert_eq!(
            Prompter::multi_select(&mut prompter, "Keys", &["a.pub".to_string()]).unwrap(),
            vec!["a.pub"]
        );
        assert_eq!(prompter.questions().len(), 3);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script() {
        let mut prompter = ScriptedPrompter::new();
        assert!(matches!(Prompter::confirm(&mut prompter, "Resize?"), Err(PtmError::Prompt(_))));
    }

    #[test]
    fn test_selection_must_be_offered() {
        let mut prompter = ScriptedPrompter::new().select("zfs");
        assert!(Prompter::select(&mut prompter, "Storage", &[Choice::new("local-lvm")]).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let mut prompter = ScriptedPrompter::new().confirm(true);
        assert!(prompter.input("Name", "").is_err());
    }
}
