//! Line-based terminal prompter

use super::{Choice, Prompter};
use crate::PtmError;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

/// Unreadable answers to a single selection before giving up
const MAX_SELECTION_ATTEMPTS: usize = 5;

/// Prompter reading answers line by line
pub struct TerminalPrompter<R, W> {
    reader: R,
    writer: W,
}

impl TerminalPrompter<BufReader<Stdin>, Stdout> {
    /// Prompter on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, prompt: &str) -> Result<String, PtmError> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(PtmError::Prompt("input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    fn list(&mut self, choices: impl IntoIterator<Item = (String, Option<String>)>) -> Result<(), PtmError> {
        for (index, (text, note)) in choices.into_iter().enumerate() {
            match note {
                Some(note) => writeln!(self.writer, "  {}) {} ({})", index + 1, text, note)?,
                None => writeln!(self.writer, "  {}) {}", index + 1, text)?,
            }
        }
        Ok(())
    }
}

/// Resolve an answer given as a 1-based index or as the exact text
fn pick<'a>(answer: &str, texts: &'a [String]) -> Option<&'a String> {
    match answer.parse::<usize>() {
        Ok(index) if (1..=texts.len()).contains(&index) => texts.get(index - 1),
        _ => texts.iter().find(|t| t.as_str() == answer),
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn input(&mut self, question: &str, default: &str) -> Result<String, PtmError> {
        let prompt = if default.is_empty() {
            format!("{}: ", question)
        } else {
            format!("{} [{}]: ", question, default)
        };

        let answer = self.ask(&prompt)?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    // TODO: switch the terminal to no-echo mode once a tty crate is part of the stack
    fn password(&mut self, question: &str) -> Result<String, PtmError> {
        self.ask(&format!("{}: ", question))
    }

    fn confirm(&mut self, question: &str) -> Result<bool, PtmError> {
        loop {
            let answer = self.ask(&format!("{} [y/n]: ", question))?;
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.writer, "Please answer yes or no.")?,
            }
        }
    }

    fn select(&mut self, question: &str, choices: &[Choice]) -> Result<String, PtmError> {
        if choices.is_empty() {
            return Err(PtmError::Prompt(format!("nothing to choose from: {}", question)));
        }

        let texts: Vec<String> = choices.iter().map(|c| c.text.clone()).collect();
        writeln!(self.writer, "{}", question)?;
        self.list(choices.iter().map(|c| (c.text.clone(), c.note.clone())))?;

        for _ in 0..MAX_SELECTION_ATTEMPTS {
            let answer = self.ask("> ")?;
            if let Some(text) = pick(&answer, &texts) {
                return Ok(text.clone());
            }
            writeln!(self.writer, "Please enter a number between 1 and {}.", texts.len())?;
        }

        Err(PtmError::Prompt(format!("no valid answer to: {}", question)))
    }

    fn multi_select(&mut self, question: &str, choices: &[String]) -> Result<Vec<String>, PtmError> {
        writeln!(self.writer, "{}", question)?;
        self.list(choices.iter().map(|c| (c.clone(), None)))?;

        'attempt: for _ in 0..MAX_SELECTION_ATTEMPTS {
            let answer = self.ask("(comma separated, empty for none) > ")?;
            let mut selected = Vec::new();

            for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                match pick(part, choices) {
                    Some(text) if !selected.contains(text) => selected.push(text.clone()),
                    Some(_) => {}
                    None => {
                        writeln!(self.writer, "Unknown choice `{}`.", part)?;
                        continue 'attempt;
                    }
                }
            }

            return Ok(selected);
        }

        Err(PtmError::Prompt(format!("no valid answer to: {}", question)))
    }

    fn message(&mut self, text: &str) {
        // a closed stdout leaves nobody to tell
        let _ = writeln!(self.writer, "{}", text);
    }
}
