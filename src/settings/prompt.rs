//! Operator prompts for missing required settings.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::settings::schema::EntryType;

/// Asks the operator for a value.
pub trait Prompter {
    /// Ask for `section` `key` and return the raw answer.
    fn ask(&mut self, section: &str, key: &str, ty: EntryType) -> io::Result<String>;
}

/// Prompts on stdout and reads one line from stdin. Blocks until the
/// operator answers.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for ConsolePrompter {
    fn ask(&mut self, section: &str, key: &str, ty: EntryType) -> io::Result<String> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        ask_line(&mut stdin.lock(), &mut stdout, section, key, ty)
    }
}

/// Write the prompt to `output` and read one answer line from `input`.
pub fn ask_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    section: &str,
    key: &str,
    ty: EntryType,
) -> io::Result<String> {
    write!(
        output,
        "Required {} {} ({}) not found in your settings file, please insert it: ",
        section, key, ty
    )?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no input available",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Refuses every prompt; for unattended runs where a missing value must
/// abort startup.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn ask(&mut self, section: &str, key: &str, _ty: EntryType) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{} {} is missing and prompting is disabled", section, key),
        ))
    }
}

/// Answers prompts from a fixed list, recording the questions asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<(String, String)>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// `(section, key)` pairs asked so far, in order.
    pub fn asked(&self) -> &[(String, String)] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, section: &str, key: &str, _ty: EntryType) -> io::Result<String> {
        self.asked.push((section.to_string(), key.to_string()));
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left")
        })
    }
}
