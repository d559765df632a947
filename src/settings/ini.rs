//! INI settings file parsing and serialization.
//!
//! # Format
//! ```text
//! # full-line comment
//! [SHINOBI]
//! base_url = http://nvr.lan   ; inline comment
//! port: 8080
//! ```
//!
//! - Section names and keys are case-insensitive; keys are stored lower-case.
//! - `=` or `:` separates key and value; both sides are trimmed.
//! - `#` and `;` start a comment at line start, or inline after whitespace.
//! - Indented lines continue the previous value.
//! - Comments are not preserved when the document is written back.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A malformed line in a settings file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IniError {
    #[error("line {line}: key outside of any section")]
    MissingSection { line: usize },

    #[error("line {line}: expected `key = value`")]
    MissingDelimiter { line: usize },

    #[error("line {line}: unterminated section header")]
    BadHeader { line: usize },

    #[error("line {line}: duplicate section [{section}]")]
    DuplicateSection { line: usize, section: String },

    #[error("line {line}: duplicate key {key} in [{section}]")]
    DuplicateKey {
        line: usize,
        section: String,
        key: String,
    },
}

/// One `[section]` of the document, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Name as written in the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = normalize_key(key);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn set(&mut self, key: &str, value: &str) {
        let key = normalize_key(key);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((key, value.to_string())),
        }
    }
}

/// In-memory settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn same_section(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Strip an inline comment: `#` or `;` preceded by whitespace.
fn strip_inline_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if (*b == b'#' || *b == b';') && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return &line[..i];
        }
    }
    line
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut doc = Self::new();
        // (section index, key) of the last value, for continuation lines
        let mut last: Option<(usize, String)> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                last = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let content = strip_inline_comment(raw).trim_end();
            let continues = raw.starts_with(|c: char| c.is_whitespace());

            if continues {
                if let Some((section, key)) = &last {
                    let entry = doc.sections[*section]
                        .entries
                        .iter_mut()
                        .find(|(k, _)| k == key);
                    if let Some((_, value)) = entry {
                        value.push('\n');
                        value.push_str(content.trim());
                        continue;
                    }
                }
            }

            let content = content.trim();
            if let Some(header) = content.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or(IniError::BadHeader { line: line_no })?
                    .trim();
                if doc.section(name).is_some() {
                    return Err(IniError::DuplicateSection {
                        line: line_no,
                        section: name.to_string(),
                    });
                }
                doc.sections.push(IniSection::new(name));
                last = None;
                continue;
            }

            let split = content
                .find(['=', ':'])
                .ok_or(IniError::MissingDelimiter { line: line_no })?;
            let key = normalize_key(&content[..split]);
            let value = content[split + 1..].trim();

            let section_idx = doc
                .sections
                .len()
                .checked_sub(1)
                .ok_or(IniError::MissingSection { line: line_no })?;
            let section = &mut doc.sections[section_idx];
            if section.get(&key).is_some() {
                return Err(IniError::DuplicateKey {
                    line: line_no,
                    section: section.name.clone(),
                    key,
                });
            }
            section.entries.push((key.clone(), value.to_string()));
            last = Some((section_idx, key));
        }

        Ok(doc)
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| same_section(&s.name, name))
    }

    pub fn sections(&self) -> impl Iterator<Item = &IniSection> {
        self.sections.iter()
    }

    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// Set a value, creating the section when needed.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let idx = match self.sections.iter().position(|s| same_section(&s.name, section)) {
            Some(idx) => idx,
            None => {
                self.sections.push(IniSection::new(section.trim()));
                self.sections.len() - 1
            }
        };
        self.sections[idx].set(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// True when `value`, written as an entry and parsed back, reads as the
/// same string. Fails for inline comment markers after whitespace and for
/// surrounding whitespace.
pub fn survives_write(value: &str) -> bool {
    let mut doc = IniDocument::new();
    doc.set("check", "value", value);
    IniDocument::parse(&doc.to_string())
        .map(|parsed| parsed.get("check", "value") == Some(value))
        .unwrap_or(false)
}

impl FromStr for IniDocument {
    type Err = IniError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                let mut lines = value.split('\n');
                writeln!(f, "{} = {}", key, lines.next().unwrap_or_default())?;
                for continuation in lines {
                    writeln!(f, "\t{}", continuation)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
