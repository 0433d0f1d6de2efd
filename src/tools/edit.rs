// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Edit engine
//!
//! Applies one structural edit to file content held in memory. Every anchor
//! must resolve to exactly one target: a substring for `replace`, a line for
//! the line-targeting modes. Zero matches and multiple matches are both
//! errors, and on any error the caller's content is left as it was.
//!
//! Content is treated as lines joined by a single separator, `\r\n` when the
//! content contains one and `\n` otherwise. A trailing separator terminates
//! the last line and is kept in the output.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The structural change an [`EditInstruction`] performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Replace,
    InsertAfter,
    InsertBefore,
    Append,
    Prepend,
    DeleteLine,
}

impl EditMode {
    pub const ALL: [EditMode; 6] = [
        EditMode::Replace,
        EditMode::InsertAfter,
        EditMode::InsertBefore,
        EditMode::Append,
        EditMode::Prepend,
        EditMode::DeleteLine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Replace => "replace",
            EditMode::InsertAfter => "insert_after",
            EditMode::InsertBefore => "insert_before",
            EditMode::Append => "append",
            EditMode::Prepend => "prepend",
            EditMode::DeleteLine => "delete_line",
        }
    }

    /// Modes that act on a single line located by number or substring
    pub fn targets_line(&self) -> bool {
        matches!(
            self,
            EditMode::InsertAfter | EditMode::InsertBefore | EditMode::DeleteLine
        )
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditMode {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| EditError::InvalidMode(s.to_string()))
    }
}

/// One edit to apply to file content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditInstruction {
    pub mode: EditMode,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
    /// 1-based; takes priority over `old_text` for line-targeting modes
    pub line_number: Option<usize>,
}

impl EditInstruction {
    pub fn new(mode: EditMode) -> Self {
        Self {
            mode,
            old_text: None,
            new_text: None,
            line_number: None,
        }
    }

    pub fn replace(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self::new(EditMode::Replace)
            .with_old_text(old_text)
            .with_new_text(new_text)
    }

    pub fn with_old_text(mut self, old_text: impl Into<String>) -> Self {
        self.old_text = Some(old_text.into());
        self
    }

    pub fn with_new_text(mut self, new_text: impl Into<String>) -> Self {
        self.new_text = Some(new_text.into());
        self
    }

    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    fn require_new_text(&self) -> Result<&str, EditError> {
        self.new_text.as_deref().ok_or(EditError::MissingField {
            field: "new_text",
            mode: self.mode,
        })
    }
}

/// Why an edit was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("{field} is required for {mode} mode")]
    MissingField { field: &'static str, mode: EditMode },

    #[error("old_text must not be empty")]
    EmptyAnchor,

    #[error("old_text and new_text are identical, nothing to change")]
    Unchanged,

    #[error("old_text not found in file")]
    NotFound,

    #[error("ambiguous edit: old_text matches {count} times, expected exactly 1 occurrence")]
    Ambiguous { count: usize },

    #[error("line_number {line} is out of range (1-{count})")]
    LineOutOfRange { line: usize, count: usize },

    #[error(
        "invalid mode '{0}': expected one of replace, insert_after, insert_before, append, prepend, delete_line"
    )]
    InvalidMode(String),
}

/// Content split into lines, remembering how to put it back together
struct Lines<'a> {
    lines: Vec<&'a str>,
    separator: &'static str,
    terminated: bool,
}

impl<'a> Lines<'a> {
    fn split(content: &'a str) -> Self {
        let separator = if content.contains("\r\n") { "\r\n" } else { "\n" };
        if content.is_empty() {
            return Self {
                lines: Vec::new(),
                separator,
                terminated: false,
            };
        }

        let (body, terminated) = match content.strip_suffix(separator) {
            Some(body) => (body, true),
            None => (content, false),
        };
        Self {
            lines: body.split(separator).collect(),
            separator,
            terminated,
        }
    }

    fn join(&self) -> String {
        let mut out = self.lines.join(self.separator);
        if self.terminated && !self.lines.is_empty() {
            out.push_str(self.separator);
        }
        out
    }

    /// Resolve the 0-based index of the single line an instruction targets
    fn locate(&self, instruction: &EditInstruction) -> Result<usize, EditError> {
        if let Some(line) = instruction.line_number {
            let count = self.lines.len();
            if line == 0 || line > count {
                return Err(EditError::LineOutOfRange { line, count });
            }
            return Ok(line - 1);
        }

        let needle = instruction
            .old_text
            .as_deref()
            .ok_or(EditError::MissingField {
                field: "old_text or line_number",
                mode: instruction.mode,
            })?;
        if needle.is_empty() {
            return Err(EditError::EmptyAnchor);
        }

        let mut matches = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.contains(needle))
            .map(|(index, _)| index);
        match (matches.next(), matches.count()) {
            (None, _) => Err(EditError::NotFound),
            (Some(index), 0) => Ok(index),
            (Some(_), rest) => Err(EditError::Ambiguous { count: rest + 1 }),
        }
    }
}

/// Apply `instruction` to `content`, returning the complete new content.
pub fn apply_edit(content: &str, instruction: &EditInstruction) -> Result<String, EditError> {
    let mut lines = Lines::split(content);
    match instruction.mode {
        EditMode::Replace => return replace_unique(content, instruction),
        EditMode::Append => {
            let new_text = instruction.require_new_text()?;
            lines.lines.push(new_text);
        }
        EditMode::Prepend => {
            let new_text = instruction.require_new_text()?;
            lines.lines.insert(0, new_text);
        }
        EditMode::InsertAfter => {
            let new_text = instruction.require_new_text()?;
            let index = lines.locate(instruction)?;
            lines.lines.insert(index + 1, new_text);
        }
        EditMode::InsertBefore => {
            let new_text = instruction.require_new_text()?;
            let index = lines.locate(instruction)?;
            lines.lines.insert(index, new_text);
        }
        EditMode::DeleteLine => {
            let index = lines.locate(instruction)?;
            lines.lines.remove(index);
        }
    }
    Ok(lines.join())
}

fn replace_unique(content: &str, instruction: &EditInstruction) -> Result<String, EditError> {
    let old_text = instruction.old_text.as_deref().ok_or(EditError::MissingField {
        field: "old_text",
        mode: EditMode::Replace,
    })?;
    let new_text = instruction.require_new_text()?;

    if old_text.is_empty() {
        return Err(EditError::EmptyAnchor);
    }
    if old_text == new_text {
        return Err(EditError::Unchanged);
    }

    match content.matches(old_text).count() {
        0 => Err(EditError::NotFound),
        1 => Ok(content.replacen(old_text, new_text, 1)),
        count => Err(EditError::Ambiguous { count }),
    }
}
