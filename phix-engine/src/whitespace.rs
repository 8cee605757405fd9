//! Whitespace conventions shared by whitespace-aware fixers.

use std::fmt;

/// The indentation unit and line ending a project uses. Fixers that insert
/// whitespace receive one of these instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitespaceConfig {
    indent: String,
    line_ending: String,
}

/// Rejected indent or line-ending strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitespaceError {
    BadIndent(String),
    BadLineEnding(String),
}

impl fmt::Display for WhitespaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhitespaceError::BadIndent(s) => {
                write!(f, "indent must be spaces or tabs, got {s:?}")
            }
            WhitespaceError::BadLineEnding(s) => {
                write!(f, "line ending must be \"\\n\" or \"\\r\\n\", got {s:?}")
            }
        }
    }
}

impl std::error::Error for WhitespaceError {}

impl WhitespaceConfig {
    pub fn new(indent: &str, line_ending: &str) -> Result<Self, WhitespaceError> {
        if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(WhitespaceError::BadIndent(indent.to_string()));
        }
        if line_ending != "\n" && line_ending != "\r\n" {
            return Err(WhitespaceError::BadLineEnding(line_ending.to_string()));
        }
        Ok(Self {
            indent: indent.to_string(),
            line_ending: line_ending.to_string(),
        })
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    pub fn line_ending(&self) -> &str {
        &self.line_ending
    }
}

impl Default for WhitespaceConfig {
    /// Four spaces and `\n`, the dominant PHP convention.
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            line_ending: "\n".to_string(),
        }
    }
}
