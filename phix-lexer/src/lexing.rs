//! Lossless PHP tokenization.
//!
//! Tokenization runs in two stages:
//!
//! 1. Raw lexing with mode-aware logos lexers. See [raw]. Every byte of
//!    the input lands in exactly one token, so concatenating token
//!    contents reproduces the source.
//! 2. Context transformation. See [crate::transform]. Transformer passes
//!    retag ambiguous punctuation (`[` as array literal vs index, `use`
//!    as import vs closure capture) into synthetic kinds without touching
//!    content.
//!
//! [`SourceTokenizer`] bundles both stages behind one call and is what the
//! fixing engine uses. [`tokenize_raw`] stops after stage one, which is
//! handy in tests and for syntax-only checks.

pub mod raw;

use std::fmt;

use crate::kind::{KindRegistry, RegistryError};
use crate::stream::TokenStream;
use crate::transform::TransformerPipeline;

/// Errors that can occur during lexing.
///
/// Lines are 1-based and point at the construct's opening, not at the end
/// of input, so `UnterminatedString { line: 2 }` names the line the quote
/// was opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnterminatedString { line: u32 },
    UnterminatedComment { line: u32 },
    UnterminatedHeredoc { line: u32 },
    UnexpectedCharacter { found: char, line: u32 },
}

impl LexError {
    /// Line the error was detected on.
    pub fn line(&self) -> u32 {
        match self {
            LexError::UnterminatedString { line }
            | LexError::UnterminatedComment { line }
            | LexError::UnterminatedHeredoc { line }
            | LexError::UnexpectedCharacter { line, .. } => *line,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnterminatedString { line } => {
                write!(f, "unterminated string starting on line {}", line)
            }
            LexError::UnterminatedComment { line } => {
                write!(f, "unterminated comment starting on line {}", line)
            }
            LexError::UnterminatedHeredoc { line } => {
                write!(f, "unterminated heredoc starting on line {}", line)
            }
            LexError::UnexpectedCharacter { found, line } => {
                write!(f, "unexpected character {:?} on line {}", found, line)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Lexes `source` without running transformers.
pub fn tokenize_raw(source: &str, registry: &KindRegistry) -> Result<TokenStream, LexError> {
    Ok(TokenStream::from_tokens(raw::lex(source, registry)?))
}

/// The full tokenizer: raw lexing followed by the standard transformer
/// pipeline.
///
/// Building one registers every transformer's synthetic kinds with the
/// registry; a collision there is a bug in the pipeline itself, so it
/// surfaces as an error at construction time rather than per file.
#[derive(Debug)]
pub struct SourceTokenizer {
    registry: KindRegistry,
    pipeline: TransformerPipeline,
}

impl SourceTokenizer {
    pub fn new() -> Result<Self, RegistryError> {
        let mut registry = KindRegistry::new();
        let pipeline = TransformerPipeline::standard(&mut registry)?;
        Ok(SourceTokenizer { registry, pipeline })
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Tokenizes and transforms `source` into a mutable stream.
    pub fn tokenize(&self, source: &str) -> Result<TokenStream, LexError> {
        let mut stream = tokenize_raw(source, &self.registry)?;
        self.pipeline.apply(&mut stream);
        stream.clear_changed();
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::TokenKind as K;

    #[test]
    fn tokenizer_applies_transformers() {
        let tokenizer = SourceTokenizer::new().unwrap();
        let stream = tokenizer.tokenize("<?php function f(): array { return [1]; }").unwrap();
        let kinds: Vec<_> = stream.iter().map(|t| t.kind()).collect();
        assert!(kinds.contains(&K::ArrayTypehint));
        assert!(kinds.contains(&K::ArraySquareOpen));
        assert!(kinds.contains(&K::ArraySquareClose));
    }

    #[test]
    fn raw_tokenization_skips_transformers() {
        let registry = KindRegistry::new();
        let stream = tokenize_raw("<?php $a = [1];", &registry).unwrap();
        let kinds: Vec<_> = stream.iter().map(|t| t.kind()).collect();
        assert!(kinds.contains(&K::SquareOpen));
        assert!(!kinds.contains(&K::ArraySquareOpen));
    }

    #[test]
    fn tokenize_starts_with_a_clean_change_flag() {
        let tokenizer = SourceTokenizer::new().unwrap();
        let stream = tokenizer.tokenize("<?php $a = [1];").unwrap();
        assert!(!stream.is_changed());
    }

    #[test]
    fn lex_errors_carry_lines() {
        let tokenizer = SourceTokenizer::new().unwrap();
        let err = tokenizer.tokenize("<?php\n\n$a = 'nope").unwrap_err();
        assert_eq!(err.line(), 3);
        assert!(err.to_string().contains("line 3"));
    }
}
