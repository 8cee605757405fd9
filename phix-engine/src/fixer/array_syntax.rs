//! Converts between the two array literal notations.

use phix_lexer::stream::BlockKind;
use phix_lexer::{Token, TokenKind, TokenStream};

use crate::fixer::{ConfigurableFixer, ConfigurationError, Fixer, FixerError, FixerOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Short,
    Long,
}

/// Rewrites `array(...)` as `[...]` or back, `short` by default.
///
/// Only array constructors move; index accesses, destructuring brackets
/// and `array` typehints are different kinds and never match. A member
/// named `array` (PHP allows `$x->array()`) is left alone.
pub struct ArraySyntaxFixer {
    syntax: Syntax,
}

impl ArraySyntaxFixer {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Short,
        }
    }

    fn to_short(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            if !stream[index].is_kind(TokenKind::Array) || is_member_name(stream, index) {
                continue;
            }
            let open = match stream.next_meaningful(index) {
                Some(open) if stream[open].is_kind(TokenKind::ParenOpen) => open,
                _ => continue,
            };
            let close = stream.find_block_end(BlockKind::Paren, open)?;
            stream.replace_at(open, TokenKind::ArraySquareOpen, "[");
            stream.replace_at(close, TokenKind::ArraySquareClose, "]");
            stream.clear_and_merge_surrounding_whitespace(index);
        }
        Ok(())
    }

    fn to_long(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        // Replacing `[` with two tokens shifts everything after it, so walk
        // backwards to keep unvisited indices valid.
        for index in (0..stream.len()).rev() {
            if !stream[index].is_kind(TokenKind::ArraySquareOpen) {
                continue;
            }
            let close = stream.find_block_end(BlockKind::ArraySquare, index)?;
            let line = stream[index].line();
            stream.replace_at(close, TokenKind::ParenClose, ")");
            stream.override_range(
                index..index + 1,
                vec![
                    Token::new(TokenKind::Array, "array", line),
                    Token::new(TokenKind::ParenOpen, "(", line),
                ],
            );
        }
        Ok(())
    }
}

impl Default for ArraySyntaxFixer {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the token at `index` names a class member rather than a
/// construct of its own, as in `$x->list(...)` or `Foo::array(...)`.
pub(crate) fn is_member_name(stream: &TokenStream, index: usize) -> bool {
    stream.prev_meaningful(index).map_or(false, |prev| {
        matches!(
            stream[prev].kind(),
            TokenKind::Arrow
                | TokenKind::NullsafeArrow
                | TokenKind::DoubleColon
                | TokenKind::Function
        )
    })
}

impl Fixer for ArraySyntaxFixer {
    fn name(&self) -> &'static str {
        "array_syntax"
    }

    fn description(&self) -> &'static str {
        "Writes array constructors in the configured short or long syntax."
    }

    fn priority(&self) -> i32 {
        37
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        match self.syntax {
            Syntax::Short => stream.is_kind_found(TokenKind::Array),
            Syntax::Long => stream.is_kind_found(TokenKind::ArraySquareOpen),
        }
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        match self.syntax {
            Syntax::Short => self.to_short(stream),
            Syntax::Long => self.to_long(stream),
        }
    }

    fn as_configurable(&mut self) -> Option<&mut dyn ConfigurableFixer> {
        Some(self)
    }
}

impl ConfigurableFixer for ArraySyntaxFixer {
    fn configure(&mut self, options: &FixerOptions) -> Result<(), ConfigurationError> {
        for (key, value) in options {
            match key.as_str() {
                "syntax" => {
                    self.syntax = match value.as_str() {
                        Some("short") => Syntax::Short,
                        Some("long") => Syntax::Long,
                        _ => {
                            return Err(ConfigurationError::InvalidValue {
                                fixer: self.name(),
                                option: "syntax",
                                reason: format!("expected \"short\" or \"long\", got {value}"),
                            })
                        }
                    };
                }
                other => {
                    return Err(ConfigurationError::UnknownOption {
                        fixer: self.name(),
                        option: other.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}
