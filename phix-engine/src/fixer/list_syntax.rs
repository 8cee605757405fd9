//! Converts between the two destructuring notations.

use phix_lexer::stream::BlockKind;
use phix_lexer::{Token, TokenKind, TokenStream};

use crate::fixer::array_syntax::is_member_name;
use crate::fixer::{ConfigurableFixer, ConfigurationError, Fixer, FixerError, FixerOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Short,
    Long,
}

/// Rewrites `list(...)` destructuring as `[...]` or back, `short` by
/// default.
///
/// Array literals keep their brackets in both directions: the lexer tags
/// destructuring brackets as their own kinds, so `[$a] = $b` and
/// `$a = [1]` never collide. Methods named `list` are left alone.
pub struct ListSyntaxFixer {
    syntax: Syntax,
}

impl ListSyntaxFixer {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Short,
        }
    }

    fn to_short(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            if !stream[index].is_kind(TokenKind::List) || is_member_name(stream, index) {
                continue;
            }
            let open = match stream.next_meaningful(index) {
                Some(open) if stream[open].is_kind(TokenKind::ParenOpen) => open,
                _ => continue,
            };
            let close = stream.find_block_end(BlockKind::Paren, open)?;
            stream.replace_at(open, TokenKind::DestructuringSquareOpen, "[");
            stream.replace_at(close, TokenKind::DestructuringSquareClose, "]");
            stream.clear_and_merge_surrounding_whitespace(index);
        }
        Ok(())
    }

    fn to_long(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        // The replacement grows the stream, so walk backwards to keep
        // unvisited indices valid.
        for index in (0..stream.len()).rev() {
            if !stream[index].is_kind(TokenKind::DestructuringSquareOpen) {
                continue;
            }
            let close = stream.find_block_end(BlockKind::DestructuringSquare, index)?;
            let line = stream[index].line();
            stream.replace_at(close, TokenKind::ParenClose, ")");
            stream.override_range(
                index..index + 1,
                vec![
                    Token::new(TokenKind::List, "list", line),
                    Token::new(TokenKind::ParenOpen, "(", line),
                ],
            );
        }
        Ok(())
    }
}

impl Default for ListSyntaxFixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixer for ListSyntaxFixer {
    fn name(&self) -> &'static str {
        "list_syntax"
    }

    fn description(&self) -> &'static str {
        "Writes destructuring assignments in the configured short or long syntax."
    }

    fn priority(&self) -> i32 {
        35
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        match self.syntax {
            Syntax::Short => stream.is_kind_found(TokenKind::List),
            Syntax::Long => stream.is_kind_found(TokenKind::DestructuringSquareOpen),
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

impl ConfigurableFixer for ListSyntaxFixer {
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
