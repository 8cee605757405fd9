//! Inserts a missing `declare(strict_types=1);`.

use phix_lexer::stream::SequenceItem;
use phix_lexer::{Token, TokenKind, TokenStream};

use crate::fixer::{Fixer, FixerError, WhitespaceAwareFixer};
use crate::whitespace::WhitespaceConfig;

/// Adds `declare(strict_types=1);` right after the opening tag when the
/// file does not declare it yet, and lowercases the directive name when it
/// does.
///
/// Risky: turning on strict types changes how PHP coerces arguments at
/// runtime. Files that do not start with `<?php` are skipped, since the
/// directive must be the very first statement.
pub struct DeclareStrictTypesFixer {
    whitespace: WhitespaceConfig,
}

impl DeclareStrictTypesFixer {
    pub fn new() -> Self {
        Self {
            whitespace: WhitespaceConfig::default(),
        }
    }
}

impl Default for DeclareStrictTypesFixer {
    fn default() -> Self {
        Self::new()
    }
}

fn existing_directive() -> [SequenceItem<'static>; 3] {
    [
        SequenceItem::of_kind(TokenKind::Declare),
        SequenceItem::of_kind(TokenKind::ParenOpen),
        SequenceItem::with_content(TokenKind::Identifier, "strict_types"),
    ]
}

impl Fixer for DeclareStrictTypesFixer {
    fn name(&self) -> &'static str {
        "declare_strict_types"
    }

    fn description(&self) -> &'static str {
        "Adds declare(strict_types=1) after the opening tag when it is missing."
    }

    fn priority(&self) -> i32 {
        90
    }

    fn is_risky(&self) -> bool {
        true
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        stream.is_kind_found(TokenKind::OpenTag)
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        let open = match (0..stream.len()).find(|&i| !stream[i].is_removed()) {
            Some(open) if stream[open].is_kind(TokenKind::OpenTag) => open,
            _ => return Ok(()),
        };

        if let Some(found) = stream.find_sequence(&existing_directive(), open, None, false) {
            for (&index, token) in &found {
                if token.is_kind(TokenKind::Identifier) && token.content() != "strict_types" {
                    stream.set_content_at(index, "strict_types");
                }
            }
            return Ok(());
        }

        let line = stream[open].line();
        stream.insert_at(
            open + 1,
            vec![
                Token::new(TokenKind::Declare, "declare", line),
                Token::new(TokenKind::ParenOpen, "(", line),
                Token::new(TokenKind::Identifier, "strict_types", line),
                Token::new(TokenKind::Equals, "=", line),
                Token::new(TokenKind::Number, "1", line),
                Token::new(TokenKind::ParenClose, ")", line),
                Token::new(TokenKind::Semicolon, ";", line),
                Token::new(TokenKind::Whitespace, self.whitespace.line_ending(), line),
            ],
        );
        Ok(())
    }

    fn as_whitespace_aware(&mut self) -> Option<&mut dyn WhitespaceAwareFixer> {
        Some(self)
    }
}

impl WhitespaceAwareFixer for DeclareStrictTypesFixer {
    fn set_whitespace_config(&mut self, config: WhitespaceConfig) {
        self.whitespace = config;
    }
}
