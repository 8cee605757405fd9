//! Ends files with exactly one line ending.

use phix_lexer::{Token, TokenKind, TokenStream};

use crate::fixer::{Fixer, FixerError, WhitespaceAwareFixer};
use crate::whitespace::WhitespaceConfig;

/// Rewrites the end of the file to a single configured line ending:
/// missing breaks are added, piled-up blank lines and trailing spaces are
/// folded. Files with no content at all are left alone.
pub struct SingleBlankLineAtEofFixer {
    whitespace: WhitespaceConfig,
}

impl SingleBlankLineAtEofFixer {
    pub fn new() -> Self {
        Self {
            whitespace: WhitespaceConfig::default(),
        }
    }
}

impl Default for SingleBlankLineAtEofFixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixer for SingleBlankLineAtEofFixer {
    fn name(&self) -> &'static str {
        "single_blank_line_at_eof"
    }

    fn description(&self) -> &'static str {
        "Ends the file with exactly one line ending."
    }

    fn priority(&self) -> i32 {
        -100
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        !stream.is_empty()
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        // The last token whose content is more than whitespace. A file of
        // pure whitespace has nothing to terminate.
        let anchor = match (0..stream.len()).rev().find(|&i| {
            let token = &stream[i];
            !token.is_removed() && !token.content().chars().all(char::is_whitespace)
        }) {
            Some(anchor) => anchor,
            None => return Ok(()),
        };

        let ending = self.whitespace.line_ending().to_string();
        let content = stream[anchor].content();
        let body_len = content.trim_end().len();
        let anchor_tail = &content[body_len..];

        let mut tail = String::from(anchor_tail);
        for index in anchor + 1..stream.len() {
            tail.push_str(stream[index].content());
        }
        if tail == ending {
            return Ok(());
        }

        let anchor_kind = stream[anchor].kind();
        let folds_into_anchor = !anchor_tail.is_empty()
            || matches!(anchor_kind, TokenKind::InlineHtml | TokenKind::CloseTag);
        if folds_into_anchor {
            // Outside PHP context (or when the token already carries its
            // own break) the ending belongs in the token itself.
            let fixed = format!("{}{}", &content[..body_len], ending);
            stream.set_content_at(anchor, fixed);
            for index in anchor + 1..stream.len() {
                stream.clear_at(index);
            }
            return Ok(());
        }

        match stream.next_non_removed(anchor) {
            Some(first) => {
                stream.set_content_at(first, ending);
                let mut index = first;
                while let Some(next) = stream.next_non_removed(index) {
                    stream.clear_at(next);
                    index = next;
                }
            }
            None => {
                let line = stream[anchor].line();
                stream.insert_at(
                    stream.len(),
                    vec![Token::new(TokenKind::Whitespace, ending, line)],
                );
            }
        }
        Ok(())
    }

    fn as_whitespace_aware(&mut self) -> Option<&mut dyn WhitespaceAwareFixer> {
        Some(self)
    }
}

impl WhitespaceAwareFixer for SingleBlankLineAtEofFixer {
    fn set_whitespace_config(&mut self, config: WhitespaceConfig) {
        self.whitespace = config;
    }
}
