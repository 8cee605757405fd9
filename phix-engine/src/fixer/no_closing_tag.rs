//! Drops the closing `?>` from pure-PHP files.

use phix_lexer::{Token, TokenKind, TokenStream};

use crate::fixer::{Fixer, FixerError};

/// Removes a trailing `?>` and terminates the last statement with `;`.
///
/// A closing tag followed by anything but whitespace is semantic (the file
/// emits HTML) and stays. The tag also implies a statement terminator, so
/// `echo 1 ?>` gains the `;` the tag used to provide.
#[derive(Debug, Default)]
pub struct NoClosingTagFixer;

impl Fixer for NoClosingTagFixer {
    fn name(&self) -> &'static str {
        "no_closing_tag"
    }

    fn description(&self) -> &'static str {
        "Removes the closing ?> tag from files that end in PHP code."
    }

    fn priority(&self) -> i32 {
        -90
    }

    fn runs_before(&self) -> &'static [&'static str] {
        &["single_blank_line_at_eof"]
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        stream.is_kind_found(TokenKind::CloseTag)
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        let close = match stream.prev_of_kind(stream.len(), &[TokenKind::CloseTag]) {
            Some(close) => close,
            None => return Ok(()),
        };

        // Only trailing whitespace may follow; any real output means the
        // tag is doing its job.
        for index in close + 1..stream.len() {
            let token = &stream[index];
            if token.is_removed() {
                continue;
            }
            if !token.content().chars().all(char::is_whitespace) {
                return Ok(());
            }
        }

        for index in close + 1..stream.len() {
            stream.clear_at(index);
        }
        if let Some(prev) = stream.prev_non_removed(close) {
            if stream[prev].is_whitespace() {
                stream.clear_at(prev);
            }
        }
        stream.clear_at(close);

        let last = match stream.last_meaningful() {
            Some(last) => last,
            None => return Ok(()),
        };
        if !matches!(
            stream[last].kind(),
            TokenKind::Semicolon
                | TokenKind::BraceClose
                | TokenKind::OpenTag
                | TokenKind::OpenTagEcho
        ) {
            let line = stream[last].line();
            stream.insert_at(last + 1, vec![Token::new(TokenKind::Semicolon, ";", line)]);
        }
        Ok(())
    }
}
