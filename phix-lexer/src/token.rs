//! A single lexed token: kind, exact source text and starting line.

use crate::kind::TokenKind;

/// One token of PHP source.
///
/// `content` is the exact slice of the input, byte for byte. Concatenating
/// the contents of a stream reproduces the input; nothing about a token is
/// normalized at lex time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    content: String,
    line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, content: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            content: content.into(),
            line,
        }
    }

    /// The tombstone left behind by [`crate::stream::TokenStream::clear_at`].
    pub fn removed(line: u32) -> Self {
        Token {
            kind: TokenKind::Removed,
            content: String::new(),
            line,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 1-based line on which the token starts.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind.is_whitespace()
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    pub fn is_meaningful(&self) -> bool {
        self.kind.is_meaningful()
    }

    pub fn is_removed(&self) -> bool {
        self.kind == TokenKind::Removed
    }

    /// Kind and exact content match.
    pub fn equals(&self, kind: TokenKind, content: &str) -> bool {
        self.kind == kind && self.content == content
    }

    /// Kind match with ASCII case-insensitive content comparison. PHP
    /// keywords and some identifiers (`strict_types`) compare this way.
    pub fn equals_ignore_case(&self, kind: TokenKind, content: &str) -> bool {
        self.kind == kind && self.content.eq_ignore_ascii_case(content)
    }

    pub(crate) fn set_kind(&mut self, kind: TokenKind) {
        self.kind = kind;
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_returned_verbatim() {
        let token = Token::new(TokenKind::Whitespace, "\t \n", 3);
        assert_eq!(token.content(), "\t \n");
        assert_eq!(token.line(), 3);
        assert!(token.is_whitespace());
    }

    #[test]
    fn equals_distinguishes_case() {
        let token = Token::new(TokenKind::Identifier, "TRUE", 1);
        assert!(token.equals(TokenKind::Identifier, "TRUE"));
        assert!(!token.equals(TokenKind::Identifier, "true"));
        assert!(token.equals_ignore_case(TokenKind::Identifier, "true"));
    }

    #[test]
    fn removed_tokens_have_empty_content() {
        let token = Token::removed(7);
        assert!(token.is_removed());
        assert!(!token.is_meaningful());
        assert_eq!(token.content(), "");
    }
}
