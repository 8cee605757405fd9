//! Raw lexing: logos piece lexers plus the mode driver.
//!
//! PHP is lexed in three modes. Outside `<?php` everything is inline HTML.
//! Inside, [`PhpPiece`] does the heavy lifting. Double-quoted strings get
//! their own mode ([`StringPiece`]) because their interior follows different
//! rules, and `{$...}` / `${...}` interpolations re-enter PHP mode with brace
//! depth tracking. The driver keeps a frame stack so strings nested inside
//! interpolated expressions lex correctly.
//!
//! Every emitted token carries the exact input slice; the driver never
//! normalizes content. Heredocs and nowdocs are captured as one token by a
//! callback that scans forward for the closing label.

use logos::{Lexer, Logos};

use crate::kind::{KindRegistry, TokenKind};
use crate::lexing::LexError;
use crate::token::Token;

/// Pieces recognized outside PHP tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HtmlPiece {
    /// `<?php` with the single following whitespace character PHP folds
    /// into the tag. Tag spelling is case-insensitive.
    #[regex(r"<\?[pP][hH][pP]([ \t]|\r\n|\r|\n)?")]
    OpenTag,

    #[token("<?=")]
    OpenTagEcho,

    #[regex(r"[^<]+")]
    Text,

    #[token("<")]
    Lt,
}

/// Pieces recognized in PHP mode (top level or inside `{$...}`).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhpPiece {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// `?>` plus the one newline PHP folds into the close tag.
    #[regex(r"\?>(\r\n|\r|\n)?")]
    CloseTag,

    /// One-line comments run to the end of the line or to `?>`, whichever
    /// comes first; a close tag inside the comment ends the PHP block.
    #[token("//", lex_line_comment)]
    LineComment,

    /// Plain `#` comment. `#[` is the longer match and stays an attribute
    /// opener.
    #[token("#", lex_line_comment)]
    HashComment,

    #[token("#[")]
    AttributeOpen,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    /// `/*` that never closes. Kept as its own piece so the driver can
    /// report a precise error instead of lexing `/` and `*` as operators.
    #[regex(r"/\*([^*]|\*+[^*/])*\*?")]
    OpenBlockComment,

    #[regex(r"'([^'\\]|\\[\s\S])*'")]
    SingleQuoted,

    #[regex(r"'([^'\\]|\\[\s\S])*")]
    OpenSingleQuoted,

    #[regex(r"`([^`\\]|\\[\s\S])*`")]
    Backtick,

    #[regex(r"`([^`\\]|\\[\s\S])*")]
    OpenBacktick,

    #[token("\"")]
    Quote,

    /// Heredoc / nowdoc start. The callback extends the token over the body
    /// and the closing label; it fails when the label never shows up.
    #[regex(
        r#"<<<[ \t]*([a-zA-Z_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}][a-zA-Z0-9_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}]*|'[a-zA-Z_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}][a-zA-Z0-9_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}]*'|"[a-zA-Z_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}][a-zA-Z0-9_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}]*")(\r\n|\r|\n)"#,
        lex_heredoc
    )]
    Heredoc,

    #[regex(r"\$[a-zA-Z_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}][a-zA-Z0-9_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}]*")]
    Variable,

    #[regex(r"[a-zA-Z_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}][a-zA-Z0-9_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}]*")]
    Identifier,

    /// Cast groups lex as a single token, mirroring PHP. Only tabs and
    /// spaces may separate the parentheses from the type word.
    #[regex(
        r"\([ \t]*(?i:int|integer|bool|boolean|float|double|real|string|binary|array|object|unset)[ \t]*\)"
    )]
    Cast,

    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*")]
    #[regex(r"0[bB][01][01_]*")]
    #[regex(r"0[oO][0-7][0-7_]*")]
    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?|\.[0-9][0-9_]*)([eE][+-]?[0-9][0-9_]*)?")]
    Number,

    #[token("?->")]
    NullsafeArrow,

    #[token("->")]
    Arrow,

    #[token("=>")]
    DoubleArrow,

    #[token("::")]
    DoubleColon,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("[")]
    SquareOpen,

    #[token("]")]
    SquareClose,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("?")]
    QuestionMark,

    #[token("=")]
    Equals,

    #[token("&")]
    Ampersand,

    #[token("\\")]
    Backslash,

    #[token("$")]
    Dollar,

    #[token("===")]
    #[token("!==")]
    #[token("<=>")]
    #[token("**=")]
    #[token("...")]
    #[token("??=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("==")]
    #[token("!=")]
    #[token("<>")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token("??")]
    #[token("++")]
    #[token("--")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token(".=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<")]
    #[token(">>")]
    #[token("**")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token(".")]
    #[token("<")]
    #[token(">")]
    #[token("!")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("@")]
    Operator,
}

/// Pieces recognized inside a double-quoted string body.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringPiece {
    #[token("\"")]
    Quote,

    #[token("${")]
    DollarCurly,

    /// A lone `{`. The driver peeks at the next character: `{$` opens an
    /// interpolated expression, anything else is literal text.
    #[token("{")]
    Curly,

    #[regex(r"\$[a-zA-Z_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}][a-zA-Z0-9_\x{0080}-\x{D7FF}\x{E000}-\x{10FFFF}]*")]
    Variable,

    /// A `$` not followed by a variable name or `{` is literal.
    #[token("$")]
    Dollar,

    #[regex(r#"([^"\\${]|\\[\s\S])+"#)]
    Text,
}

/// Extends the heredoc start token over the body and closing label.
///
/// The closing label is the first line whose leading whitespace is followed
/// by the label and then a non-label character (PHP 7.3 indentation rules).
/// Returns false when no such line exists, which surfaces as a lex error.
fn lex_heredoc(lex: &mut Lexer<PhpPiece>) -> bool {
    let label = heredoc_label(lex.slice());
    let rest = lex.remainder();

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_start_matches([' ', '\t']);
        if let Some(after) = trimmed.strip_prefix(label) {
            let closes = after.chars().next().map_or(true, |c| !is_label_char(c));
            if closes {
                let indent = line.len() - trimmed.len();
                lex.bump(offset + indent + label.len());
                return true;
            }
        }
        offset += line.len();
    }

    false
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c as u32 >= 0x80
}

/// Extends a `//` or `#` comment to the end of the line, stopping short of
/// a `?>` so the close tag lexes on its own.
fn lex_line_comment(lex: &mut Lexer<PhpPiece>) -> bool {
    let rest = lex.remainder();
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        if c == '\n' || c == '\r' {
            end = i;
            break;
        }
        if c == '?' && rest[i + 1..].starts_with('>') {
            end = i;
            break;
        }
    }
    lex.bump(end);
    true
}

/// Pulls the label out of a heredoc start slice (`<<< "LABEL"\n` and
/// friends).
fn heredoc_label(start: &str) -> &str {
    let label = start[3..]
        .trim_start_matches([' ', '\t'])
        .trim_end_matches(['\r', '\n']);
    label.trim_matches(['\'', '"'])
}

/// One lexer over the source, morphed between modes in place.
enum Pieces<'s> {
    Html(Lexer<'s, HtmlPiece>),
    Php(Lexer<'s, PhpPiece>),
    Str(Lexer<'s, StringPiece>),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Html,
    Php,
    Str,
}

impl<'s> Pieces<'s> {
    fn ensure(self, mode: Mode) -> Self {
        match (self, mode) {
            (Pieces::Html(lex), Mode::Php) => Pieces::Php(lex.morph()),
            (Pieces::Html(lex), Mode::Str) => Pieces::Str(lex.morph()),
            (Pieces::Php(lex), Mode::Html) => Pieces::Html(lex.morph()),
            (Pieces::Php(lex), Mode::Str) => Pieces::Str(lex.morph()),
            (Pieces::Str(lex), Mode::Html) => Pieces::Html(lex.morph()),
            (Pieces::Str(lex), Mode::Php) => Pieces::Php(lex.morph()),
            (pieces, _) => pieces,
        }
    }
}

/// Lexing frames above the base mode.
enum Frame {
    /// Interior of a double-quoted string. Parts are buffered so a string
    /// without interpolations can collapse into one `ConstantString` token.
    DqString {
        parts: Vec<Token>,
        text: String,
        text_line: u32,
        open_line: u32,
    },
    /// `{$...}` or `${...}` expression inside a string, lexed as PHP with
    /// brace depth so the closing `}` can be found.
    Embedded { depth: u32 },
}

struct Driver<'s> {
    registry: &'s KindRegistry,
    out: Vec<Token>,
    frames: Vec<Frame>,
    php_base: bool,
    line: u32,
    html: String,
    html_line: u32,
}

fn count_newlines(s: &str) -> u32 {
    s.bytes().filter(|&b| b == b'\n').count() as u32
}

impl<'s> Driver<'s> {
    fn new(registry: &'s KindRegistry) -> Self {
        Driver {
            registry,
            out: Vec::new(),
            frames: Vec::new(),
            php_base: false,
            line: 1,
            html: String::new(),
            html_line: 1,
        }
    }

    fn mode(&self) -> Mode {
        match self.frames.last() {
            Some(Frame::DqString { .. }) => Mode::Str,
            Some(Frame::Embedded { .. }) => Mode::Php,
            None => {
                if self.php_base {
                    Mode::Php
                } else {
                    Mode::Html
                }
            }
        }
    }

    /// Where finished tokens go: the innermost string's part buffer, or the
    /// output stream when no string is open.
    fn sink(&mut self) -> &mut Vec<Token> {
        for frame in self.frames.iter_mut().rev() {
            if let Frame::DqString { parts, .. } = frame {
                return parts;
            }
        }
        &mut self.out
    }

    fn emit(&mut self, kind: TokenKind, slice: &str) {
        let line = self.line;
        self.line += count_newlines(slice);
        let token = Token::new(kind, slice, line);
        self.sink().push(token);
    }

    fn append_html(&mut self, slice: &str) {
        if self.html.is_empty() {
            self.html_line = self.line;
        }
        self.html.push_str(slice);
        self.line += count_newlines(slice);
    }

    fn flush_html(&mut self) {
        if self.html.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.html);
        let token = Token::new(TokenKind::InlineHtml, content, self.html_line);
        self.out.push(token);
    }

    fn step_html(&mut self, lex: &mut Lexer<'s, HtmlPiece>) -> Result<bool, LexError> {
        let piece = match lex.next() {
            Some(piece) => piece,
            None => {
                self.flush_html();
                return Ok(false);
            }
        };
        match piece {
            Ok(HtmlPiece::OpenTag) => {
                self.flush_html();
                self.emit(TokenKind::OpenTag, lex.slice());
                self.php_base = true;
            }
            Ok(HtmlPiece::OpenTagEcho) => {
                self.flush_html();
                self.emit(TokenKind::OpenTagEcho, lex.slice());
                self.php_base = true;
            }
            Ok(HtmlPiece::Text) | Ok(HtmlPiece::Lt) | Err(()) => {
                self.append_html(lex.slice());
            }
        }
        Ok(true)
    }

    fn step_php(&mut self, lex: &mut Lexer<'s, PhpPiece>) -> Result<bool, LexError> {
        let piece = match lex.next() {
            Some(piece) => piece,
            None => {
                if let Some(line) = self.open_string_line() {
                    return Err(LexError::UnterminatedString { line });
                }
                return Ok(false);
            }
        };
        let piece = match piece {
            Ok(piece) => piece,
            Err(()) => return Err(self.classify_error(lex.slice())),
        };
        match piece {
            PhpPiece::Whitespace => self.emit(TokenKind::Whitespace, lex.slice()),
            PhpPiece::CloseTag => {
                self.emit(TokenKind::CloseTag, lex.slice());
                if self.frames.is_empty() {
                    self.php_base = false;
                }
            }
            PhpPiece::LineComment | PhpPiece::HashComment => {
                self.emit(TokenKind::LineComment, lex.slice())
            }
            PhpPiece::AttributeOpen => self.emit(TokenKind::AttributeOpen, lex.slice()),
            PhpPiece::BlockComment => {
                let slice = lex.slice();
                let kind = if is_doc_comment(slice) {
                    TokenKind::DocComment
                } else {
                    TokenKind::BlockComment
                };
                self.emit(kind, slice);
            }
            PhpPiece::OpenBlockComment => {
                return Err(LexError::UnterminatedComment { line: self.line });
            }
            PhpPiece::SingleQuoted => self.emit(TokenKind::ConstantString, lex.slice()),
            PhpPiece::OpenSingleQuoted | PhpPiece::OpenBacktick => {
                return Err(LexError::UnterminatedString { line: self.line });
            }
            PhpPiece::Backtick => self.emit(TokenKind::ExecString, lex.slice()),
            PhpPiece::Quote => {
                self.frames.push(Frame::DqString {
                    parts: Vec::new(),
                    text: String::new(),
                    text_line: self.line,
                    open_line: self.line,
                });
            }
            PhpPiece::Heredoc => self.emit(TokenKind::Heredoc, lex.slice()),
            PhpPiece::Variable => self.emit(TokenKind::Variable, lex.slice()),
            PhpPiece::Identifier => {
                let slice = lex.slice();
                let kind = self
                    .registry
                    .keyword_kind(slice)
                    .unwrap_or(TokenKind::Identifier);
                self.emit(kind, slice);
            }
            PhpPiece::Cast => self.emit(TokenKind::Cast, lex.slice()),
            PhpPiece::Number => self.emit(TokenKind::Number, lex.slice()),
            PhpPiece::NullsafeArrow => self.emit(TokenKind::NullsafeArrow, lex.slice()),
            PhpPiece::Arrow => self.emit(TokenKind::Arrow, lex.slice()),
            PhpPiece::DoubleArrow => self.emit(TokenKind::DoubleArrow, lex.slice()),
            PhpPiece::DoubleColon => self.emit(TokenKind::DoubleColon, lex.slice()),
            PhpPiece::ParenOpen => self.emit(TokenKind::ParenOpen, lex.slice()),
            PhpPiece::ParenClose => self.emit(TokenKind::ParenClose, lex.slice()),
            PhpPiece::BraceOpen => {
                if let Some(Frame::Embedded { depth }) = self.frames.last_mut() {
                    *depth += 1;
                }
                self.emit(TokenKind::BraceOpen, lex.slice());
            }
            PhpPiece::BraceClose => {
                let closes_embed = match self.frames.last_mut() {
                    Some(Frame::Embedded { depth }) => {
                        *depth -= 1;
                        *depth == 0
                    }
                    _ => false,
                };
                self.emit(TokenKind::BraceClose, lex.slice());
                if closes_embed {
                    self.frames.pop();
                }
            }
            PhpPiece::SquareOpen => self.emit(TokenKind::SquareOpen, lex.slice()),
            PhpPiece::SquareClose => self.emit(TokenKind::SquareClose, lex.slice()),
            PhpPiece::Semicolon => self.emit(TokenKind::Semicolon, lex.slice()),
            PhpPiece::Comma => self.emit(TokenKind::Comma, lex.slice()),
            PhpPiece::Colon => self.emit(TokenKind::Colon, lex.slice()),
            PhpPiece::QuestionMark => self.emit(TokenKind::QuestionMark, lex.slice()),
            PhpPiece::Equals => self.emit(TokenKind::Equals, lex.slice()),
            PhpPiece::Ampersand => self.emit(TokenKind::Ampersand, lex.slice()),
            PhpPiece::Backslash => self.emit(TokenKind::Backslash, lex.slice()),
            PhpPiece::Dollar => self.emit(TokenKind::Dollar, lex.slice()),
            PhpPiece::Operator => self.emit(TokenKind::Operator, lex.slice()),
        }
        Ok(true)
    }

    fn step_str(&mut self, lex: &mut Lexer<'s, StringPiece>) -> Result<bool, LexError> {
        let piece = match lex.next() {
            Some(Ok(piece)) => piece,
            Some(Err(())) | None => {
                let line = self.open_string_line().unwrap_or(self.line);
                return Err(LexError::UnterminatedString { line });
            }
        };
        match piece {
            StringPiece::Quote => self.finish_string(),
            StringPiece::Variable => {
                self.flush_string_text();
                self.emit(TokenKind::Variable, lex.slice());
            }
            StringPiece::DollarCurly => {
                self.flush_string_text();
                self.emit(TokenKind::DollarOpenCurly, lex.slice());
                self.frames.push(Frame::Embedded { depth: 1 });
            }
            StringPiece::Curly => {
                if lex.remainder().starts_with('$') {
                    self.flush_string_text();
                    self.emit(TokenKind::CurlyOpen, lex.slice());
                    self.frames.push(Frame::Embedded { depth: 1 });
                } else {
                    self.append_string_text(lex.slice());
                }
            }
            StringPiece::Dollar | StringPiece::Text => {
                self.append_string_text(lex.slice());
            }
        }
        Ok(true)
    }

    fn append_string_text(&mut self, slice: &str) {
        let line = self.line;
        self.line += count_newlines(slice);
        if let Some(Frame::DqString {
            text, text_line, ..
        }) = self.frames.last_mut()
        {
            if text.is_empty() {
                *text_line = line;
            }
            text.push_str(slice);
        }
    }

    fn flush_string_text(&mut self) {
        if let Some(Frame::DqString {
            parts,
            text,
            text_line,
            ..
        }) = self.frames.last_mut()
        {
            if !text.is_empty() {
                let content = std::mem::take(text);
                parts.push(Token::new(TokenKind::EncapsedText, content, *text_line));
            }
        }
    }

    /// Closes the innermost string: a body without interpolations becomes a
    /// single `ConstantString` (quotes included), anything else becomes
    /// `DoubleQuote` delimiters around the collected parts.
    fn finish_string(&mut self) {
        self.flush_string_text();
        let close_line = self.line;
        let frame = self.frames.pop();
        let (parts, open_line) = match frame {
            Some(Frame::DqString {
                parts, open_line, ..
            }) => (parts, open_line),
            _ => return,
        };

        let plain = match parts.as_slice() {
            [] => true,
            [only] => only.kind() == TokenKind::EncapsedText,
            _ => false,
        };

        if plain {
            let body = parts
                .first()
                .map(|t| t.content().to_string())
                .unwrap_or_default();
            let content = format!("\"{body}\"");
            let token = Token::new(TokenKind::ConstantString, content, open_line);
            self.sink().push(token);
            return;
        }

        let sink = self.sink();
        sink.push(Token::new(TokenKind::DoubleQuote, "\"", open_line));
        sink.extend(parts);
        sink.push(Token::new(TokenKind::DoubleQuote, "\"", close_line));
    }

    /// Line of the innermost unterminated string, if any.
    fn open_string_line(&self) -> Option<u32> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::DqString { open_line, .. } => Some(*open_line),
            Frame::Embedded { .. } => None,
        })
    }

    fn classify_error(&self, slice: &str) -> LexError {
        if slice.starts_with("<<<") {
            return LexError::UnterminatedHeredoc { line: self.line };
        }
        let found = slice.chars().next().unwrap_or('\0');
        LexError::UnexpectedCharacter {
            found,
            line: self.line,
        }
    }
}

fn is_doc_comment(slice: &str) -> bool {
    // PHP only treats /** as a doc comment when whitespace follows.
    slice.len() > 4
        && slice.starts_with("/**")
        && slice.as_bytes()[3].is_ascii_whitespace()
}

/// Lexes `source` into a flat token vector.
pub(crate) fn lex(source: &str, registry: &KindRegistry) -> Result<Vec<Token>, LexError> {
    let mut driver = Driver::new(registry);
    let mut pieces = Pieces::Html(HtmlPiece::lexer(source));

    loop {
        pieces = pieces.ensure(driver.mode());
        let more = match &mut pieces {
            Pieces::Html(lex) => driver.step_html(lex)?,
            Pieces::Php(lex) => driver.step_php(lex)?,
            Pieces::Str(lex) => driver.step_str(lex)?,
        };
        if !more {
            break;
        }
    }

    Ok(driver.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::TokenKind as K;

    fn lex_ok(source: &str) -> Vec<Token> {
        let registry = KindRegistry::new();
        lex(source, &registry).unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_ok(source).iter().map(|t| t.kind()).collect()
    }

    fn rejoin(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.content()).collect()
    }

    #[test]
    fn open_tag_swallows_one_whitespace() {
        let tokens = lex_ok("<?php echo 1;");
        assert_eq!(tokens[0].kind(), K::OpenTag);
        assert_eq!(tokens[0].content(), "<?php ");
        assert_eq!(tokens[1].kind(), K::Echo);
        assert_eq!(tokens[1].content(), "echo");
    }

    #[test]
    fn open_tag_takes_newline_not_following_indent() {
        let tokens = lex_ok("<?php\n    echo 1;");
        assert_eq!(tokens[0].content(), "<?php\n");
        assert_eq!(tokens[1].kind(), K::Whitespace);
        assert_eq!(tokens[1].content(), "    ");
    }

    #[test]
    fn html_around_php_is_preserved() {
        let tokens = lex_ok("<b>x</b><?php echo 1; ?><i>y</i>");
        assert_eq!(tokens[0].kind(), K::InlineHtml);
        assert_eq!(tokens[0].content(), "<b>x</b>");
        assert_eq!(tokens.last().unwrap().kind(), K::InlineHtml);
        assert_eq!(tokens.last().unwrap().content(), "<i>y</i>");
    }

    #[test]
    fn close_tag_swallows_one_newline() {
        let tokens = lex_ok("<?php echo 1; ?>\nrest");
        let close = tokens.iter().find(|t| t.kind() == K::CloseTag).unwrap();
        assert_eq!(close.content(), "?>\n");
        assert_eq!(tokens.last().unwrap().content(), "rest");
    }

    #[test]
    fn bom_lands_in_inline_html() {
        let tokens = lex_ok("\u{FEFF}<?php echo 1;");
        assert_eq!(tokens[0].kind(), K::InlineHtml);
        assert_eq!(tokens[0].content(), "\u{FEFF}");
        assert_eq!(tokens[1].kind(), K::OpenTag);
    }

    #[test]
    fn keywords_lex_case_insensitively() {
        let tokens = lex_ok("<?php ECHO 1; While(true){}");
        assert_eq!(tokens[1].kind(), K::Echo);
        assert_eq!(tokens[1].content(), "ECHO");
        let while_token = tokens.iter().find(|t| t.kind() == K::While).unwrap();
        assert_eq!(while_token.content(), "While");
    }

    #[test]
    fn true_lexes_as_identifier() {
        let tokens = lex_ok("<?php $a = TRUE;");
        let t = tokens.iter().find(|t| t.content() == "TRUE").unwrap();
        assert_eq!(t.kind(), K::Identifier);
    }

    #[test]
    fn hash_comment_and_attribute_are_distinguished() {
        let tokens = lex_ok("<?php # note\n#[Attr]\n$x;");
        assert_eq!(tokens[1].kind(), K::LineComment);
        assert_eq!(tokens[1].content(), "# note");
        let attr = tokens.iter().find(|t| t.kind() == K::AttributeOpen).unwrap();
        assert_eq!(attr.content(), "#[");
    }

    #[test]
    fn line_comment_stops_at_close_tag() {
        let tokens = lex_ok("<?php // note ?> html\n");
        assert_eq!(tokens[1].kind(), K::LineComment);
        assert_eq!(tokens[1].content(), "// note ");
        assert_eq!(tokens[2].kind(), K::CloseTag);
        assert_eq!(tokens[3].kind(), K::InlineHtml);
        assert_eq!(tokens[3].content(), " html\n");
    }

    #[test]
    fn hash_comment_stops_at_close_tag() {
        let tokens = lex_ok("<?php # x ?>");
        assert_eq!(tokens[1].kind(), K::LineComment);
        assert_eq!(tokens[1].content(), "# x ");
        assert_eq!(tokens[2].kind(), K::CloseTag);
    }

    #[test]
    fn doc_comments_need_whitespace_after_stars() {
        let tokens = lex_ok("<?php /** doc */ /**/ /*plain*/");
        assert_eq!(tokens[1].kind(), K::DocComment);
        assert_eq!(tokens[3].kind(), K::BlockComment);
        assert_eq!(tokens[3].content(), "/**/");
        assert_eq!(tokens[5].kind(), K::BlockComment);
    }

    #[test]
    fn casts_lex_as_one_token() {
        let tokens = lex_ok("<?php $a = (int) $b; $c = ( string )$d;");
        let casts: Vec<_> = tokens.iter().filter(|t| t.kind() == K::Cast).collect();
        assert_eq!(casts.len(), 2);
        assert_eq!(casts[0].content(), "(int)");
        assert_eq!(casts[1].content(), "( string )");
    }

    #[test]
    fn call_parentheses_are_not_casts() {
        let kinds = kinds("<?php f($x);");
        assert!(kinds.contains(&K::ParenOpen));
        assert!(!kinds.contains(&K::Cast));
    }

    #[test]
    fn numbers_cover_php_notations() {
        let tokens = lex_ok("<?php 1 1.5 .5 1e3 0x1F 0b10 0o17 1_000;");
        let numbers: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == K::Number)
            .map(|t| t.content())
            .collect();
        assert_eq!(numbers, vec!["1", "1.5", ".5", "1e3", "0x1F", "0b10", "0o17", "1_000"]);
    }

    #[test]
    fn single_quoted_string_is_one_token() {
        let tokens = lex_ok(r#"<?php $a = 'it\'s';"#);
        let s = tokens
            .iter()
            .find(|t| t.kind() == K::ConstantString)
            .unwrap();
        assert_eq!(s.content(), r"'it\'s'");
    }

    #[test]
    fn plain_double_quoted_string_collapses() {
        let tokens = lex_ok(r#"<?php $a = "plain \n text";"#);
        let s = tokens
            .iter()
            .find(|t| t.kind() == K::ConstantString)
            .unwrap();
        assert_eq!(s.content(), r#""plain \n text""#);
        assert!(!tokens.iter().any(|t| t.kind() == K::DoubleQuote));
    }

    #[test]
    fn interpolated_string_splits_into_parts() {
        let tokens = lex_ok(r#"<?php $a = "x $name y";"#);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
        let quote_positions: Vec<_> = kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == K::DoubleQuote)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(quote_positions.len(), 2);
        let inner = &tokens[quote_positions[0] + 1..quote_positions[1]];
        let inner_kinds: Vec<_> = inner.iter().map(|t| t.kind()).collect();
        assert_eq!(
            inner_kinds,
            vec![K::EncapsedText, K::Variable, K::EncapsedText]
        );
        assert_eq!(inner[0].content(), "x ");
        assert_eq!(inner[1].content(), "$name");
        assert_eq!(inner[2].content(), " y");
    }

    #[test]
    fn dollar_curly_interpolation_reenters_php() {
        let tokens = lex_ok(r#"<?php $a = "v: ${x}";"#);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
        assert!(kinds.contains(&K::DollarOpenCurly));
        let open = kinds.iter().position(|k| *k == K::DollarOpenCurly).unwrap();
        assert_eq!(tokens[open + 1].kind(), K::Identifier);
        assert_eq!(tokens[open + 2].kind(), K::BraceClose);
    }

    #[test]
    fn curly_dollar_interpolation_tracks_nested_braces() {
        let tokens = lex_ok(r#"<?php $a = "{$arr['k']} end";"#);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
        let open = kinds.iter().position(|k| *k == K::CurlyOpen).unwrap();
        assert_eq!(tokens[open].content(), "{");
        assert_eq!(tokens[open + 1].kind(), K::Variable);
        let close = kinds.iter().rposition(|k| *k == K::BraceClose).unwrap();
        assert!(close > open);
        assert_eq!(tokens[close + 1].kind(), K::EncapsedText);
        assert_eq!(tokens[close + 1].content(), " end");
    }

    #[test]
    fn literal_brace_in_string_stays_text() {
        let tokens = lex_ok(r#"<?php $a = "a { b } c";"#);
        let s = tokens
            .iter()
            .find(|t| t.kind() == K::ConstantString)
            .unwrap();
        assert_eq!(s.content(), r#""a { b } c""#);
    }

    #[test]
    fn nested_string_inside_interpolation() {
        let source = r#"<?php $a = "{$arr["k"]}";"#;
        let tokens = lex_ok(source);
        assert_eq!(rejoin(&tokens), source);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
        assert!(kinds.contains(&K::CurlyOpen));
        // Inner "k" collapses to a constant string of its own.
        assert!(tokens.iter().any(|t| t.equals(K::ConstantString, "\"k\"")));
    }

    #[test]
    fn heredoc_is_one_token() {
        let source = "<?php $a = <<<EOT\nline $x\nEOT;\n";
        let tokens = lex_ok(source);
        let heredoc = tokens.iter().find(|t| t.kind() == K::Heredoc).unwrap();
        assert_eq!(heredoc.content(), "<<<EOT\nline $x\nEOT");
        assert_eq!(rejoin(&tokens), source);
    }

    #[test]
    fn indented_heredoc_close_is_included() {
        let source = "<?php $a = <<<EOT\n  body\n  EOT;\n";
        let tokens = lex_ok(source);
        let heredoc = tokens.iter().find(|t| t.kind() == K::Heredoc).unwrap();
        assert_eq!(heredoc.content(), "<<<EOT\n  body\n  EOT");
    }

    #[test]
    fn nowdoc_label_with_quotes() {
        let source = "<?php $a = <<<'EOT'\n$notavar\nEOT;\n";
        let tokens = lex_ok(source);
        let heredoc = tokens.iter().find(|t| t.kind() == K::Heredoc).unwrap();
        assert!(heredoc.content().starts_with("<<<'EOT'"));
        assert_eq!(rejoin(&tokens), source);
    }

    #[test]
    fn heredoc_label_prefix_does_not_close() {
        let source = "<?php $a = <<<EOT\nEOTX\nEOT;\n";
        let tokens = lex_ok(source);
        let heredoc = tokens.iter().find(|t| t.kind() == K::Heredoc).unwrap();
        assert_eq!(heredoc.content(), "<<<EOT\nEOTX\nEOT");
    }

    #[test]
    fn operators_prefer_longest_match() {
        let tokens = lex_ok("<?php $a === $b; $c ??= $d; $e?->f(); $g <=> $h;");
        let ops: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == K::Operator)
            .map(|t| t.content())
            .collect();
        assert!(ops.contains(&"==="));
        assert!(ops.contains(&"??="));
        assert!(ops.contains(&"<=>"));
        assert!(tokens.iter().any(|t| t.kind() == K::NullsafeArrow));
    }

    #[test]
    fn exec_string_is_one_token() {
        let tokens = lex_ok("<?php $out = `ls -la`;");
        let exec = tokens.iter().find(|t| t.kind() == K::ExecString).unwrap();
        assert_eq!(exec.content(), "`ls -la`");
    }

    #[test]
    fn lines_are_tracked_per_token() {
        let tokens = lex_ok("<?php\n$a = 1;\n$b = 2;\n");
        let b = tokens.iter().find(|t| t.content() == "$b").unwrap();
        assert_eq!(b.line(), 3);
    }

    #[test]
    fn unterminated_single_quote_errors() {
        let registry = KindRegistry::new();
        let err = lex("<?php $a = 'oops", &registry).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn unterminated_double_quote_errors_with_open_line() {
        let registry = KindRegistry::new();
        let err = lex("<?php\n$a = \"oops", &registry).unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 2 });
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let registry = KindRegistry::new();
        let err = lex("<?php /* never closed", &registry).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn unterminated_heredoc_errors() {
        let registry = KindRegistry::new();
        let err = lex("<?php $a = <<<EOT\nno close\n", &registry).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedHeredoc { .. }));
    }

    #[test]
    fn control_characters_are_rejected() {
        let registry = KindRegistry::new();
        let err = lex("<?php \x01;", &registry).unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { .. }));
    }

    #[test]
    fn html_only_input_is_one_token() {
        let tokens = lex_ok("<html><body>no php</body></html>");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind(), K::InlineHtml);
    }

    #[test]
    fn empty_input_lexes_to_nothing() {
        assert!(lex_ok("").is_empty());
    }
}
