//! Distinguishes the three meanings of `[`.
//!
//! After raw lexing every `[` is [`TokenKind::SquareOpen`]. This pass keeps
//! that kind for index accesses (`$a[0]`, `$f()[1]`) and retags array
//! literals (`[1, 2]`) and destructuring targets (`[$a, $b] = ...`,
//! `foreach ($x as [$k, $v])`) into their own bracket pairs, so block
//! matching and the array fixers never have to re-derive the context.

use crate::kind::TokenKind;
use crate::stream::{BlockKind, TokenStream};
use crate::transform::TokenTransformer;

pub struct SquareBraceTransformer;

impl TokenTransformer for SquareBraceTransformer {
    fn name(&self) -> &'static str {
        "square_brace"
    }

    fn custom_kinds(&self) -> &'static [TokenKind] {
        &[
            TokenKind::ArraySquareOpen,
            TokenKind::ArraySquareClose,
            TokenKind::DestructuringSquareOpen,
            TokenKind::DestructuringSquareClose,
        ]
    }

    fn transform(&self, stream: &mut TokenStream) {
        if !stream.is_kind_found(TokenKind::SquareOpen) {
            return;
        }

        for index in 0..stream.len() {
            if !stream[index].is_kind(TokenKind::SquareOpen) {
                continue;
            }
            if !is_short_array(stream, index) {
                continue;
            }
            // Unbalanced brackets lex fine; leave them raw.
            let end = match stream.find_block_end(BlockKind::Square, index) {
                Ok(end) => end,
                Err(_) => continue,
            };

            if is_destructuring_target(stream, index, end) {
                retag_destructuring(stream, index, end);
                retag_nested_targets(stream, index, end);
            } else {
                stream.set_kind_at(index, TokenKind::ArraySquareOpen);
                stream.set_kind_at(end, TokenKind::ArraySquareClose);
            }
        }
    }
}

fn retag_destructuring(stream: &mut TokenStream, open: usize, close: usize) {
    stream.set_kind_at(open, TokenKind::DestructuringSquareOpen);
    stream.set_kind_at(close, TokenKind::DestructuringSquareClose);
}

/// PHP forbids mixing `[...]` and `list(...)` across nesting levels, so
/// every short-array bracket inside a destructuring target is itself a
/// destructuring target. Index accesses (`[$a[0]] = $x`) keep their kind.
fn retag_nested_targets(stream: &mut TokenStream, open: usize, close: usize) {
    for index in open + 1..close {
        if !stream[index].is_kind(TokenKind::SquareOpen) {
            continue;
        }
        if !is_short_array(stream, index) {
            continue;
        }
        if let Ok(end) = stream.find_block_end(BlockKind::Square, index) {
            retag_destructuring(stream, index, end);
        }
    }
}

/// A `[` is a short array (or destructuring target) unless the previous
/// meaningful token can end an expression, which makes it an index access.
fn is_short_array(stream: &TokenStream, index: usize) -> bool {
    let prev = match stream.prev_meaningful(index) {
        Some(prev) => prev,
        None => return true,
    };
    !matches!(
        stream[prev].kind(),
        TokenKind::Variable
            | TokenKind::Identifier
            | TokenKind::ConstantString
            | TokenKind::DoubleQuote
            | TokenKind::ParenClose
            | TokenKind::SquareClose
            | TokenKind::BraceClose
            | TokenKind::ArraySquareClose
            | TokenKind::DestructuringSquareClose
            | TokenKind::StringCurlyClose
            | TokenKind::DollarCloseCurly
    )
}

fn is_destructuring_target(stream: &TokenStream, open: usize, close: usize) -> bool {
    if let Some(next) = stream.next_meaningful(close) {
        if stream[next].is_kind(TokenKind::Equals) {
            return true;
        }
    }

    let prev = match stream.prev_meaningful(open) {
        Some(prev) => prev,
        None => return false,
    };
    match stream[prev].kind() {
        TokenKind::As => true,
        // `as $key => [...]` destructures; `'key' => [...]` inside an array
        // literal does not. Walk left from the arrow until something settles
        // it.
        TokenKind::DoubleArrow => arrow_belongs_to_foreach(stream, prev),
        _ => false,
    }
}

fn arrow_belongs_to_foreach(stream: &TokenStream, arrow: usize) -> bool {
    let mut index = arrow;
    while let Some(prev) = stream.prev_meaningful(index) {
        match stream[prev].kind() {
            TokenKind::As => return true,
            TokenKind::OpenTag
            | TokenKind::OpenTagEcho
            | TokenKind::Semicolon
            | TokenKind::Comma
            | TokenKind::Equals
            | TokenKind::DoubleArrow
            | TokenKind::ParenOpen
            | TokenKind::BraceOpen
            | TokenKind::SquareOpen
            | TokenKind::AttributeOpen
            | TokenKind::ArraySquareOpen
            | TokenKind::DestructuringSquareOpen
            | TokenKind::CurlyOpen
            | TokenKind::DollarOpenCurly => return false,
            _ => index = prev,
        }
    }
    false
}
