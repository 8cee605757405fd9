//! Paired-delimiter matching over a token stream.
//!
//! Block edges are found by depth counting over the block's own open and
//! close kinds, so `(`...`)` nesting is handled and tombstones fall out
//! naturally. Results are memoized in the stream's edge cache, which every
//! mutation drops.

use std::fmt;

use crate::kind::TokenKind;
use crate::stream::TokenStream;

/// The delimiter pairs block search understands.
///
/// The square-bracket pairs exist in three flavors because transformers
/// retag `[` by role; matching an array literal's brackets must not stop at
/// an index access's `]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paren,
    Brace,
    Square,
    Attribute,
    ArraySquare,
    DestructuringSquare,
    DollarCurly,
    StringCurly,
}

impl BlockKind {
    pub fn open_kind(self) -> TokenKind {
        match self {
            BlockKind::Paren => TokenKind::ParenOpen,
            BlockKind::Brace => TokenKind::BraceOpen,
            BlockKind::Square => TokenKind::SquareOpen,
            BlockKind::Attribute => TokenKind::AttributeOpen,
            BlockKind::ArraySquare => TokenKind::ArraySquareOpen,
            BlockKind::DestructuringSquare => TokenKind::DestructuringSquareOpen,
            BlockKind::DollarCurly => TokenKind::DollarOpenCurly,
            BlockKind::StringCurly => TokenKind::CurlyOpen,
        }
    }

    pub fn close_kind(self) -> TokenKind {
        match self {
            BlockKind::Paren => TokenKind::ParenClose,
            BlockKind::Brace => TokenKind::BraceClose,
            BlockKind::Square => TokenKind::SquareClose,
            BlockKind::Attribute => TokenKind::SquareClose,
            BlockKind::ArraySquare => TokenKind::ArraySquareClose,
            BlockKind::DestructuringSquare => TokenKind::DestructuringSquareClose,
            BlockKind::DollarCurly => TokenKind::DollarCloseCurly,
            BlockKind::StringCurly => TokenKind::StringCurlyClose,
        }
    }

    /// The block a given opening kind starts, if any.
    pub fn from_open(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::ParenOpen => Some(BlockKind::Paren),
            TokenKind::BraceOpen => Some(BlockKind::Brace),
            TokenKind::SquareOpen => Some(BlockKind::Square),
            TokenKind::AttributeOpen => Some(BlockKind::Attribute),
            TokenKind::ArraySquareOpen => Some(BlockKind::ArraySquare),
            TokenKind::DestructuringSquareOpen => Some(BlockKind::DestructuringSquare),
            TokenKind::DollarOpenCurly => Some(BlockKind::DollarCurly),
            TokenKind::CurlyOpen => Some(BlockKind::StringCurly),
            _ => None,
        }
    }

    /// The block a given closing kind ends, if any. `SquareClose` resolves
    /// to [`BlockKind::Square`]; attribute blocks share its closer.
    pub fn from_close(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::ParenClose => Some(BlockKind::Paren),
            TokenKind::BraceClose => Some(BlockKind::Brace),
            TokenKind::SquareClose => Some(BlockKind::Square),
            TokenKind::ArraySquareClose => Some(BlockKind::ArraySquare),
            TokenKind::DestructuringSquareClose => Some(BlockKind::DestructuringSquare),
            TokenKind::DollarCloseCurly => Some(BlockKind::DollarCurly),
            TokenKind::StringCurlyClose => Some(BlockKind::StringCurly),
            _ => None,
        }
    }
}

/// A block whose other edge is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockError {
    pub block: BlockKind,
    pub index: usize,
    pub forward: bool,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.forward {
            write!(
                f,
                "unbalanced {:?} block: no closing token for the opener at index {}",
                self.block, self.index
            )
        } else {
            write!(
                f,
                "unbalanced {:?} block: no opening token for the closer at index {}",
                self.block, self.index
            )
        }
    }
}

impl std::error::Error for BlockError {}

impl TokenStream {
    /// Index of the closer matching the opener at `open`.
    ///
    /// The token at `open` must actually be the block's opening kind;
    /// anything else is a programming error and panics.
    pub fn find_block_end(&self, block: BlockKind, open: usize) -> Result<usize, BlockError> {
        assert!(
            self[open].is_kind(block.open_kind()),
            "token at {} is not a {:?} opener",
            open,
            block
        );
        if let Some(end) = self.block_edge_cached(open) {
            return Ok(end);
        }

        let open_kind = block.open_kind();
        let close_kind = block.close_kind();
        let mut depth = 0usize;
        for index in open..self.len() {
            let kind = self[index].kind();
            if kind == open_kind {
                depth += 1;
            } else if kind == close_kind {
                depth -= 1;
                if depth == 0 {
                    self.cache_block_edge(open, index);
                    return Ok(index);
                }
            }
        }

        Err(BlockError {
            block,
            index: open,
            forward: true,
        })
    }

    /// Index of the opener matching the closer at `close`.
    pub fn find_block_start(&self, block: BlockKind, close: usize) -> Result<usize, BlockError> {
        assert!(
            self[close].is_kind(block.close_kind()),
            "token at {} is not a {:?} closer",
            close,
            block
        );
        if let Some(start) = self.block_edge_cached(close) {
            return Ok(start);
        }

        let open_kind = block.open_kind();
        let close_kind = block.close_kind();
        let mut depth = 0usize;
        for index in (0..=close).rev() {
            let kind = self[index].kind();
            if kind == close_kind {
                depth += 1;
            } else if kind == open_kind {
                depth -= 1;
                if depth == 0 {
                    self.cache_block_edge(index, close);
                    return Ok(index);
                }
            }
        }

        Err(BlockError {
            block,
            index: close,
            forward: false,
        })
    }
}
