//! # phix-lexer
//!
//! Lossless PHP tokenization for the phix style fixer.
//!
//! The pipeline has two stages. [`lexing`] turns source text into a flat
//! token list where every byte of the input lands in exactly one token's
//! content, so joining the contents back together reproduces the file.
//! [`transform`] then retags context-dependent tokens (`[` as array literal
//! versus index access, `use` as import versus closure capture, and so on)
//! into the synthetic kinds fixers match on.
//!
//! [`stream::TokenStream`] is the mutable collection the rest of the fixer
//! works against: stable indices, tombstoned removal with explicit
//! compaction, meaningful-token navigation, block matching and sequence
//! search.
//!
//! The everyday entry point is [`SourceTokenizer`]:
//!
//! ```rust,ignore
//! let tokenizer = SourceTokenizer::new()?;
//! let stream = tokenizer.tokenize("<?php echo 1;")?;
//! assert_eq!(stream.generate_code(), "<?php echo 1;");
//! ```

pub mod kind;
pub mod lexing;
pub mod stream;
pub mod testing;
pub mod token;
pub mod transform;

pub use kind::{KindRegistry, RegistryError, TokenKind};
pub use lexing::{LexError, SourceTokenizer};
pub use stream::{BlockError, BlockKind, SequenceItem, TokenStream};
pub use token::Token;
