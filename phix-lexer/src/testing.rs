//! Test helpers shared by this crate's tests and downstream crates.
//!
//! Fixer and runner tests constantly need "the tokens of this snippet" and
//! "the kinds of this snippet". Going through [`SourceTokenizer`] each time
//! buries the interesting assertion under setup, so the helpers below do the
//! plumbing and panic loudly on lex errors, which in a test always means the
//! snippet itself is wrong.

use crate::lexing::SourceTokenizer;
use crate::stream::TokenStream;
use crate::token::Token;
use crate::TokenKind;

/// Tokenizes a snippet through the full pipeline, panicking on any error.
pub fn stream_of(source: &str) -> TokenStream {
    let tokenizer = match SourceTokenizer::new() {
        Ok(tokenizer) => tokenizer,
        Err(err) => panic!("tokenizer construction failed: {err}"),
    };
    match tokenizer.tokenize(source) {
        Ok(stream) => stream,
        Err(err) => panic!("failed to tokenize {source:?}: {err}"),
    }
}

/// The tokens of a snippet, in stream order.
pub fn tokens_of(source: &str) -> Vec<Token> {
    stream_of(source).iter().cloned().collect()
}

/// The token kinds of a snippet, in order.
pub fn kinds_of(source: &str) -> Vec<TokenKind> {
    stream_of(source).iter().map(|t| t.kind()).collect()
}
