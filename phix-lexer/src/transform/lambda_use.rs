//! Separates closure captures from imports.

use crate::kind::TokenKind;
use crate::stream::TokenStream;
use crate::transform::TokenTransformer;

/// Retags `use` as [`TokenKind::LambdaUse`] when it follows a closing
/// parenthesis, i.e. `function (...) use (...)`. Imports and trait uses
/// never sit after `)`.
pub struct LambdaUseTransformer;

impl TokenTransformer for LambdaUseTransformer {
    fn name(&self) -> &'static str {
        "lambda_use"
    }

    fn custom_kinds(&self) -> &'static [TokenKind] {
        &[TokenKind::LambdaUse]
    }

    fn transform(&self, stream: &mut TokenStream) {
        if !stream.is_kind_found(TokenKind::Use) {
            return;
        }

        for index in 0..stream.len() {
            if !stream[index].is_kind(TokenKind::Use) {
                continue;
            }
            let captures = stream
                .prev_meaningful(index)
                .map_or(false, |prev| stream[prev].is_kind(TokenKind::ParenClose));
            if captures {
                stream.set_kind_at(index, TokenKind::LambdaUse);
            }
        }
    }
}
