//! Splits the `array` keyword into constructor and typehint uses.

use crate::kind::TokenKind;
use crate::stream::TokenStream;
use crate::transform::TokenTransformer;

/// Retags `array` as [`TokenKind::ArrayTypehint`] unless it is followed by
/// `(`, which makes it the long array constructor `array(...)`.
pub struct ArrayTypehintTransformer;

impl TokenTransformer for ArrayTypehintTransformer {
    fn name(&self) -> &'static str {
        "array_typehint"
    }

    fn custom_kinds(&self) -> &'static [TokenKind] {
        &[TokenKind::ArrayTypehint]
    }

    fn transform(&self, stream: &mut TokenStream) {
        if !stream.is_kind_found(TokenKind::Array) {
            return;
        }

        for index in 0..stream.len() {
            if !stream[index].is_kind(TokenKind::Array) {
                continue;
            }
            let is_constructor = stream
                .next_meaningful(index)
                .map_or(false, |next| stream[next].is_kind(TokenKind::ParenOpen));
            if !is_constructor {
                stream.set_kind_at(index, TokenKind::ArrayTypehint);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{KindRegistry, TokenKind as K};
    use crate::lexing::tokenize_raw;

    fn apply(source: &str) -> TokenStream {
        let registry = KindRegistry::new();
        let mut stream = tokenize_raw(source, &registry).unwrap();
        ArrayTypehintTransformer.transform(&mut stream);
        stream
    }

    fn kinds_of(stream: &TokenStream, kind: K) -> usize {
        stream.iter().filter(|t| t.is_kind(kind)).count()
    }

    #[test]
    fn parameter_and_return_hints_are_retagged() {
        let stream = apply("<?php function f(array $a): array {}");
        assert_eq!(kinds_of(&stream, K::ArrayTypehint), 2);
        assert_eq!(kinds_of(&stream, K::Array), 0);
    }

    #[test]
    fn long_array_constructor_keeps_its_kind() {
        let stream = apply("<?php $a = array(1, 2);");
        assert_eq!(kinds_of(&stream, K::Array), 1);
        assert_eq!(kinds_of(&stream, K::ArrayTypehint), 0);
    }

    #[test]
    fn constructor_with_comment_before_paren_keeps_its_kind() {
        let stream = apply("<?php $a = array /* legacy */ (1);");
        assert_eq!(kinds_of(&stream, K::Array), 1);
    }

    #[test]
    fn trailing_array_keyword_is_a_typehint() {
        // Cut-off input: no following meaningful token.
        let stream = apply("<?php function f(): array");
        assert_eq!(kinds_of(&stream, K::ArrayTypehint), 1);
    }

    #[test]
    fn mixed_uses_are_split() {
        let stream = apply("<?php function f(array $a) { return array($a); }");
        assert_eq!(kinds_of(&stream, K::ArrayTypehint), 1);
        assert_eq!(kinds_of(&stream, K::Array), 1);
    }
}
