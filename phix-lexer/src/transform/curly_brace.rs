//! Pairs up interpolation braces inside double-quoted strings.
//!
//! The lexer emits `${` and `{` (before `$`) inside interpolated strings as
//! [`TokenKind::DollarOpenCurly`] and [`TokenKind::CurlyOpen`], but their
//! closing `}` comes out as a plain [`TokenKind::BraceClose`]. This pass
//! retags each closing brace so block matching can treat `${...}` and
//! `{$...}` as first-class pairs.

use crate::kind::TokenKind;
use crate::stream::TokenStream;
use crate::transform::TokenTransformer;

pub struct CurlyBraceTransformer;

impl TokenTransformer for CurlyBraceTransformer {
    fn name(&self) -> &'static str {
        "curly_brace"
    }

    fn custom_kinds(&self) -> &'static [TokenKind] {
        &[TokenKind::DollarCloseCurly, TokenKind::StringCurlyClose]
    }

    fn transform(&self, stream: &mut TokenStream) {
        if !stream.is_any_kind_found(&[TokenKind::DollarOpenCurly, TokenKind::CurlyOpen]) {
            return;
        }

        for index in 0..stream.len() {
            match stream[index].kind() {
                TokenKind::DollarOpenCurly => {
                    retag_closer(stream, index, TokenKind::DollarCloseCurly);
                }
                TokenKind::CurlyOpen => {
                    retag_closer(stream, index, TokenKind::StringCurlyClose);
                }
                _ => {}
            }
        }
    }
}

/// Finds the brace closing the interpolation opened at `open` and retags it.
///
/// Already-retagged closers count towards depth so a second run finds the
/// pair balanced and leaves it alone.
fn retag_closer(stream: &mut TokenStream, open: usize, close_kind: TokenKind) {
    let mut depth = 1usize;
    let mut index = open;
    loop {
        index += 1;
        if index >= stream.len() {
            // Unbalanced interpolation; nothing to retag.
            return;
        }
        match stream[index].kind() {
            TokenKind::BraceOpen | TokenKind::DollarOpenCurly | TokenKind::CurlyOpen => depth += 1,
            TokenKind::BraceClose
            | TokenKind::DollarCloseCurly
            | TokenKind::StringCurlyClose => {
                depth -= 1;
                if depth == 0 {
                    if stream[index].is_kind(TokenKind::BraceClose) {
                        stream.set_kind_at(index, close_kind);
                    }
                    return;
                }
            }
            _ => {}
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
        CurlyBraceTransformer.transform(&mut stream);
        stream
    }

    fn kind_sequence(stream: &TokenStream) -> Vec<K> {
        stream.iter().map(|t| t.kind()).collect()
    }

    #[test]
    fn dollar_curly_closer_is_retagged() {
        let stream = apply("<?php echo \"${name}\";");
        let kinds = kind_sequence(&stream);
        assert!(kinds.contains(&K::DollarOpenCurly));
        assert!(kinds.contains(&K::DollarCloseCurly));
        assert!(!kinds.contains(&K::BraceClose));
    }

    #[test]
    fn string_curly_closer_is_retagged() {
        let stream = apply("<?php echo \"{$user->name}\";");
        let kinds = kind_sequence(&stream);
        assert!(kinds.contains(&K::CurlyOpen));
        assert!(kinds.contains(&K::StringCurlyClose));
    }

    #[test]
    fn nested_code_braces_keep_their_kind() {
        // The array access inside the interpolation owns a brace pair of
        // its own; only the interpolation closer changes.
        let stream = apply("<?php echo \"{$arr['k']}\"; if ($x) { f(); }");
        let kinds = kind_sequence(&stream);
        assert_eq!(kinds.iter().filter(|k| **k == K::StringCurlyClose).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == K::BraceOpen).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == K::BraceClose).count(), 1);
    }

    #[test]
    fn two_interpolations_in_one_string() {
        let stream = apply("<?php echo \"{$a} and ${b}\";");
        let kinds = kind_sequence(&stream);
        assert_eq!(kinds.iter().filter(|k| **k == K::StringCurlyClose).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == K::DollarCloseCurly).count(), 1);
    }

    #[test]
    fn second_run_changes_nothing() {
        let source = "<?php echo \"{$a['x']} ${b}\";";
        let registry = KindRegistry::new();
        let mut stream = tokenize_raw(source, &registry).unwrap();
        CurlyBraceTransformer.transform(&mut stream);
        let once = kind_sequence(&stream);
        CurlyBraceTransformer.transform(&mut stream);
        assert_eq!(once, kind_sequence(&stream));
    }

    #[test]
    fn unterminated_interpolation_is_left_alone() {
        // Lexer-level recovery produces an open without a closer. This
        // cannot come from `tokenize_raw` (it errors), so build it by hand.
        use crate::token::Token;
        let mut stream = TokenStream::from_tokens(vec![
            Token::new(K::OpenTag, "<?php ", 1),
            Token::new(K::DollarOpenCurly, "${", 1),
            Token::new(K::Identifier, "a", 1),
        ]);
        CurlyBraceTransformer.transform(&mut stream);
        assert_eq!(stream[1].kind(), K::DollarOpenCurly);
    }
}
