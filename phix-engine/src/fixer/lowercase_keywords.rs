//! Rewrites PHP keywords in lowercase.

use phix_lexer::kind::TokenKind;
use phix_lexer::stream::TokenStream;

use crate::fixer::{Fixer, FixerError};

/// Lowercases every keyword token, `IF` to `if` and so on.
///
/// The retagged forms of `array` and `use` keep their keyword spelling
/// rules even though they are no longer plain keyword kinds, so they are
/// folded as well.
#[derive(Debug, Default)]
pub struct LowercaseKeywordsFixer;

const KEYWORD_LIKE: &[TokenKind] = &[TokenKind::ArrayTypehint, TokenKind::LambdaUse];

impl Fixer for LowercaseKeywordsFixer {
    fn name(&self) -> &'static str {
        "lowercase_keywords"
    }

    fn description(&self) -> &'static str {
        "Writes PHP keywords in lowercase."
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        stream.is_any_keyword_found() || stream.is_any_kind_found(KEYWORD_LIKE)
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            let token = &stream[index];
            let kind = token.kind();
            if !kind.is_keyword() && !KEYWORD_LIKE.contains(&kind) {
                continue;
            }
            if token.content().bytes().any(|byte| byte.is_ascii_uppercase()) {
                let lowered = token.content().to_ascii_lowercase();
                stream.set_content_at(index, lowered);
            }
        }
        Ok(())
    }
}
