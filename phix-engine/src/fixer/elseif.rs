//! Folds `else if` into `elseif`.

use phix_lexer::{TokenKind, TokenStream};

use crate::fixer::{Fixer, FixerError};

/// Replaces the two-keyword `else if` with the single `elseif` keyword.
///
/// The two spellings compile to the same thing when the branch uses
/// braces; PHP's alternative `:` syntax only accepts `elseif` in the first
/// place. Comments between the keywords survive the merge.
#[derive(Debug, Default)]
pub struct ElseifFixer;

impl Fixer for ElseifFixer {
    fn name(&self) -> &'static str {
        "elseif"
    }

    fn description(&self) -> &'static str {
        "Replaces else if with the single elseif keyword."
    }

    fn priority(&self) -> i32 {
        42
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        stream.are_all_kinds_found(&[TokenKind::Else, TokenKind::If])
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            if !stream[index].is_kind(TokenKind::Else) {
                continue;
            }
            let if_index = match stream.next_meaningful(index) {
                Some(next) if stream[next].is_kind(TokenKind::If) => next,
                _ => continue,
            };
            stream.replace_at(index, TokenKind::ElseIf, "elseif");
            if index + 1 < stream.len() && stream[index + 1].is_kind(TokenKind::Whitespace) {
                stream.clear_at(index + 1);
            }
            stream.clear_and_merge_surrounding_whitespace(if_index);
        }
        Ok(())
    }
}
