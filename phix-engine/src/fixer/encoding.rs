//! Strips the UTF-8 byte order mark.

use phix_lexer::TokenStream;

use crate::fixer::{Fixer, FixerError};

const BOM: char = '\u{FEFF}';

/// PHP emits the BOM as output before the first `<?php`, which breaks
/// header() calls and corrupts binary responses. Runs first so fixers that
/// reason about the leading open tag see the file without it.
pub struct EncodingFixer;

impl Fixer for EncodingFixer {
    fn name(&self) -> &'static str {
        "encoding"
    }

    fn description(&self) -> &'static str {
        "Strips the UTF-8 byte order mark from the start of the file."
    }

    fn priority(&self) -> i32 {
        100
    }

    fn runs_before(&self) -> &'static [&'static str] {
        &["declare_strict_types"]
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        stream
            .get(0)
            .map_or(false, |token| token.content().starts_with(BOM))
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        let rest = match stream.get(0) {
            Some(token) if token.content().starts_with(BOM) => {
                token.content().trim_start_matches(BOM).to_string()
            }
            _ => return Ok(()),
        };
        if rest.is_empty() {
            stream.clear_at(0);
        } else {
            stream.set_content_at(0, rest);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{apply_fixer, assert_no_op};

    #[test]
    fn bom_before_open_tag_is_removed() {
        assert_eq!(
            apply_fixer(&EncodingFixer, "\u{FEFF}<?php echo 1;"),
            "<?php echo 1;"
        );
    }

    #[test]
    fn bom_before_html_is_removed_but_html_stays() {
        assert_eq!(
            apply_fixer(&EncodingFixer, "\u{FEFF}<b>x</b><?php echo 1;"),
            "<b>x</b><?php echo 1;"
        );
    }

    #[test]
    fn files_without_bom_are_untouched() {
        assert_no_op(&EncodingFixer, "<?php echo 1;");
    }

    #[test]
    fn candidate_only_when_leading_bom() {
        use phix_lexer::testing::stream_of;
        assert!(EncodingFixer.is_candidate(&stream_of("\u{FEFF}<?php $a;")));
        assert!(!EncodingFixer.is_candidate(&stream_of("<?php $a = \"\u{FEFF}\";")));
    }
}
