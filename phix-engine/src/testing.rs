//! Test helpers for fixer behavior.
//!
//! Fixer tests all look the same: tokenize a snippet, apply one fixer,
//! regenerate, compare. These helpers keep that plumbing out of the tests
//! and bake in the idempotence check every fixer must satisfy.

use phix_lexer::testing::stream_of;

use crate::fixer::Fixer;

/// Applies one fixer to a snippet and returns the regenerated code.
///
/// Candidacy is deliberately not consulted, so tests can verify that a
/// non-candidate apply is a no-op.
pub fn apply_fixer(fixer: &dyn Fixer, source: &str) -> String {
    let mut stream = stream_of(source);
    if let Err(err) = fixer.apply(&mut stream) {
        panic!("{} failed on {source:?}: {err}", fixer.name());
    }
    stream.compact();
    stream.generate_code()
}

/// Asserts a fixer rewrites `input` into `expected`, and that a second
/// application leaves the result alone.
pub fn assert_fixes(fixer: &dyn Fixer, input: &str, expected: &str) {
    let fixed = apply_fixer(fixer, input);
    assert_eq!(fixed, expected, "{} on {input:?}", fixer.name());
    let again = apply_fixer(fixer, &fixed);
    assert_eq!(again, expected, "{} is not idempotent on {input:?}", fixer.name());
}

/// Asserts a fixer leaves `source` byte-identical.
pub fn assert_no_op(fixer: &dyn Fixer, source: &str) {
    assert_eq!(
        apply_fixer(fixer, source),
        source,
        "{} should not touch {source:?}",
        fixer.name()
    );
}
