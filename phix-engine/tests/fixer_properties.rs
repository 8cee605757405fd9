//! Contract checks every shipped fixer must satisfy.
//!
//! The runner leans on two promises: applying a fixer twice in a row,
//! retokenizing in between exactly as the runner does, changes nothing the
//! second time; and a fixer whose `is_candidate` said no leaves the source
//! untouched when applied anyway.

use proptest::prelude::*;

use phix_engine::builtin_fixers;
use phix_engine::testing::apply_fixer;
use phix_lexer::testing::stream_of;

const SNIPPETS: &[&str] = &[
    "<?php $a = TRUE;\n",
    "<?php $a = array(1, 2);\n",
    "<?php list($a, list($b)) = $c;\n",
    "<?php if ($a) {} else if ($b) {}\n",
    "<?php ECHO 1 ?>\n",
    "\u{FEFF}<?php echo 1;\n",
    "<?php declare(strict_types=1); $a = [1];\n",
    "<?php $x->array(1);\n",
    "<?php $x->list(1);\n",
    "<?php #[Attr(1)]\nfunction f(): array { return []; }\n",
    "<?php $x = <<<EOT\nhello\nEOT;\n",
    "<?php $s = \"x{$a[1]}y\";\n",
    "<?= $name ?>\n",
    "no php here\n",
    "<?php\n",
];

fn name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

fn expression() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,4}",
        name().prop_map(|n| format!("${n}")),
        Just("TRUE".to_string()),
        Just("array(1, 2)".to_string()),
        name().prop_map(|n| format!("{n}()")),
    ]
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (name(), expression()).prop_map(|(n, e)| format!("${n} = {e};")),
        expression().prop_map(|e| format!("echo {e};")),
        (name(), expression())
            .prop_map(|(n, e)| format!("if (${n}) {{ echo {e}; }} else if (${n}) {{}}")),
        Just("list($a, $b) = $pair;".to_string()),
        Just("$v = ARRAY(1);".to_string()),
    ]
}

/// Whole files: optional BOM or HTML, statements, optional closing tag or
/// missing final newline.
fn generated_php() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(String::new()),
            Just("\u{FEFF}".to_string()),
            Just("<p>x</p>".to_string()),
        ],
        prop::collection::vec(statement(), 0..6),
        // Literal suffixes; `?` would be a quantifier in a regex arm.
        prop_oneof![
            Just(String::new()),
            Just("\n".to_string()),
            Just(" ?>".to_string()),
            Just(" ?>\n".to_string()),
        ],
    )
        .prop_map(|(prefix, statements, suffix)| {
            format!("{prefix}<?php\n{}{suffix}", statements.join("\n"))
        })
}

proptest! {
    #[test]
    fn fixers_are_idempotent_on_curated_sources(
        which in any::<prop::sample::Index>(),
        snippet in prop::sample::select(SNIPPETS),
    ) {
        let fixers = builtin_fixers();
        let fixer = fixers[which.index(fixers.len())].as_ref();
        let once = apply_fixer(fixer, snippet);
        let twice = apply_fixer(fixer, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn fixers_are_idempotent_on_generated_sources(
        which in any::<prop::sample::Index>(),
        source in generated_php(),
    ) {
        let fixers = builtin_fixers();
        let fixer = fixers[which.index(fixers.len())].as_ref();
        let once = apply_fixer(fixer, &source);
        let twice = apply_fixer(fixer, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn non_candidates_leave_the_source_alone(
        which in any::<prop::sample::Index>(),
        snippet in prop::sample::select(SNIPPETS),
    ) {
        let fixers = builtin_fixers();
        let fixer = fixers[which.index(fixers.len())].as_ref();
        if !fixer.is_candidate(&stream_of(snippet)) {
            prop_assert_eq!(apply_fixer(fixer, snippet), snippet);
        }
    }
}
