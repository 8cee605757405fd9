//! End-to-end runs over real files on disk.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use tempfile::{tempdir, TempDir};

use phix_engine::fixer::{Fixer, FixerError};
use phix_engine::{
    resolve_fixers, ApplyOutcome, Cache, Runner, RunnerOptions, RuleSet, RuleSetting,
    TokenizerLinter, WhitespaceConfig,
};
use phix_lexer::{TokenKind, TokenStream};

fn rules(names: &[&str]) -> RuleSet {
    names
        .iter()
        .map(|name| (name.to_string(), RuleSetting::Enabled(true)))
        .collect()
}

fn fixers_for(names: &[&str]) -> Vec<Box<dyn Fixer>> {
    resolve_fixers(&rules(names), false, &WhitespaceConfig::default())
        .unwrap()
        .fixers
}

fn runner_for(names: &[&str]) -> Runner {
    Runner::new(fixers_for(names), Box::new(TokenizerLinter::new())).unwrap()
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn fixing_rewrites_the_file() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php $a = TRUE;\n");

    let mut runner = runner_for(&["constant_case"]);
    let summary = runner.run(&[path.clone()]);

    assert_eq!(summary.fixed_count(), 1);
    assert_eq!(
        summary.reports[0].outcome,
        ApplyOutcome::Fixed {
            non_converged: false
        }
    );
    assert_eq!(summary.reports[0].applied_fixers, vec!["constant_case"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "<?php $a = true;\n");
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php $a = TRUE;\n");

    let mut runner = runner_for(&["constant_case"]).with_options(RunnerOptions {
        dry_run: true,
        emit_diff: true,
        ..RunnerOptions::default()
    });
    let summary = runner.run(&[path.clone()]);

    assert_eq!(summary.fixed_count(), 1);
    assert!(summary.dry_run);
    let diff = summary.reports[0].diff.as_deref().unwrap();
    assert!(diff.contains("-<?php $a = TRUE;"));
    assert!(diff.contains("+<?php $a = true;"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "<?php $a = TRUE;\n");
}

#[test]
fn clean_files_report_no_changes() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php $a = true;\n");

    let mut runner = runner_for(&["constant_case"]);
    let summary = runner.run(&[path]);

    assert_eq!(summary.reports[0].outcome, ApplyOutcome::NoChanges);
    assert!(summary.reports[0].applied_fixers.is_empty());
}

#[test]
fn invalid_files_are_reported_and_left_alone() {
    let dir = tempdir().unwrap();
    let source = "<?php if ($a { echo 1;\n";
    let path = write_file(&dir, "bad.php", source);

    let mut runner = runner_for(&["constant_case"]);
    let summary = runner.run(&[path.clone()]);

    assert_eq!(summary.invalid_count(), 1);
    match &summary.reports[0].outcome {
        ApplyOutcome::Invalid { diagnostics } => assert!(!diagnostics.is_empty()),
        other => panic!("expected an invalid outcome, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn unreadable_files_become_exceptions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.php");

    let mut runner = runner_for(&["constant_case"]);
    let summary = runner.run(&[path]);

    assert_eq!(summary.exception_count(), 1);
    match &summary.reports[0].outcome {
        ApplyOutcome::Exception { fixer, message } => {
            assert_eq!(*fixer, None);
            assert!(message.contains("failed to read file"));
        }
        other => panic!("expected an exception, got {other:?}"),
    }
}

#[test]
fn non_utf8_files_become_exceptions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.php");
    fs::write(&path, b"<?php echo '\xE9';\n").unwrap();

    let mut runner = runner_for(&["constant_case"]);
    let summary = runner.run(&[path]);

    match &summary.reports[0].outcome {
        ApplyOutcome::Exception { message, .. } => assert!(message.contains("UTF-8")),
        other => panic!("expected an exception, got {other:?}"),
    }
}

#[test]
fn cache_skips_unchanged_files_on_the_second_run() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php $a = TRUE;\n");
    let cache_path = dir.path().join(".phix.cache");

    let set = resolve_fixers(&rules(&["constant_case"]), false, &WhitespaceConfig::default())
        .unwrap();
    let mut runner = Runner::new(set.fixers, Box::new(TokenizerLinter::new()))
        .unwrap()
        .with_cache(Cache::load(&cache_path, &set.signature), cache_path.clone());
    let summary = runner.run(&[path.clone()]);
    assert_eq!(summary.fixed_count(), 1);
    runner.persist_cache().unwrap();

    let set = resolve_fixers(&rules(&["constant_case"]), false, &WhitespaceConfig::default())
        .unwrap();
    let mut runner = Runner::new(set.fixers, Box::new(TokenizerLinter::new()))
        .unwrap()
        .with_cache(Cache::load(&cache_path, &set.signature), cache_path);
    let summary = runner.run(&[path]);
    assert_eq!(summary.reports[0].outcome, ApplyOutcome::Skipped);
}

#[test]
fn changing_the_rule_set_invalidates_the_cache() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php $a = TRUE;\n");
    let cache_path = dir.path().join(".phix.cache");

    let set = resolve_fixers(&rules(&["constant_case"]), false, &WhitespaceConfig::default())
        .unwrap();
    let mut runner = Runner::new(set.fixers, Box::new(TokenizerLinter::new()))
        .unwrap()
        .with_cache(Cache::load(&cache_path, &set.signature), cache_path.clone());
    runner.run(&[path.clone()]);
    runner.persist_cache().unwrap();

    // Same file, different fixer set: the old verdict no longer applies.
    let set = resolve_fixers(
        &rules(&["constant_case", "lowercase_keywords"]),
        false,
        &WhitespaceConfig::default(),
    )
    .unwrap();
    let mut runner = Runner::new(set.fixers, Box::new(TokenizerLinter::new()))
        .unwrap()
        .with_cache(Cache::load(&cache_path, &set.signature), cache_path);
    let summary = runner.run(&[path]);
    assert_eq!(summary.reports[0].outcome, ApplyOutcome::NoChanges);
}

/// Rewrites one identifier spelling into another.
struct Rename {
    name: &'static str,
    from: &'static str,
    to: &'static str,
}

impl Fixer for Rename {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_candidate(&self, _stream: &TokenStream) -> bool {
        true
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            if stream[index].kind() == TokenKind::Identifier
                && stream[index].content() == self.from
            {
                stream.set_content_at(index, self.to);
            }
        }
        Ok(())
    }
}

#[test]
fn interacting_fixers_converge_across_passes() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php alpha();\n");

    // beta_to_gamma runs first each pass, so it only sees alpha_to_beta's
    // output on the following pass.
    let fixers: Vec<Box<dyn Fixer>> = vec![
        Box::new(Rename {
            name: "beta_to_gamma",
            from: "beta",
            to: "gamma",
        }),
        Box::new(Rename {
            name: "alpha_to_beta",
            from: "alpha",
            to: "beta",
        }),
    ];
    let mut runner = Runner::new(fixers, Box::new(TokenizerLinter::new())).unwrap();
    let summary = runner.run(&[path.clone()]);

    assert_eq!(
        summary.reports[0].outcome,
        ApplyOutcome::Fixed {
            non_converged: false
        }
    );
    assert_eq!(
        summary.reports[0].applied_fixers,
        vec!["alpha_to_beta", "beta_to_gamma"]
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "<?php gamma();\n");
}

/// Flips one identifier back and forth; never settles.
struct Flip;

impl Fixer for Flip {
    fn name(&self) -> &'static str {
        "flip"
    }

    fn is_candidate(&self, _stream: &TokenStream) -> bool {
        true
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            if stream[index].kind() != TokenKind::Identifier {
                continue;
            }
            if stream[index].content() == "aaa" {
                stream.set_content_at(index, "bbb");
            } else if stream[index].content() == "bbb" {
                stream.set_content_at(index, "aaa");
            }
        }
        Ok(())
    }
}

#[test]
fn oscillating_fixers_hit_the_pass_limit() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php aaa();\n");
    let cache_path = dir.path().join(".phix.cache");

    let mut runner = Runner::new(vec![Box::new(Flip) as Box<dyn Fixer>], Box::new(TokenizerLinter::new()))
        .unwrap()
        .with_options(RunnerOptions {
            max_passes: 3,
            ..RunnerOptions::default()
        })
        .with_cache(Cache::load(&cache_path, "sig"), cache_path.clone());
    let summary = runner.run(&[path.clone()]);
    runner.persist_cache().unwrap();

    assert_eq!(
        summary.reports[0].outcome,
        ApplyOutcome::Fixed {
            non_converged: true
        }
    );
    // Three flips leave the other spelling on disk.
    assert_eq!(fs::read_to_string(&path).unwrap(), "<?php bbb();\n");
    // A file that never settled must not be marked clean.
    assert!(Cache::load(&cache_path, "sig").is_empty());
}

/// Panics on every file.
struct Exploding;

impl Fixer for Exploding {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn is_candidate(&self, _stream: &TokenStream) -> bool {
        true
    }

    fn apply(&self, _stream: &mut TokenStream) -> Result<(), FixerError> {
        panic!("boom");
    }
}

#[test]
fn fixer_panics_leave_the_file_untouched() {
    let dir = tempdir().unwrap();
    let source = "<?php $a = TRUE;\n";
    let path = write_file(&dir, "a.php", source);

    let mut fixers = fixers_for(&["constant_case"]);
    fixers.insert(0, Box::new(Exploding));
    let mut runner = Runner::new(fixers, Box::new(TokenizerLinter::new())).unwrap();
    let summary = runner.run(&[path.clone()]);

    assert_eq!(
        summary.reports[0].outcome,
        ApplyOutcome::Exception {
            fixer: Some("exploding"),
            message: "boom".to_string(),
        }
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn parallel_runs_keep_input_order_and_are_deterministic() {
    let dir = tempdir().unwrap();
    let paths = vec![
        write_file(&dir, "a.php", "<?php $a = TRUE;\n"),
        write_file(&dir, "b.php", "<?php $b = true;\n"),
        write_file(&dir, "c.php", "<?php if ($c { }\n"),
        write_file(&dir, "d.php", "<?php $d = NULL;\n"),
    ];

    let run = |paths: &[PathBuf]| {
        let mut runner = runner_for(&["constant_case"]).with_options(RunnerOptions {
            dry_run: true,
            workers: 4,
            ..RunnerOptions::default()
        });
        runner
            .run(paths)
            .reports
            .into_iter()
            .map(|report| (report.path, report.outcome))
            .collect::<Vec<_>>()
    };

    let first = run(&paths);
    let second = run(&paths);
    assert_eq!(first, second);

    let outcomes: Vec<_> = first.iter().map(|(_, outcome)| outcome.clone()).collect();
    assert_eq!(
        outcomes[0],
        ApplyOutcome::Fixed {
            non_converged: false
        }
    );
    assert_eq!(outcomes[1], ApplyOutcome::NoChanges);
    assert!(matches!(outcomes[2], ApplyOutcome::Invalid { .. }));
    assert_eq!(
        outcomes[3],
        ApplyOutcome::Fixed {
            non_converged: false
        }
    );
    assert_eq!(first[0].0, paths[0]);
    assert_eq!(first[3].0, paths[3]);
}

#[test]
fn a_raised_stop_flag_skips_everything() {
    let dir = tempdir().unwrap();
    let source = "<?php $a = TRUE;\n";
    let path = write_file(&dir, "a.php", source);

    let mut runner = runner_for(&["constant_case"]);
    runner.stop_flag().store(true, Ordering::SeqCst);
    let summary = runner.run(&[path.clone()]);

    assert_eq!(summary.reports[0].outcome, ApplyOutcome::Skipped);
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn destructuring_and_tag_rules_compose() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "<?php list($a) = $b ?>\n");

    let mut runner = runner_for(&[
        "list_syntax",
        "no_closing_tag",
        "single_blank_line_at_eof",
    ]);
    let summary = runner.run(&[path.clone()]);

    assert_eq!(
        summary.reports[0].applied_fixers,
        vec!["list_syntax", "no_closing_tag", "single_blank_line_at_eof"]
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "<?php [$a] = $b;\n");
}

#[test]
fn byte_order_marks_are_stripped_on_disk() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "a.php", "\u{FEFF}<?php echo 1;\n");

    let mut runner = runner_for(&["encoding"]);
    let summary = runner.run(&[path.clone()]);

    assert_eq!(summary.fixed_count(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "<?php echo 1;\n");
}
