//! # phix-engine
//!
//! The fixing engine behind the phix command line: fixer contracts, the
//! built-in fixer catalog, rule resolution, syntax gating, the parallel
//! file runner and its reports.
//!
//! A run goes through four layers. [`fixer::resolve`] turns a rule set
//! into an ordered list of configured [`Fixer`] values plus a signature
//! identifying that exact configuration. A [`Linter`] rejects files the
//! fixers must not touch. The [`Runner`] drives each file through
//! tokenize, fix and write, iterating until the fixer set stops changing
//! the file, skipping files the [`Cache`] knows are clean. A [`Reporter`]
//! renders the collected outcomes for a terminal or for tooling.
//!
//! Tokenization itself lives in the `phix-lexer` crate; everything here
//! works on its [`phix_lexer::TokenStream`].

pub mod cache;
pub mod fixer;
pub mod linter;
pub mod report;
pub mod runner;
pub mod testing;
pub mod whitespace;

pub use cache::{content_hash, Cache};
pub use fixer::resolve::{
    builtin_fixers, resolve_fixers, ResolvedFixerSet, RuleSet, RuleSetting,
};
pub use fixer::{ConfigurationError, Fixer, FixerError, FixerOptions};
pub use linter::{LintDiagnostic, LintError, LintStatus, Linter, ProcessLinter, TokenizerLinter};
pub use report::{reporter_for, JsonReporter, Reporter, TextReporter};
pub use runner::{ApplyOutcome, FileReport, RunSummary, Runner, RunnerOptions};
pub use whitespace::{WhitespaceConfig, WhitespaceError};
