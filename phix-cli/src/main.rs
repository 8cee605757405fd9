//! Command-line interface for phix
//! This binary applies the configured style rules to PHP files and reports
//! what changed, driven by `.phix.toml` plus command-line overrides.
//!
//! Usage:
//!   phix fix <paths>... [--dry-run] [--diff] [--rules <names>]   - Fix files or directories
//!   phix list-fixers                                             - List every shipped rule
//!
//! The exit status is a bitmask: 4 means files with syntax errors were
//! seen, 8 means files were (or in a dry run, would be) fixed, 16 means
//! the configuration was rejected, 32 means a file could not be processed.

use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command};
use walkdir::WalkDir;

use phix_config::{ConfigError, LinterMode, Loader, PhixConfig};
use phix_engine::{
    builtin_fixers, reporter_for, resolve_fixers, Cache, Linter, ProcessLinter, Runner,
    RunnerOptions, RuleSet, RuleSetting, TokenizerLinter, WhitespaceConfig,
};

const STATUS_INVALID_FILES: i32 = 4;
const STATUS_CHANGED_FILES: i32 = 8;
const STATUS_CONFIG_ERROR: i32 = 16;
const STATUS_EXCEPTION: i32 = 32;

fn main() {
    let matches = Command::new("phix")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A lexical code style fixer for PHP")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("fix")
                .about("Fix code style in the given files or directories")
                .arg(
                    Arg::new("paths")
                        .help("Files or directories to fix; directories are searched for *.php")
                        .num_args(1..)
                        .required(true),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Report what would change without writing anything")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("diff")
                        .long("diff")
                        .help("Show a diff for every fixed file")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file (default: .phix.toml in the working directory, if present)"),
                )
                .arg(
                    Arg::new("rules")
                        .long("rules")
                        .help("Comma-separated rule names to run instead of the configured set"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .help("Report format: text or json")
                        .default_value("text"),
                )
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .help("Worker threads (0 sizes the pool from the machine)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("allow-risky")
                        .long("allow-risky")
                        .help("Permit rules that can change runtime behavior")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("cache-file")
                        .long("cache-file")
                        .help("Where to read and write the fix cache"),
                )
                .arg(
                    Arg::new("no-cache")
                        .long("no-cache")
                        .help("Process every file, ignoring and not writing the cache")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("list-fixers").about("List every rule this build ships"))
        .get_matches();

    match matches.subcommand() {
        Some(("fix", sub)) => handle_fix_command(sub),
        Some(("list-fixers", _)) => handle_list_fixers_command(),
        _ => unreachable!("a subcommand is required"),
    }
}

/// Handle the fix command
fn handle_fix_command(matches: &ArgMatches) {
    let config = load_config(matches).unwrap_or_else(|err| {
        eprintln!("Configuration error: {err}");
        exit(STATUS_CONFIG_ERROR);
    });

    let whitespace =
        WhitespaceConfig::new(&config.whitespace.indent, &config.whitespace.line_ending)
            .unwrap_or_else(|err| {
                eprintln!("Configuration error: {err}");
                exit(STATUS_CONFIG_ERROR);
            });

    let rules = match matches.get_one::<String>("rules") {
        Some(selection) => restrict_rules(&config.rules, selection),
        None => config.rules.clone(),
    };

    let resolved = resolve_fixers(&rules, config.runner.allow_risky, &whitespace)
        .unwrap_or_else(|err| {
            eprintln!("Configuration error: {err}");
            exit(STATUS_CONFIG_ERROR);
        });

    let reporter = reporter_for(
        matches
            .get_one::<String>("format")
            .expect("format has a default")
            .as_str(),
    )
    .unwrap_or_else(|| {
        eprintln!("Configuration error: unknown report format (expected text or json)");
        exit(STATUS_CONFIG_ERROR);
    });

    let paths = expand_paths(
        matches
            .get_many::<String>("paths")
            .expect("paths are required"),
    );

    let linter: Box<dyn Linter> = match config.linter.mode {
        LinterMode::Tokenizer => Box::new(TokenizerLinter::new()),
        LinterMode::Process => Box::new(
            ProcessLinter::new(config.linter.binary.clone())
                .with_timeout(Duration::from_millis(config.linter.timeout_ms)),
        ),
    };

    let mut runner = Runner::new(resolved.fixers, linter)
        .unwrap_or_else(|err| {
            eprintln!("Internal error: {err}");
            exit(STATUS_EXCEPTION);
        })
        .with_options(RunnerOptions {
            dry_run: matches.get_flag("dry-run"),
            emit_diff: matches.get_flag("diff"),
            max_passes: config.runner.max_passes,
            workers: config.runner.workers,
        });
    if config.cache.enabled {
        let cache_path = PathBuf::from(&config.cache.path);
        runner = runner.with_cache(Cache::load(&cache_path, &resolved.signature), cache_path);
    }

    let summary = runner.run(&paths);
    if let Err(err) = runner.persist_cache() {
        eprintln!("Warning: could not write the cache: {err}");
    }

    print!("{}", reporter.generate(&summary));

    let mut status = 0;
    if summary.invalid_count() > 0 {
        status |= STATUS_INVALID_FILES;
    }
    if summary.fixed_count() > 0 {
        status |= STATUS_CHANGED_FILES;
    }
    if summary.exception_count() > 0 {
        status |= STATUS_EXCEPTION;
    }
    exit(status);
}

/// Handle the list-fixers command
fn handle_list_fixers_command() {
    println!("Available rules:\n");
    for fixer in builtin_fixers() {
        let risky = if fixer.is_risky() { " (risky)" } else { "" };
        println!("  {}{} - {}", fixer.name(), risky, fixer.description());
    }
}

/// Defaults, then the project file, then single-flag overrides.
fn load_config(matches: &ArgMatches) -> Result<PhixConfig, ConfigError> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(".phix.toml"),
    };
    if let Some(workers) = matches.get_one::<usize>("workers") {
        loader = loader.set_override("runner.workers", *workers as i64)?;
    }
    if matches.get_flag("allow-risky") {
        loader = loader.set_override("runner.allow_risky", true)?;
    }
    if let Some(path) = matches.get_one::<String>("cache-file") {
        loader = loader.set_override("cache.path", path.as_str())?;
    }
    if matches.get_flag("no-cache") {
        loader = loader.set_override("cache.enabled", false)?;
    }
    loader.build()
}

/// Keep only the named rules, force-enabling each one. A rule configured
/// with an option table keeps its options; everything else runs with its
/// defaults. Unknown names are left in so resolution can reject them.
fn restrict_rules(configured: &RuleSet, selection: &str) -> RuleSet {
    let mut rules = RuleSet::new();
    for name in selection.split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let setting = match configured.get(name) {
            Some(RuleSetting::Options(options)) => RuleSetting::Options(options.clone()),
            _ => RuleSetting::Enabled(true),
        };
        rules.insert(name.to_string(), setting);
    }
    rules
}

/// Files are taken as given; directories are walked for `*.php`, sorted so
/// runs are reproducible.
fn expand_paths<'a>(inputs: impl Iterator<Item = &'a String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(&path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| path.extension().map_or(false, |ext| ext == "php"))
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(path);
        }
    }
    paths
}
