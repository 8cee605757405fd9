//! File processing pipeline.
//!
//! The runner takes a resolved fixer set and a list of files and drives
//! each file through lint, tokenize, fix, write. Files are independent, so
//! they are processed on a rayon pool and the per-file outcomes merged
//! afterwards; the cache is only touched from the coordinating thread.
//!
//! Fixing is a bounded fixed-point iteration. One fixer's output can
//! create work for another (removing a closing tag exposes the end of the
//! file, converting `list()` produces square brackets), so the runner
//! re-tokenizes and reruns the whole set until a pass changes nothing or
//! the pass limit is hit.

use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use phix_lexer::kind::RegistryError;
use phix_lexer::lexing::SourceTokenizer;

use crate::cache::{content_hash, Cache};
use crate::fixer::Fixer;
use crate::linter::{LintDiagnostic, LintStatus, Linter};
use crate::report;

/// Knobs that change how a run behaves, not what it fixes.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Report what would change without writing anything.
    pub dry_run: bool,
    /// Attach a unified diff to every fixed file's report.
    pub emit_diff: bool,
    /// Upper bound on fix passes per file.
    pub max_passes: u32,
    /// Worker threads; 0 lets the pool pick.
    pub workers: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            emit_diff: false,
            max_passes: 8,
            workers: 0,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Not processed: the run was stopped or the cache says it is clean.
    Skipped,
    /// Processed, nothing to fix.
    NoChanges,
    /// At least one fixer changed the file. `non_converged` is set when
    /// the pass limit cut the iteration short.
    Fixed { non_converged: bool },
    /// The linter rejected the file; no fixer touched it.
    Invalid { diagnostics: Vec<LintDiagnostic> },
    /// Processing itself failed. `fixer` names the culprit when one
    /// fixer's apply was at fault.
    Exception {
        fixer: Option<&'static str>,
        message: String,
    },
}

/// Per-file record collected during a run.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: ApplyOutcome,
    pub applied_fixers: Vec<&'static str>,
    pub diff: Option<String>,
    pub duration: Duration,
}

/// Everything a reporter needs to describe a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
    pub duration: Duration,
    pub memory_bytes: u64,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn file_count(&self) -> usize {
        self.reports.len()
    }

    pub fn fixed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, ApplyOutcome::Fixed { .. }))
            .count()
    }

    pub fn invalid_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, ApplyOutcome::Invalid { .. }))
            .count()
    }

    pub fn exception_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, ApplyOutcome::Exception { .. }))
            .count()
    }
}

struct CacheUpdate {
    key: String,
    hash: String,
}

struct FileResult {
    report: FileReport,
    cache_update: Option<CacheUpdate>,
}

impl FileResult {
    fn plain(path: &Path, outcome: ApplyOutcome, duration: Duration) -> Self {
        Self {
            report: FileReport {
                path: path.to_path_buf(),
                outcome,
                applied_fixers: Vec::new(),
                diff: None,
                duration,
            },
            cache_update: None,
        }
    }
}

struct FixedSource {
    source: String,
    applied: Vec<&'static str>,
    non_converged: bool,
}

/// Applies a fixer set to files and collects the outcomes.
pub struct Runner {
    tokenizer: SourceTokenizer,
    fixers: Vec<Box<dyn Fixer>>,
    linter: Box<dyn Linter>,
    cache: Option<Cache>,
    cache_path: Option<PathBuf>,
    options: RunnerOptions,
    stop: Arc<AtomicBool>,
}

impl Runner {
    /// `fixers` must already be resolved and ordered; see
    /// [`crate::fixer::resolve_fixers`].
    pub fn new(fixers: Vec<Box<dyn Fixer>>, linter: Box<dyn Linter>) -> Result<Self, RegistryError> {
        Ok(Self {
            tokenizer: SourceTokenizer::new()?,
            fixers,
            linter,
            cache: None,
            cache_path: None,
            options: RunnerOptions::default(),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cache(mut self, cache: Cache, path: PathBuf) -> Self {
        self.cache = Some(cache);
        self.cache_path = Some(path);
        self
    }

    /// Shared flag that stops the run: files not yet started are skipped,
    /// files in flight finish normally.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Processes every path and returns the collected reports, in input
    /// order regardless of worker count.
    pub fn run(&mut self, paths: &[PathBuf]) -> RunSummary {
        let started = Instant::now();
        let results: Vec<FileResult> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
        {
            Ok(pool) => pool.install(|| {
                paths
                    .par_iter()
                    .map(|path| self.process_file(path))
                    .collect()
            }),
            Err(_) => paths.iter().map(|path| self.process_file(path)).collect(),
        };

        let mut reports = Vec::with_capacity(results.len());
        for result in results {
            if let (Some(update), Some(cache)) = (result.cache_update, self.cache.as_mut()) {
                cache.record(update.key, update.hash);
            }
            reports.push(result.report);
        }

        RunSummary {
            reports,
            duration: started.elapsed(),
            memory_bytes: peak_rss_bytes(),
            dry_run: self.options.dry_run,
        }
    }

    /// Writes the cache back to disk. Separate from [`Runner::run`] so a
    /// caller can decide what a failed save should mean.
    pub fn persist_cache(&self) -> io::Result<()> {
        match (&self.cache, &self.cache_path) {
            (Some(cache), Some(path)) => cache.save(path),
            _ => Ok(()),
        }
    }

    fn process_file(&self, path: &Path) -> FileResult {
        let started = Instant::now();
        if self.stop.load(Ordering::Relaxed) {
            return FileResult::plain(path, ApplyOutcome::Skipped, started.elapsed());
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                return FileResult::plain(
                    path,
                    exception(None, format!("failed to read file: {err}")),
                    started.elapsed(),
                )
            }
        };
        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(_) => {
                return FileResult::plain(
                    path,
                    exception(None, "file is not valid UTF-8".to_string()),
                    started.elapsed(),
                )
            }
        };

        let key = cache_key(path);
        if let Some(cache) = &self.cache {
            if cache.is_clean(&key, source.as_bytes()) {
                return FileResult::plain(path, ApplyOutcome::Skipped, started.elapsed());
            }
        }

        match self.linter.lint_source(&source) {
            Ok(LintStatus::Valid) => {}
            Ok(LintStatus::Invalid(diagnostics)) => {
                return FileResult::plain(
                    path,
                    ApplyOutcome::Invalid { diagnostics },
                    started.elapsed(),
                )
            }
            Err(err) => {
                return FileResult::plain(path, exception(None, err.to_string()), started.elapsed())
            }
        }

        let fixed = match self.fix_source(&source) {
            Ok(fixed) => fixed,
            Err(outcome) => return FileResult::plain(path, outcome, started.elapsed()),
        };

        if fixed.source == source {
            return FileResult {
                report: FileReport {
                    path: path.to_path_buf(),
                    outcome: ApplyOutcome::NoChanges,
                    applied_fixers: Vec::new(),
                    diff: None,
                    duration: started.elapsed(),
                },
                cache_update: self.cache.as_ref().map(|_| CacheUpdate {
                    key,
                    hash: content_hash(source.as_bytes()),
                }),
            };
        }

        let diff = self
            .options
            .emit_diff
            .then(|| report::unified_diff(&source, &fixed.source));
        if !self.options.dry_run {
            if let Err(err) = fs::write(path, fixed.source.as_bytes()) {
                return FileResult::plain(
                    path,
                    exception(None, format!("failed to write file: {err}")),
                    started.elapsed(),
                );
            }
        }

        // A dry run leaves the file unfixed and a cut-short iteration has
        // more work to do; neither may mark the file clean.
        let cache_update = if self.options.dry_run || fixed.non_converged {
            None
        } else {
            self.cache.as_ref().map(|_| CacheUpdate {
                key,
                hash: content_hash(fixed.source.as_bytes()),
            })
        };

        FileResult {
            report: FileReport {
                path: path.to_path_buf(),
                outcome: ApplyOutcome::Fixed {
                    non_converged: fixed.non_converged,
                },
                applied_fixers: fixed.applied,
                diff,
                duration: started.elapsed(),
            },
            cache_update,
        }
    }

    fn fix_source(&self, source: &str) -> Result<FixedSource, ApplyOutcome> {
        let mut current = source.to_string();
        let mut applied: Vec<&'static str> = Vec::new();
        let mut non_converged = false;
        let mut pass = 0;

        loop {
            let mut stream = match self.tokenizer.tokenize(&current) {
                Ok(stream) => stream,
                Err(err) => {
                    return Err(exception(None, format!("tokenization failed: {err}")));
                }
            };

            let mut pass_changed = false;
            for fixer in &self.fixers {
                if !fixer.is_candidate(&stream) {
                    continue;
                }
                match panic::catch_unwind(AssertUnwindSafe(|| fixer.apply(&mut stream))) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        return Err(exception(Some(fixer.name()), err.to_string()));
                    }
                    Err(payload) => {
                        return Err(exception(Some(fixer.name()), panic_message(payload)));
                    }
                }
                if stream.is_changed() {
                    pass_changed = true;
                    if !applied.contains(&fixer.name()) {
                        applied.push(fixer.name());
                    }
                    stream.clear_changed();
                }
            }

            if !pass_changed {
                break;
            }
            stream.compact();
            current = stream.generate_code();
            pass += 1;
            if pass >= self.options.max_passes {
                // The last pass still changed things; without another
                // pass we cannot tell whether it settled.
                non_converged = true;
                break;
            }
        }

        Ok(FixedSource {
            source: current,
            applied,
            non_converged,
        })
    }
}

fn exception(fixer: Option<&'static str>, message: String) -> ApplyOutcome {
    ApplyOutcome::Exception { fixer, message }
}

fn cache_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "fixer panicked".to_string()
    }
}

/// Peak resident set size of this process, for the report footer.
#[cfg(target_os = "linux")]
fn peak_rss_bytes() -> u64 {
    let status = match fs::read_to_string("/proc/self/status") {
        Ok(status) => status,
        Err(_) => return 0,
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmHWM:") {
            let kib: u64 = rest
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse()
                .unwrap_or(0);
            return kib * 1024;
        }
    }
    0
}

#[cfg(not(target_os = "linux"))]
fn peak_rss_bytes() -> u64 {
    0
}
