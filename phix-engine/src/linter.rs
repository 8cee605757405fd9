//! Syntax validation ahead of fixing.
//!
//! Fixers assume working PHP; running them over a broken file would "fix"
//! garbage and destroy the evidence. Every file therefore passes a linter
//! first. Two collaborators implement the same contract: an in-process
//! check built on the tokenizer, and `php -l` run as a subprocess for
//! byte-for-byte engine fidelity.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

use phix_lexer::kind::KindRegistry;
use phix_lexer::lexing::tokenize_raw;
use phix_lexer::{TokenKind, TokenStream};

/// One problem a linter found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    pub message: String,
    pub line: Option<u32>,
}

impl fmt::Display for LintDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// The linter's verdict on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintStatus {
    Valid,
    Invalid(Vec<LintDiagnostic>),
}

/// The check itself failed; this says nothing about the file's syntax.
#[derive(Debug)]
pub enum LintError {
    Io(io::Error),
    Timeout { limit: Duration },
}

impl fmt::Display for LintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintError::Io(err) => write!(f, "linter failed: {err}"),
            LintError::Timeout { limit } => {
                write!(f, "linter timed out after {}ms", limit.as_millis())
            }
        }
    }
}

impl std::error::Error for LintError {}

impl From<io::Error> for LintError {
    fn from(err: io::Error) -> Self {
        LintError::Io(err)
    }
}

/// Validates PHP sources before any fixer touches them.
pub trait Linter: Send + Sync {
    fn lint_path(&self, path: &Path) -> Result<LintStatus, LintError>;
    fn lint_source(&self, source: &str) -> Result<LintStatus, LintError>;
}

// ----- in-process -----------------------------------------------------

/// Lexes the file and checks delimiter balance, no PHP binary required.
///
/// This accepts a superset of real PHP (it has no grammar), which is the
/// right direction for a gate: valid files always pass, and what slips
/// through still tokenizes, so the fixers can work with it.
pub struct TokenizerLinter {
    registry: KindRegistry,
}

impl TokenizerLinter {
    pub fn new() -> Self {
        Self {
            registry: KindRegistry::new(),
        }
    }
}

impl Default for TokenizerLinter {
    fn default() -> Self {
        Self::new()
    }
}

fn closer_for(kind: TokenKind) -> Option<TokenKind> {
    match kind {
        TokenKind::ParenOpen => Some(TokenKind::ParenClose),
        TokenKind::BraceOpen => Some(TokenKind::BraceClose),
        TokenKind::SquareOpen => Some(TokenKind::SquareClose),
        TokenKind::AttributeOpen => Some(TokenKind::SquareClose),
        TokenKind::DollarOpenCurly | TokenKind::CurlyOpen => Some(TokenKind::BraceClose),
        _ => None,
    }
}

fn check_balance(stream: &TokenStream) -> LintStatus {
    let mut open: Vec<(TokenKind, u32)> = Vec::new();
    for token in stream.iter() {
        let kind = token.kind();
        if let Some(expected) = closer_for(kind) {
            open.push((expected, token.line()));
            continue;
        }
        if matches!(
            kind,
            TokenKind::ParenClose | TokenKind::BraceClose | TokenKind::SquareClose
        ) {
            match open.pop() {
                Some((expected, _)) if expected == kind => {}
                _ => {
                    return LintStatus::Invalid(vec![LintDiagnostic {
                        message: format!("unexpected {:?}", token.content()),
                        line: Some(token.line()),
                    }])
                }
            }
        }
    }
    if let Some((expected, line)) = open.pop() {
        return LintStatus::Invalid(vec![LintDiagnostic {
            message: format!("block opened here is never closed (expected {expected:?})"),
            line: Some(line),
        }]);
    }
    LintStatus::Valid
}

impl Linter for TokenizerLinter {
    fn lint_path(&self, path: &Path) -> Result<LintStatus, LintError> {
        let source = fs::read_to_string(path)?;
        self.lint_source(&source)
    }

    fn lint_source(&self, source: &str) -> Result<LintStatus, LintError> {
        match tokenize_raw(source, &self.registry) {
            Ok(stream) => Ok(check_balance(&stream)),
            Err(err) => Ok(LintStatus::Invalid(vec![LintDiagnostic {
                message: err.to_string(),
                line: Some(err.line()),
            }])),
        }
    }
}

// ----- subprocess -----------------------------------------------------

static PARSE_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:PHP )?(?:Parse|Fatal) error:\s*(?P<message>.+?) in .+ on line (?P<line>\d+)")
        .unwrap()
});

/// Runs `php -l` (or whatever binary is configured) against the file.
///
/// The child is polled against a deadline; a hung interpreter is killed
/// and reported as [`LintError::Timeout`] rather than stalling the run.
pub struct ProcessLinter {
    binary: String,
    timeout: Duration,
}

impl ProcessLinter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_millis(10_000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus, LintError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(LintError::Timeout {
                            limit: self.timeout,
                        });
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                Err(err) => return Err(LintError::Io(err)),
            }
        }
    }
}

fn parse_diagnostics(output: &str, status: ExitStatus) -> Vec<LintDiagnostic> {
    let mut diagnostics: Vec<LintDiagnostic> = Vec::new();
    for caps in PARSE_ERROR.captures_iter(output) {
        let diagnostic = LintDiagnostic {
            message: caps["message"].trim().to_string(),
            line: caps["line"].parse().ok(),
        };
        // stdout and stderr often repeat the same error.
        if !diagnostics.contains(&diagnostic) {
            diagnostics.push(diagnostic);
        }
    }
    if diagnostics.is_empty() {
        let first_line = output
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim();
        let message = if first_line.is_empty() {
            format!("syntax check failed ({status})")
        } else {
            first_line.to_string()
        };
        diagnostics.push(LintDiagnostic {
            message,
            line: None,
        });
    }
    diagnostics
}

impl Linter for ProcessLinter {
    fn lint_path(&self, path: &Path) -> Result<LintStatus, LintError> {
        let mut child = Command::new(&self.binary)
            .arg("-l")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let status = self.wait_with_deadline(&mut child)?;

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            let _ = stdout.read_to_string(&mut output);
        }
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_string(&mut output);
        }

        if status.success() {
            Ok(LintStatus::Valid)
        } else {
            Ok(LintStatus::Invalid(parse_diagnostics(&output, status)))
        }
    }

    fn lint_source(&self, source: &str) -> Result<LintStatus, LintError> {
        let mut file = tempfile::Builder::new()
            .prefix("phix-lint-")
            .suffix(".php")
            .tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;
        self.lint_path(file.path())
    }
}
