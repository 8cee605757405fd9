//! The fixer contract and its capability traits.
//!
//! A fixer is one independent style transformation. The runner talks to
//! fixers through [`Fixer`] alone; optional capabilities (options,
//! whitespace settings) are separate traits reached through the capability
//! queries [`Fixer::as_configurable`] and [`Fixer::as_whitespace_aware`],
//! so a concrete fixer composes exactly the capabilities it has.
//!
//! Execution order is not the registration order: each fixer carries a
//! priority and may declare names it must run before. [`order`] resolves
//! those declarations into one total order at configuration time.

pub mod order;
pub mod resolve;

mod array_syntax;
mod constant_case;
mod declare_strict_types;
mod elseif;
mod encoding;
mod list_syntax;
mod lowercase_keywords;
mod no_closing_tag;
mod single_blank_line_at_eof;

pub use array_syntax::ArraySyntaxFixer;
pub use constant_case::ConstantCaseFixer;
pub use declare_strict_types::DeclareStrictTypesFixer;
pub use elseif::ElseifFixer;
pub use encoding::EncodingFixer;
pub use list_syntax::ListSyntaxFixer;
pub use lowercase_keywords::LowercaseKeywordsFixer;
pub use no_closing_tag::NoClosingTagFixer;
pub use single_blank_line_at_eof::SingleBlankLineAtEofFixer;

use std::collections::BTreeMap;
use std::fmt;

use phix_lexer::stream::BlockError;
use phix_lexer::TokenStream;

use crate::whitespace::{WhitespaceConfig, WhitespaceError};

/// One style transformation over a token stream.
///
/// Implementations must be idempotent: applying twice in a row yields the
/// same stream as applying once. `apply` may assume `is_candidate` returned
/// true but must stay a no-op when it did not; candidacy is an optimization,
/// never a precondition for correctness.
pub trait Fixer: Send + Sync {
    /// Stable snake_case rule name users configure.
    fn name(&self) -> &'static str;

    /// One-line summary shown by rule listings.
    fn description(&self) -> &'static str {
        ""
    }

    /// Higher priorities run earlier. Ties keep registration order.
    fn priority(&self) -> i32 {
        0
    }

    /// Names of fixers this one must precede, regardless of priority.
    /// Names that are not part of the active set are ignored.
    fn runs_before(&self) -> &'static [&'static str] {
        &[]
    }

    /// True when applying can change runtime behavior, not just style.
    /// Risky fixers only run when explicitly allowed.
    fn is_risky(&self) -> bool {
        false
    }

    /// Cheap pre-check, typically a kind-presence lookup. No side effects.
    fn is_candidate(&self, stream: &TokenStream) -> bool;

    /// Rewrites the stream in place.
    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError>;

    /// Capability query: the fixer accepts options.
    fn as_configurable(&mut self) -> Option<&mut dyn ConfigurableFixer> {
        None
    }

    /// Capability query: the fixer wants indent / line-ending settings.
    fn as_whitespace_aware(&mut self) -> Option<&mut dyn WhitespaceAwareFixer> {
        None
    }
}

impl fmt::Debug for dyn Fixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixer").field("name", &self.name()).finish()
    }
}

/// Options handed to a fixer before any file is processed.
pub type FixerOptions = BTreeMap<String, serde_json::Value>;

/// A fixer that accepts an options record. Invalid options fail the whole
/// run before any file is touched.
pub trait ConfigurableFixer {
    fn configure(&mut self, options: &FixerOptions) -> Result<(), ConfigurationError>;
}

/// A fixer that inserts whitespace and needs the project conventions to do
/// it.
pub trait WhitespaceAwareFixer {
    fn set_whitespace_config(&mut self, config: WhitespaceConfig);
}

/// Failure inside a fixer application. The runner records it and moves on
/// to the next file; the stream it came from is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixerError {
    Block(BlockError),
}

impl fmt::Display for FixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixerError::Block(err) => write!(f, "block matching failed: {err}"),
        }
    }
}

impl std::error::Error for FixerError {}

impl From<BlockError> for FixerError {
    fn from(err: BlockError) -> Self {
        FixerError::Block(err)
    }
}

/// Configuration-level failures. These are global and fatal: nothing runs
/// until the configuration is sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownRule {
        name: String,
    },
    NotConfigurable {
        fixer: &'static str,
    },
    UnknownOption {
        fixer: &'static str,
        option: String,
    },
    InvalidValue {
        fixer: &'static str,
        option: &'static str,
        reason: String,
    },
    RiskyNotAllowed {
        fixer: &'static str,
    },
    DependencyCycle {
        names: Vec<String>,
    },
    Whitespace(WhitespaceError),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownRule { name } => {
                write!(f, "unknown rule {name:?}")
            }
            ConfigurationError::NotConfigurable { fixer } => {
                write!(f, "rule {fixer:?} does not take options")
            }
            ConfigurationError::UnknownOption { fixer, option } => {
                write!(f, "rule {fixer:?} has no option {option:?}")
            }
            ConfigurationError::InvalidValue {
                fixer,
                option,
                reason,
            } => {
                write!(f, "invalid value for {fixer:?} option {option:?}: {reason}")
            }
            ConfigurationError::RiskyNotAllowed { fixer } => {
                write!(
                    f,
                    "rule {fixer:?} is risky and requires allow-risky to be enabled"
                )
            }
            ConfigurationError::DependencyCycle { names } => {
                write!(f, "run-order dependencies form a cycle: {}", names.join(", "))
            }
            ConfigurationError::Whitespace(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

impl From<WhitespaceError> for ConfigurationError {
    fn from(err: WhitespaceError) -> Self {
        ConfigurationError::Whitespace(err)
    }
}
