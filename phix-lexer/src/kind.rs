//! Token kind vocabulary.
//!
//! Every token produced by the lexer carries a [`TokenKind`]. The set is a
//! superset of what raw lexing can emit: the tail of the enum holds
//! *synthetic* kinds that only [`crate::transform`] passes assign, so that
//! later consumers can tell `[` used as an array literal apart from `[` used
//! as an index without re-deriving context.
//!
//! [`KindRegistry`] owns the keyword table (PHP keywords are matched
//! case-insensitively) and tracks which transformer claimed which synthetic
//! kind, so two transformers cannot hand out the same kind by accident.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// Classification of a single token.
///
/// `Removed` is the tombstone kind: clearing a token in a stream rewrites it
/// to `Removed` with empty content instead of shifting the vector, so indices
/// held by callers stay valid until the stream is compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Outside PHP.
    InlineHtml,
    OpenTag,
    OpenTagEcho,
    CloseTag,

    // Trivia.
    Whitespace,
    LineComment,
    BlockComment,
    DocComment,

    // Literals and names.
    Number,
    ConstantString,
    DoubleQuote,
    EncapsedText,
    Heredoc,
    ExecString,
    Variable,
    Identifier,
    Cast,

    // Keywords.
    Abstract,
    Array,
    As,
    Break,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Enum,
    Eval,
    Exit,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    Function,
    Global,
    Goto,
    If,
    Implements,
    Include,
    IncludeOnce,
    InstanceOf,
    InsteadOf,
    Interface,
    Isset,
    List,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Match,
    Namespace,
    New,
    Print,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    RequireOnce,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,
    Yield,

    // Structural punctuation.
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    SquareOpen,
    SquareClose,
    AttributeOpen,
    Semicolon,
    Comma,
    Colon,
    QuestionMark,
    Equals,
    Arrow,
    NullsafeArrow,
    DoubleArrow,
    DoubleColon,
    Ampersand,
    Backslash,
    Dollar,
    /// Any operator we do not track individually (`+`, `===`, `??=`, ...).
    Operator,

    // Raw interpolation delimiters inside double-quoted strings.
    DollarOpenCurly,
    CurlyOpen,

    // Synthetic kinds, assigned by transformers only.
    ArrayTypehint,
    DollarCloseCurly,
    StringCurlyClose,
    ArraySquareOpen,
    ArraySquareClose,
    DestructuringSquareOpen,
    DestructuringSquareClose,
    LambdaUse,

    // Tombstone for cleared stream slots.
    Removed,
}

/// Keyword spellings and the kind each one lexes to.
///
/// `die` shares a kind with `exit` and `else if`'s contraction gets its own
/// entry; both mirror how PHP itself tokenizes.
const KEYWORD_TABLE: &[(&str, TokenKind)] = &[
    ("abstract", TokenKind::Abstract),
    ("and", TokenKind::LogicalAnd),
    ("array", TokenKind::Array),
    ("as", TokenKind::As),
    ("break", TokenKind::Break),
    ("callable", TokenKind::Callable),
    ("case", TokenKind::Case),
    ("catch", TokenKind::Catch),
    ("class", TokenKind::Class),
    ("clone", TokenKind::Clone),
    ("const", TokenKind::Const),
    ("continue", TokenKind::Continue),
    ("declare", TokenKind::Declare),
    ("default", TokenKind::Default),
    ("die", TokenKind::Exit),
    ("do", TokenKind::Do),
    ("echo", TokenKind::Echo),
    ("else", TokenKind::Else),
    ("elseif", TokenKind::ElseIf),
    ("empty", TokenKind::Empty),
    ("enddeclare", TokenKind::EndDeclare),
    ("endfor", TokenKind::EndFor),
    ("endforeach", TokenKind::EndForeach),
    ("endif", TokenKind::EndIf),
    ("endswitch", TokenKind::EndSwitch),
    ("endwhile", TokenKind::EndWhile),
    ("enum", TokenKind::Enum),
    ("eval", TokenKind::Eval),
    ("exit", TokenKind::Exit),
    ("extends", TokenKind::Extends),
    ("final", TokenKind::Final),
    ("finally", TokenKind::Finally),
    ("fn", TokenKind::Fn),
    ("for", TokenKind::For),
    ("foreach", TokenKind::Foreach),
    ("function", TokenKind::Function),
    ("global", TokenKind::Global),
    ("goto", TokenKind::Goto),
    ("if", TokenKind::If),
    ("implements", TokenKind::Implements),
    ("include", TokenKind::Include),
    ("include_once", TokenKind::IncludeOnce),
    ("instanceof", TokenKind::InstanceOf),
    ("insteadof", TokenKind::InsteadOf),
    ("interface", TokenKind::Interface),
    ("isset", TokenKind::Isset),
    ("list", TokenKind::List),
    ("match", TokenKind::Match),
    ("namespace", TokenKind::Namespace),
    ("new", TokenKind::New),
    ("or", TokenKind::LogicalOr),
    ("print", TokenKind::Print),
    ("private", TokenKind::Private),
    ("protected", TokenKind::Protected),
    ("public", TokenKind::Public),
    ("readonly", TokenKind::Readonly),
    ("require", TokenKind::Require),
    ("require_once", TokenKind::RequireOnce),
    ("return", TokenKind::Return),
    ("static", TokenKind::Static),
    ("switch", TokenKind::Switch),
    ("throw", TokenKind::Throw),
    ("trait", TokenKind::Trait),
    ("try", TokenKind::Try),
    ("unset", TokenKind::Unset),
    ("use", TokenKind::Use),
    ("var", TokenKind::Var),
    ("while", TokenKind::While),
    ("xor", TokenKind::LogicalXor),
    ("yield", TokenKind::Yield),
];

impl TokenKind {
    /// Whitespace between meaningful tokens.
    pub fn is_whitespace(self) -> bool {
        self == TokenKind::Whitespace
    }

    /// Any of the three comment shapes.
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment
        )
    }

    /// Tokens that navigation helpers skip over: whitespace, comments and
    /// tombstones. Everything else is meaningful.
    pub fn is_meaningful(self) -> bool {
        !self.is_whitespace() && !self.is_comment() && self != TokenKind::Removed
    }

    /// True for kinds produced by the keyword table.
    pub fn is_keyword(self) -> bool {
        KEYWORD_TABLE.iter().any(|&(_, kind)| kind == self)
    }

    /// True for kinds only a transformer may assign.
    pub fn is_synthetic(self) -> bool {
        matches!(
            self,
            TokenKind::ArrayTypehint
                | TokenKind::DollarCloseCurly
                | TokenKind::StringCurlyClose
                | TokenKind::ArraySquareOpen
                | TokenKind::ArraySquareClose
                | TokenKind::DestructuringSquareOpen
                | TokenKind::DestructuringSquareClose
                | TokenKind::LambdaUse
        )
    }
}

/// Keyword lookup plus synthetic-kind ownership.
///
/// One registry is built per tokenizer. Keyword lookup is case-insensitive,
/// matching PHP. Transformers must register the synthetic kinds they assign;
/// registering a kind twice, or registering a kind the raw lexer already
/// emits, is reported as an error so pipeline construction can fail fast.
#[derive(Debug)]
pub struct KindRegistry {
    keywords: &'static HashMap<&'static str, TokenKind>,
    custom: HashMap<TokenKind, &'static str>,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> =
    Lazy::new(|| KEYWORD_TABLE.iter().copied().collect());

impl KindRegistry {
    pub fn new() -> Self {
        KindRegistry {
            keywords: &KEYWORDS,
            custom: HashMap::new(),
        }
    }

    /// Resolves an identifier-shaped lexeme to its keyword kind, if any.
    pub fn keyword_kind(&self, lexeme: &str) -> Option<TokenKind> {
        if lexeme.bytes().all(|b| b.is_ascii_lowercase() || b == b'_') {
            return self.keywords.get(lexeme).copied();
        }
        self.keywords
            .get(lexeme.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Claims `kinds` for the named transformer.
    pub fn register_custom(
        &mut self,
        owner: &'static str,
        kinds: &[TokenKind],
    ) -> Result<(), RegistryError> {
        for &kind in kinds {
            if !kind.is_synthetic() {
                return Err(RegistryError::NotSynthetic { owner, kind });
            }
            if let Some(&existing) = self.custom.get(&kind) {
                if existing != owner {
                    return Err(RegistryError::Collision {
                        kind,
                        existing,
                        claimant: owner,
                    });
                }
            }
            self.custom.insert(kind, owner);
        }
        Ok(())
    }

    /// The transformer that registered `kind`, if any.
    pub fn custom_owner(&self, kind: TokenKind) -> Option<&'static str> {
        self.custom.get(&kind).copied()
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised while claiming synthetic kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two transformers tried to own the same synthetic kind.
    Collision {
        kind: TokenKind,
        existing: &'static str,
        claimant: &'static str,
    },
    /// A transformer tried to claim a kind the raw lexer already emits.
    NotSynthetic {
        owner: &'static str,
        kind: TokenKind,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Collision {
                kind,
                existing,
                claimant,
            } => write!(
                f,
                "synthetic kind {kind:?} already registered by '{existing}', rejected claim by '{claimant}'"
            ),
            RegistryError::NotSynthetic { owner, kind } => write!(
                f,
                "transformer '{owner}' cannot register lexer kind {kind:?} as custom"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}
