//! Normalizes the casing of `true`, `false` and `null`.

use phix_lexer::{TokenKind, TokenStream};

use crate::fixer::{ConfigurableFixer, ConfigurationError, Fixer, FixerError, FixerOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Lower,
    Upper,
}

/// Rewrites the native constants to one casing, `lower` by default.
///
/// Identifiers that merely spell like a constant are left alone: class
/// names (`new True`), members (`Foo::TRUE`, `$x->null`), declarations and
/// imports all keep their casing.
pub struct ConstantCaseFixer {
    case: Case,
}

impl ConstantCaseFixer {
    pub fn new() -> Self {
        Self { case: Case::Lower }
    }
}

impl Default for ConstantCaseFixer {
    fn default() -> Self {
        Self::new()
    }
}

const NATIVE_CONSTANTS: [&str; 3] = ["true", "false", "null"];

fn is_constant_boundary(stream: &TokenStream, index: Option<usize>) -> bool {
    let index = match index {
        Some(index) => index,
        None => return true,
    };
    !matches!(
        stream[index].kind(),
        TokenKind::Backslash
            | TokenKind::Arrow
            | TokenKind::NullsafeArrow
            | TokenKind::DoubleColon
            | TokenKind::As
            | TokenKind::Class
            | TokenKind::Const
            | TokenKind::Extends
            | TokenKind::Function
            | TokenKind::Implements
            | TokenKind::InstanceOf
            | TokenKind::InsteadOf
            | TokenKind::Interface
            | TokenKind::New
            | TokenKind::Trait
            | TokenKind::Use
            | TokenKind::LambdaUse
    )
}

impl Fixer for ConstantCaseFixer {
    fn name(&self) -> &'static str {
        "constant_case"
    }

    fn description(&self) -> &'static str {
        "Writes the native constants true, false and null in the configured case."
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_candidate(&self, stream: &TokenStream) -> bool {
        stream.is_kind_found(TokenKind::Identifier)
    }

    fn apply(&self, stream: &mut TokenStream) -> Result<(), FixerError> {
        for index in 0..stream.len() {
            let token = &stream[index];
            if !token.is_kind(TokenKind::Identifier) {
                continue;
            }
            let lower = token.content().to_lowercase();
            if !NATIVE_CONSTANTS.contains(&lower.as_str()) {
                continue;
            }
            if !is_constant_boundary(stream, stream.prev_meaningful(index))
                || !is_constant_boundary(stream, stream.next_meaningful(index))
            {
                continue;
            }
            let fixed = match self.case {
                Case::Lower => lower,
                Case::Upper => token.content().to_uppercase(),
            };
            if stream[index].content() != fixed {
                stream.set_content_at(index, fixed);
            }
        }
        Ok(())
    }

    fn as_configurable(&mut self) -> Option<&mut dyn ConfigurableFixer> {
        Some(self)
    }
}

impl ConfigurableFixer for ConstantCaseFixer {
    fn configure(&mut self, options: &FixerOptions) -> Result<(), ConfigurationError> {
        for (key, value) in options {
            match key.as_str() {
                "case" => {
                    self.case = match value.as_str() {
                        Some("lower") => Case::Lower,
                        Some("upper") => Case::Upper,
                        _ => {
                            return Err(ConfigurationError::InvalidValue {
                                fixer: self.name(),
                                option: "case",
                                reason: format!("expected \"lower\" or \"upper\", got {value}"),
                            })
                        }
                    };
                }
                other => {
                    return Err(ConfigurationError::UnknownOption {
                        fixer: self.name(),
                        option: other.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}
