//! Context transformation pipeline.
//!
//! Raw lexing is local: it cannot know whether `[` opens an array literal
//! or indexes a variable, or whether `use` imports a class or captures
//! closure variables. Transformers walk the freshly lexed stream and retag
//! such tokens into the synthetic kinds from [`crate::kind::TokenKind`],
//! leaving content untouched.
//!
//! Transformers are chained in a fixed order and must be idempotent:
//! running the pipeline twice over a stream yields the same kinds. Each
//! transformer declares the synthetic kinds it assigns and the pipeline
//! registers them with the [`KindRegistry`] at construction, so two
//! transformers claiming the same kind fail fast.

mod array_typehint;
mod curly_brace;
mod lambda_use;
mod square_brace;

pub use array_typehint::ArrayTypehintTransformer;
pub use curly_brace::CurlyBraceTransformer;
pub use lambda_use::LambdaUseTransformer;
pub use square_brace::SquareBraceTransformer;

use std::fmt;

use crate::kind::{KindRegistry, RegistryError, TokenKind};
use crate::stream::TokenStream;

/// A single retagging pass over a token stream.
pub trait TokenTransformer: Send + Sync {
    /// Stable name, used for synthetic-kind ownership and diagnostics.
    fn name(&self) -> &'static str;

    /// The synthetic kinds this transformer assigns.
    fn custom_kinds(&self) -> &'static [TokenKind];

    /// Retags tokens in place. Must be idempotent and must not change
    /// content.
    fn transform(&self, stream: &mut TokenStream);
}

/// An ordered chain of transformers.
pub struct TransformerPipeline {
    transformers: Vec<Box<dyn TokenTransformer>>,
}

impl TransformerPipeline {
    pub fn new() -> Self {
        Self {
            transformers: Vec::new(),
        }
    }

    /// The standard chain applied by [`crate::lexing::SourceTokenizer`].
    pub fn standard(registry: &mut KindRegistry) -> Result<Self, RegistryError> {
        let mut pipeline = Self::new();
        pipeline.add(registry, ArrayTypehintTransformer)?;
        pipeline.add(registry, CurlyBraceTransformer)?;
        pipeline.add(registry, SquareBraceTransformer)?;
        pipeline.add(registry, LambdaUseTransformer)?;
        Ok(pipeline)
    }

    /// Appends a transformer, claiming its synthetic kinds first.
    ///
    /// Transformers are executed in the order they are added.
    pub fn add<T: TokenTransformer + 'static>(
        &mut self,
        registry: &mut KindRegistry,
        transformer: T,
    ) -> Result<(), RegistryError> {
        registry.register_custom(transformer.name(), transformer.custom_kinds())?;
        self.transformers.push(Box::new(transformer));
        Ok(())
    }

    pub fn transformer_count(&self) -> usize {
        self.transformers.len()
    }

    /// Runs every transformer over the stream, in order.
    pub fn apply(&self, stream: &mut TokenStream) {
        for transformer in &self.transformers {
            transformer.transform(stream);
        }
    }
}

impl Default for TransformerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformerPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.transformers.iter().map(|t| t.name()).collect();
        f.debug_struct("TransformerPipeline")
            .field("transformers", &names)
            .finish()
    }
}
