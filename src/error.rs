//! Error types for the scope builder and resolver.

use std::sync::Arc;

use thiserror::Error;

use crate::key::TypeKey;

/// Dependency resolution errors
///
/// Represents the failures that can occur while building a scope or while
/// resolving and activating services from a built [`ServiceContainer`].
///
/// All failures are immediate: a failed `build()` never yields a partially
/// usable container, and a failed resolution affects only that call.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{DiError, ScopeBuilder, Resolver, TypeKey};
///
/// let provider = ScopeBuilder::new().build().unwrap();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(key)) => {
///         assert_eq!(key, TypeKey::of::<String>());
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// [`ServiceContainer`]: crate::ServiceContainer
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No cached instance, no parent instance and no type mapping
    #[error("Service not found: {0}")]
    NotFound(TypeKey),

    /// Two type-based registrations claim the same abstract type
    #[error("Duplicate mapping for {key}: already mapped to {existing}, cannot also map to {duplicate}")]
    DuplicateMapping {
        key: TypeKey,
        existing: TypeKey,
        duplicate: TypeKey,
    },

    /// A declared singleton abstract type has no owning registration
    #[error("Singleton {0} could not be satisfied by any registration")]
    UnsatisfiedSingleton(TypeKey),

    /// The activator could not construct a concrete type
    #[error("Failed to activate {concrete}: {source}")]
    Activation {
        concrete: TypeKey,
        #[source]
        source: Arc<DiError>,
    },

    /// The activator has no factory for a concrete type
    #[error("No factory registered for {0}")]
    NoFactory(TypeKey),

    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(TypeKey),

    /// Wrong number of type arguments applied to an open generic shape
    #[error("Generic shape {shape} expects {expected} type arguments, got {actual}")]
    GenericArity {
        shape: TypeKey,
        expected: usize,
        actual: usize,
    },

    /// Circular activation detected (includes path)
    #[error("Circular dependency: {}", join_path(.0))]
    Circular(Vec<TypeKey>),

    /// Maximum activation depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

fn join_path(path: &[TypeKey]) -> String {
    path.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl DiError {
    /// Wraps a dependency failure as an activation failure of `concrete`.
    pub(crate) fn activation(concrete: &TypeKey, source: DiError) -> Self {
        DiError::Activation {
            concrete: concrete.clone(),
            source: Arc::new(source),
        }
    }

    /// Returns true if this is a top-level `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_))
    }

    /// Walks `Activation` wrappers down to the innermost error.
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let DiError::Activation { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use scoped_di::{DiResult, DiError, TypeKey};
///
/// fn failing_lookup() -> DiResult<()> {
///     Err(DiError::NotFound(TypeKey::of::<u8>()))
/// }
///
/// assert!(failing_lookup().unwrap_err().is_not_found());
/// ```
pub type DiResult<T> = Result<T, DiError>;
