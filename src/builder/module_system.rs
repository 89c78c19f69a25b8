//! Scope module system for modular registration.
//!
//! This module provides the trait used to group related registrations
//! into reusable units.

use crate::error::DiResult;

use super::ScopeBuilder;

/// A group of registrations applied to a [`ScopeBuilder`] in one call.
///
/// # Example
///
/// ```rust
/// use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder, ScopeModule};
/// use std::sync::Arc;
///
/// struct DbUrl(String);
/// struct UserStore { url: Arc<DbUrl> }
///
/// impl Injectable for UserStore {
///     fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
///         Ok(UserStore { url: ctx.get::<DbUrl>()? })
///     }
/// }
///
/// struct StorageModule { url: String }
///
/// impl ScopeModule for StorageModule {
///     fn register(self, builder: &mut ScopeBuilder) -> DiResult<()> {
///         builder.with_instance(DbUrl(self.url)).as_self();
///         builder.with_type::<UserStore>().as_self().as_singleton();
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut builder = ScopeBuilder::new();
/// builder.add_module(StorageModule { url: "sqlite::memory:".into() })?;
/// let provider = builder.build()?;
/// assert_eq!(provider.get_required::<UserStore>().url.0, "sqlite::memory:");
/// # Ok(())
/// # }
/// ```
pub trait ScopeModule {
    /// Adds this module's registrations to `builder`.
    fn register(self, builder: &mut ScopeBuilder) -> DiResult<()>;
}

impl<F> ScopeModule for F
where
    F: FnOnce(&mut ScopeBuilder) -> DiResult<()>,
{
    fn register(self, builder: &mut ScopeBuilder) -> DiResult<()> {
        self(builder)
    }
}

impl ScopeBuilder {
    /// Applies a module in place.
    pub fn add_module<M: ScopeModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }
}
