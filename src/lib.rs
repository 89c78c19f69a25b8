//! # scoped-di
//!
//! Scoped dependency resolution for Rust: map abstract types (traits, open
//! generic shapes) to concrete implementations or pre-built instances, and
//! build object graphs on demand.
//!
//! ## Features
//!
//! - **Two lifetimes**: singletons materialized eagerly by `build()`, transients built per request
//! - **Trait bindings**: one concrete singleton can answer several traits with one shared instance
//! - **Open generics**: `Repository<_> -> SqlRepository<_>` serves every closed `Repository<T>`
//! - **Nested scopes**: children see parent services, parents never see children
//! - **Explicit factories**: constructors are wired at registration time, no reflection
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
//!         Ok(UserService { db: ctx.get::<Database>()? })
//!     }
//! }
//!
//! let mut builder = ScopeBuilder::new();
//! builder.with_instance(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! }).as_self();
//! builder.with_type::<UserService>().as_self();
//!
//! let provider = builder.build().unwrap();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Trait Resolution
//!
//! ```rust
//! use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder};
//! use std::sync::Arc;
//!
//! trait Reader: Send + Sync { fn read(&self) -> u32; }
//! trait Writer: Send + Sync { fn write(&self, v: u32) -> u32; }
//!
//! struct Store;
//! impl Reader for Store { fn read(&self) -> u32 { 1 } }
//! impl Writer for Store { fn write(&self, v: u32) -> u32 { v } }
//! impl Injectable for Store {
//!     fn construct(_: &mut Activation<'_>) -> DiResult<Self> { Ok(Store) }
//! }
//!
//! let mut builder = ScopeBuilder::new();
//! builder
//!     .with_type::<Store>()
//!     .as_trait::<dyn Reader>(|s| s as Arc<dyn Reader>)
//!     .as_trait::<dyn Writer>(|s| s as Arc<dyn Writer>)
//!     .as_singleton();
//!
//! let provider = builder.build().unwrap();
//! assert_eq!(provider.get_required_trait::<dyn Reader>().read(), 1);
//! assert_eq!(provider.get_required_trait::<dyn Writer>().write(5), 5);
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use scoped_di::{Resolver, ScopeBuilder};
//! use std::sync::Arc;
//!
//! struct Region(&'static str);
//! struct RequestId(u64);
//!
//! let mut root = ScopeBuilder::new();
//! root.with_instance(Region("eu")).as_self();
//! let root = root.build().unwrap();
//!
//! let mut child = root.create_child_scope();
//! child.with_instance(RequestId(7)).as_self();
//! let child = child.build().unwrap();
//!
//! assert_eq!(child.get_required::<Region>().0, "eu");
//! assert_eq!(child.get_required::<RequestId>().0, 7);
//! assert!(root.try_get::<RequestId>().unwrap().is_none());
//! ```

// Module declarations
pub mod activator;
pub mod builder;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod mapping;
pub mod options;
pub mod provider;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-exports
pub use activator::{arg, trait_arg, Activation, Activator, Factory, FactoryActivator, Injectable};
pub use builder::{Registering, ScopeBuilder, ScopeModule};
pub use descriptors::RegistrationDescriptor;
pub use error::{DiError, DiResult};
pub use key::{key_of_type, TypeKey};
pub use lifetime::Lifetime;
pub use mapping::Mapping;
pub use options::ActivationOptions;
pub use provider::{is_capability_marker, ServiceContainer};
pub use registration::Instance;
pub use traits::{ObjectFactory, Resolver, ServicesProvider, TypeMapper};
