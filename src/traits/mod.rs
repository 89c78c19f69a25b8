//! Core capability traits of a resolver.

mod resolver;

pub use resolver::{ObjectFactory, Resolver, ServicesProvider, TypeMapper};
pub(crate) use resolver::{downcast_instance, downcast_trait, erase_trait};
