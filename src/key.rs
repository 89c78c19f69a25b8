//! Runtime type descriptors used as registration and lookup keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{DiError, DiResult};

/// Key for mapping, caching and lookup.
///
/// A `TypeKey` describes either a plain Rust type, an open generic shape, or
/// a generic shape closed over concrete type arguments. Open shapes are what
/// allow a single registration such as `Repository<_> -> SqlRepository<_>`
/// to answer every closed request `Repository<Order>`, `Repository<User>`, ...
///
/// # Examples
///
/// ```rust
/// use scoped_di::TypeKey;
///
/// struct Order;
///
/// let plain = TypeKey::of::<String>();
/// assert!(!plain.is_generic());
///
/// let open = TypeKey::open("Repository", 1);
/// let closed = open.make_generic([TypeKey::of::<Order>()]).unwrap();
/// assert!(closed.is_generic());
/// assert_eq!(closed.generic_definition(), Some(open));
/// ```
#[derive(Debug, Clone)]
pub enum TypeKey {
    /// Plain Rust type with TypeId and name for diagnostics
    ///
    /// Covers structs, primitives and `dyn Trait` objects alike.
    Type(TypeId, &'static str),
    /// Unparameterized generic shape: name and arity
    Open(&'static str, usize),
    /// Generic shape applied to type arguments
    Closed(&'static str, Arc<[TypeKey]>),
}

impl TypeKey {
    /// Key for a Rust type, including unsized `dyn Trait` types.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key for an open generic shape with `arity` type parameters.
    pub fn open(shape: &'static str, arity: usize) -> Self {
        TypeKey::Open(shape, arity)
    }

    /// Key for `shape` closed over `args`.
    pub fn closed<I>(shape: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = TypeKey>,
    {
        TypeKey::Closed(shape, args.into_iter().collect())
    }

    /// True for closed generic instantiations.
    pub fn is_generic(&self) -> bool {
        matches!(self, TypeKey::Closed(..))
    }

    /// True for unparameterized generic shapes.
    pub fn is_open(&self) -> bool {
        matches!(self, TypeKey::Open(..))
    }

    /// Type arguments of a closed key; empty for everything else.
    pub fn type_args(&self) -> &[TypeKey] {
        match self {
            TypeKey::Closed(_, args) => args,
            _ => &[],
        }
    }

    /// Strips the type arguments of a closed key, yielding its open shape.
    ///
    /// ```rust
    /// use scoped_di::TypeKey;
    ///
    /// let closed = TypeKey::closed("Cache", [TypeKey::of::<u32>(), TypeKey::of::<String>()]);
    /// assert_eq!(closed.generic_definition(), Some(TypeKey::open("Cache", 2)));
    /// assert_eq!(TypeKey::of::<u32>().generic_definition(), None);
    /// ```
    pub fn generic_definition(&self) -> Option<TypeKey> {
        match self {
            TypeKey::Closed(shape, args) => Some(TypeKey::Open(shape, args.len())),
            _ => None,
        }
    }

    /// Applies type arguments to an open shape.
    ///
    /// Fails with [`DiError::GenericArity`] when the number of arguments does
    /// not match, or when `self` is not an open shape (arity 0 expected).
    pub fn make_generic<I>(&self, args: I) -> DiResult<TypeKey>
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let args: Arc<[TypeKey]> = args.into_iter().collect();
        match self {
            TypeKey::Open(shape, arity) if *arity == args.len() => {
                Ok(TypeKey::Closed(shape, args))
            }
            TypeKey::Open(_, arity) => Err(DiError::GenericArity {
                shape: self.clone(),
                expected: *arity,
                actual: args.len(),
            }),
            _ => Err(DiError::GenericArity {
                shape: self.clone(),
                expected: 0,
                actual: args.len(),
            }),
        }
    }

    /// Type or shape name for display.
    ///
    /// For plain types this is the `std::any::type_name` result.
    pub fn display_name(&self) -> &'static str {
        match self {
            TypeKey::Type(_, name) => name,
            TypeKey::Open(shape, _) => shape,
            TypeKey::Closed(shape, _) => shape,
        }
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId only, the name is diagnostic
            (TypeKey::Type(a, _), TypeKey::Type(b, _)) => a == b,
            (TypeKey::Open(a, n), TypeKey::Open(b, m)) => a == b && n == m,
            (TypeKey::Closed(a, xs), TypeKey::Closed(b, ys)) => a == b && xs == ys,
            _ => false,
        }
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            TypeKey::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            TypeKey::Open(shape, arity) => {
                1u8.hash(state);
                shape.hash(state);
                arity.hash(state);
            }
            TypeKey::Closed(shape, args) => {
                2u8.hash(state);
                shape.hash(state);
                args.hash(state);
            }
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Type(_, name) => f.write_str(name),
            TypeKey::Open(shape, arity) => {
                write!(f, "{}<", shape)?;
                for i in 0..*arity {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("_")?;
                }
                f.write_str(">")
            }
            TypeKey::Closed(shape, args) => {
                write!(f, "{}<", shape)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Helper for creating plain type keys.
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}
