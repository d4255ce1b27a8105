//! Runtime type identifiers.

use std::any::{TypeId, type_name};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// [`TypeKey`] identifies the type a value is registered under.
///
/// Two keys are equal iff they were created from the same type. The type name is carried along
/// for diagnostics only and does not take part in comparisons.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of type `T`.
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the key that values of interface `I` are stored and requested under.
    ///
    /// Interfaces are trait object types such as `dyn Logger`. Since a trait object can not be
    /// stored by value, it is always handled behind an [`Arc`], so this is the same key as
    /// `TypeKey::of::<Arc<I>>()`.
    #[inline]
    #[must_use]
    pub fn interface<I>() -> Self
    where
        I: ?Sized + 'static,
    {
        Self::of::<Arc<I>>()
    }

    /// Returns the [`TypeId`] of the type.
    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the name of the type.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this key was created from type `T`.
    #[inline]
    pub fn is<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}
