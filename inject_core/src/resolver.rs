//! [`Resolver`] trait and its typed extension.

use std::sync::Arc;

use crate::erased::Erased;
use crate::error::{Error, Result};
use crate::key::TypeKey;

/// A base trait for containers that values can be retrieved from by type.
pub trait Resolver {
    /// Returns the value that is mapped to `key`, or `None` if there is none.
    ///
    /// Implementations are free to look further than an exact match, e.g. into values declared
    /// to implement an interface or into parent resolvers.
    fn get_by_key(&self, key: TypeKey) -> Option<Erased>;
}

impl<R> Resolver for &R
where
    R: ?Sized + Resolver,
{
    #[inline]
    fn get_by_key(&self, key: TypeKey) -> Option<Erased> {
        (**self).get_by_key(key)
    }
}

impl<R> Resolver for Arc<R>
where
    R: ?Sized + Resolver,
{
    #[inline]
    fn get_by_key(&self, key: TypeKey) -> Option<Erased> {
        (**self).get_by_key(key)
    }
}

impl<R> Resolver for Box<R>
where
    R: ?Sized + Resolver,
{
    #[inline]
    fn get_by_key(&self, key: TypeKey) -> Option<Erased> {
        (**self).get_by_key(key)
    }
}

/// Typed accessors available on every [`Resolver`].
pub trait ResolverExt: Resolver {
    /// Returns a clone of the value of type `T`, or `None` if it can not be resolved.
    fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_by_key(TypeKey::of::<T>())
            .and_then(|erased| erased.downcast::<T>().ok())
    }

    /// Returns the value implementing interface `I`, or `None` if it can not be resolved.
    fn get_interface<I>(&self) -> Option<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.get::<Arc<I>>()
    }

    /// Returns a clone of the value of type `T`.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::DependencyNotFound`] if no value of type `T` can be
    /// resolved.
    fn resolve<T>(&self) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get().ok_or_else(Error::not_found::<T>)
    }

    /// Returns `true` if a value of type `T` can be resolved.
    fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.get_by_key(TypeKey::of::<T>()).is_some()
    }
}

impl<R> ResolverExt for R where R: ?Sized + Resolver {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Fixed(HashMap<TypeKey, Erased>);

    impl Resolver for Fixed {
        fn get_by_key(&self, key: TypeKey) -> Option<Erased> {
            self.0.get(&key).cloned()
        }
    }

    fn fixed() -> Fixed {
        let mut map = HashMap::new();
        map.insert(TypeKey::of::<u32>(), Erased::new(5_u32));
        map.insert(TypeKey::of::<String>(), Erased::new("five".to_string()));
        Fixed(map)
    }

    #[test]
    fn test_typed_get() {
        let resolver = fixed();
        assert_eq!(resolver.get::<u32>(), Some(5));
        assert_eq!(resolver.get::<String>().as_deref(), Some("five"));
        assert_eq!(resolver.get::<u64>(), None);
        assert!(resolver.contains::<u32>());
        assert!(!resolver.contains::<u64>());
    }

    #[test]
    fn test_resolve_not_found() {
        let resolver = fixed();
        let err = resolver.resolve::<i8>().unwrap_err();
        assert!(err.is_not_found_for::<i8>());
    }

    #[test]
    fn test_forwarding_impls() {
        let resolver = Arc::new(fixed());
        assert_eq!(resolver.resolve::<u32>(), Ok(5));

        let boxed: Box<dyn Resolver> = Box::new(fixed());
        assert_eq!(boxed.get::<u32>(), Some(5));

        let by_ref: &dyn Resolver = &*boxed;
        assert_eq!(by_ref.get::<String>().as_deref(), Some("five"));
    }
}
