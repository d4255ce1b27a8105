//! Opaque values with erased type informations.

use std::any::{Any, TypeId, type_name};

use crate::key::TypeKey;

/// [`CloneBoxed`] is a trait to clone a reference to an `?Sized` type into a [`Box`].
///
/// This trait is used to work around [`Sized`] bound on [`Clone`].
trait CloneBoxed: Any + Send + Sync {
    /// Returns the boxed clone of `self`.
    fn clone_boxed(&self) -> Box<dyn CloneBoxed + Send + Sync>;
}

impl<T> CloneBoxed for T
where
    T: Any + Clone + Send + Sync,
{
    fn clone_boxed(&self) -> Box<dyn CloneBoxed + Send + Sync> {
        Box::new(self.clone())
    }
}

/// [`Erased`] is a container for value of an arbitrary type, as long as it
/// implements [`Clone`], [`Send`], and [`Sync`] and is `'static`.
///
/// An `Erased` remembers the name of the type it was created from, so that
/// it can be reported in error messages.
pub struct Erased {
    value: Box<dyn CloneBoxed + Send + Sync>,
    type_name: &'static str,
}

impl Erased {
    /// Creates a new `Erased` with the provided `value` of type `T`.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[inline]
    pub fn value_type_id(&self) -> TypeId {
        let any: &(dyn Any + Send + Sync) = &*self.value;
        any.type_id()
    }

    /// Returns the name of the type of the contained value.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is of the type identified by `key`.
    #[inline]
    pub fn is_of(&self, key: TypeKey) -> bool {
        self.value_type_id() == key.id()
    }

    /// Tries to downcast `self` into type `T`.
    ///
    /// # Errors
    ///
    /// If the underlying value is not of type `T`, this method will return
    /// itself as error.
    pub fn downcast<T>(self) -> Result<T, Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        if (&*self.value as &dyn Any).is::<T>() {
            #[expect(clippy::missing_panics_doc, reason = "already checked")]
            let concrete = (self.value as Box<dyn Any + Send + Sync>)
                .downcast::<T>()
                .expect("the concrete type of this box should be `T` as it was checked before downcasting.");
            Ok(*concrete)
        } else {
            Err(self)
        }
    }
}

impl std::ops::Deref for Erased {
    type Target = dyn Any + Send + Sync;

    fn deref(&self) -> &Self::Target {
        &*self.value
    }
}

impl Clone for Erased {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone_boxed(),
            type_name: self.type_name,
        }
    }
}

impl std::fmt::Debug for Erased {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erased")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
