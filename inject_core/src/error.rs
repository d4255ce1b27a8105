//! Error types.

use std::error::Error as StdError;

use crate::key::TypeKey;

/// [`Error`] is an error that can be raised by functions and methods from this library.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No value of the requested type is mapped in the resolver or any of its parents, and no
    /// mapped value is declared to implement it.
    DependencyNotFound(TypeKey),
    /// A value was stored under a key of a different type.
    InvalidArgument {
        expected: TypeKey,
        found: &'static str,
    },
    /// The target of a field injection is absent.
    InvalidTarget(&'static str),
}

impl Error {
    pub fn not_found<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self::DependencyNotFound(TypeKey::of::<T>())
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DependencyNotFound(_))
    }

    pub fn is_not_found_for<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        matches!(self, Self::DependencyNotFound(key) if key.is::<T>())
    }

    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub const fn is_invalid_target(&self) -> bool {
        matches!(self, Self::InvalidTarget(_))
    }

    /// Returns the key of the type this error is about, if any.
    pub const fn type_key(&self) -> Option<TypeKey> {
        match self {
            Self::DependencyNotFound(key) | Self::InvalidArgument { expected: key, .. } => {
                Some(*key)
            }
            Self::InvalidTarget(_) => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DependencyNotFound(key) => {
                write!(f, "value not found for type `{key}`")
            }
            Self::InvalidArgument { expected, found } => {
                write!(f, "expected a value of type `{expected}`, got `{found}`")
            }
            Self::InvalidTarget(type_name) => {
                write!(f, "cannot inject into an absent `{type_name}`")
            }
        }
    }
}

impl StdError for Error {}

/// [`Result`] is an alias to [`core::result::Result`] with [`Error`] as the
/// default error type.
pub type Result<T, E = Error> = core::result::Result<T, E>;
