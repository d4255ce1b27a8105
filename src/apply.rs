//! Field injection into structs.

use std::any::type_name;

use inject_core::{Error, Resolver, ResolverExt, Result};

/// [`Injectable`] is a trait for types whose fields can be assigned with resolved values.
///
/// In most cases, you don't need to implement this trait manually, as [`injectable!`] generates
/// the implementation from a list of fields.
pub trait Injectable {
    /// Assigns the injectable fields of `self` with values resolved from `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyNotFound`] for the first field whose type can not be
    /// resolved. Fields assigned before that one keep their new value.
    fn inject_from<R>(&mut self, resolver: &R) -> Result<()>
    where
        R: ?Sized + Resolver;
}

impl<T> Injectable for &mut T
where
    T: ?Sized + Injectable,
{
    #[inline]
    fn inject_from<R>(&mut self, resolver: &R) -> Result<()>
    where
        R: ?Sized + Resolver,
    {
        (**self).inject_from(resolver)
    }
}

impl<T> Injectable for Box<T>
where
    T: ?Sized + Injectable,
{
    #[inline]
    fn inject_from<R>(&mut self, resolver: &R) -> Result<()>
    where
        R: ?Sized + Resolver,
    {
        (**self).inject_from(resolver)
    }
}

// `None` has no fields to assign.
impl<T> Injectable for Option<T>
where
    T: Injectable,
{
    fn inject_from<R>(&mut self, resolver: &R) -> Result<()>
    where
        R: ?Sized + Resolver,
    {
        match self {
            Some(target) => target.inject_from(resolver),
            None => Err(Error::InvalidTarget(type_name::<T>())),
        }
    }
}

/// Assigns `field` with the value of its type resolved from `resolver`.
///
/// Used by [`injectable!`]; `name` is only reported in logs.
#[doc(hidden)]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn inject_field<T, R>(field: &mut T, resolver: &R, name: &'static str) -> Result<()>
where
    T: Clone + Send + Sync + 'static,
    R: ?Sized + Resolver,
{
    match resolver.resolve::<T>() {
        Ok(value) => {
            *field = value;
            Ok(())
        }
        Err(err) => {
            debug!(field = name, error = %err, "failed to inject field");
            Err(err)
        }
    }
}

/// Implements [`Injectable`] for a struct by listing the fields to inject.
///
/// Each listed field is resolved by its declared type and assigned in the listed order. Fields
/// that are not listed are left untouched.
///
/// ```
/// use inject::{Registry, injectable};
///
/// #[derive(Clone, Debug, Default, PartialEq, Eq)]
/// struct Address(String);
///
/// #[derive(Clone, Debug, Default, PartialEq, Eq)]
/// struct Port(u16);
///
/// #[derive(Debug, Default)]
/// struct Server {
///     address: Address,
///     port: Port,
///     connections: usize,
/// }
///
/// injectable!(Server { address, port });
///
/// let registry = Registry::new();
/// registry.map(Address("0.0.0.0".to_string())).map(Port(8080));
///
/// let mut server = Server::default();
/// registry.apply(&mut server).unwrap();
/// assert_eq!(server.address, Address("0.0.0.0".to_string()));
/// assert_eq!(server.port, Port(8080));
/// assert_eq!(server.connections, 0);
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::apply::Injectable for $ty {
            fn inject_from<R>(&mut self, resolver: &R) -> $crate::Result<()>
            where
                R: ?Sized + $crate::Resolver,
            {
                let _ = resolver;
                $(
                    $crate::apply::inject_field(&mut self.$field, resolver, stringify!($field))?;
                )*
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::registry::Registry;

    trait Logger: Send + Sync {
        fn prefix(&self) -> &str;
    }

    #[derive(Clone)]
    struct Quiet;

    impl Logger for Quiet {
        fn prefix(&self) -> &str {
            "quiet"
        }
    }

    #[derive(Clone)]
    struct Loud;

    impl Logger for Loud {
        fn prefix(&self) -> &str {
            "LOUD"
        }
    }

    crate::implements!(Loud: dyn Logger);

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Address(&'static str);

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Port(u16);

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Timeout(u64);

    #[derive(Debug, Default)]
    struct Server {
        address: Address,
        port: Port,
        requests: u64,
    }

    injectable!(Server { address, port });

    #[derive(Debug, Default)]
    struct Client {
        address: Address,
        timeout: Timeout,
        port: Port,
    }

    injectable!(Client {
        address,
        timeout,
        port,
    });

    struct Handler {
        logger: Arc<dyn Logger>,
    }

    injectable!(Handler { logger });

    struct Unmarked {
        hits: u32,
    }

    injectable!(Unmarked {});

    #[test]
    fn test_apply_sets_marked_fields() {
        let registry = Registry::new();
        registry.map(Address("localhost")).map(Port(80));

        let mut server = Server {
            requests: 3,
            ..Server::default()
        };
        registry.apply(&mut server).unwrap();

        assert_eq!(server.address, Address("localhost"));
        assert_eq!(server.port, Port(80));
        assert_eq!(server.requests, 3);
    }

    #[test]
    fn test_apply_missing_keeps_processed_fields() {
        let registry = Registry::new();
        registry.map(Address("localhost")).map(Port(80));

        let mut client = Client::default();
        let err = registry.apply(&mut client).unwrap_err();

        assert!(err.is_not_found_for::<Timeout>());
        assert_eq!(client.address, Address("localhost"));
        assert_eq!(client.timeout, Timeout::default());
        assert_eq!(client.port, Port::default());
    }

    #[test]
    fn test_apply_interface_field() {
        let registry = Registry::new();
        registry.provide(Loud).implements::<dyn Logger>();

        let mut handler = Handler {
            logger: Arc::new(Quiet),
        };
        registry.apply(&mut handler).unwrap();
        assert_eq!(handler.logger.prefix(), "LOUD");
    }

    #[test]
    fn test_apply_through_indirections() {
        let registry = Registry::new();
        registry.map(Address("boxed")).map(Port(1));

        let mut boxed = Box::new(Server::default());
        registry.apply(&mut boxed).unwrap();
        assert_eq!(boxed.address, Address("boxed"));

        let mut server = Server::default();
        let mut by_ref = &mut server;
        registry.apply(&mut by_ref).unwrap();
        assert_eq!(server.port, Port(1));

        let mut some = Some(Server::default());
        registry.apply(&mut some).unwrap();
        assert_eq!(some.map(|server| server.port), Some(Port(1)));
    }

    #[test]
    fn test_apply_none_is_invalid_target() {
        let registry = Registry::new();
        registry.map(Address("unused")).map(Port(1));

        let mut target: Option<Server> = None;
        let err = registry.apply(&mut target).unwrap_err();
        assert!(err.is_invalid_target());
    }

    #[test]
    fn test_apply_without_marked_fields() {
        let registry = Registry::new();
        let mut target = Unmarked { hits: 9 };
        registry.apply(&mut target).unwrap();
        assert_eq!(target.hits, 9);
    }

    #[test]
    fn test_apply_from_parent() {
        let parent = Arc::new(Registry::new());
        parent.map(Port(443));
        let child = parent.child();
        child.map(Address("child"));

        let mut server = Server::default();
        child.apply(&mut server).unwrap();
        assert_eq!(server.address, Address("child"));
        assert_eq!(server.port, Port(443));
    }
}
