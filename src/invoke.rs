//! Calling functions with resolved arguments.

use inject_core::{Resolver, ResolverExt, Result};

/// [`Arguments`] is a tuple of values that can be resolved together, in order.
pub trait Arguments: Sized {
    /// Resolves every element of the tuple from `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyNotFound`](inject_core::Error::DependencyNotFound) for the
    /// first element that can not be resolved.
    fn resolve_from<R>(resolver: &R) -> Result<Self>
    where
        R: ?Sized + Resolver;
}

impl Arguments for () {
    #[inline]
    fn resolve_from<R>(_resolver: &R) -> Result<Self>
    where
        R: ?Sized + Resolver,
    {
        Ok(())
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn resolve_argument<T, R>(resolver: &R) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
    R: ?Sized + Resolver,
{
    resolver.resolve::<T>().inspect_err(|err| {
        debug!(error = %err, "failed to resolve argument");
    })
}

macro_rules! impl_arguments_tuple {
    ($($ty:ident),*) => {
        impl<$($ty,)*> Arguments for ($($ty,)*)
        where
            $($ty: Clone + Send + Sync + 'static,)*
        {
            fn resolve_from<R>(resolver: &R) -> Result<Self>
            where
                R: ?Sized + Resolver,
            {
                Ok((
                    $( resolve_argument::<$ty, R>(resolver)?, )*
                ))
            }
        }
    };
}

apply_tuples!(impl_arguments_tuple);

/// [`Invocable`] is a trait for functions that can be called with arguments resolved by type.
///
/// It is implemented for every `FnOnce` taking up to 12 arguments, each of which must implement
/// [`Clone`], [`Send`], and [`Sync`] and be `'static`.
pub trait Invocable<Args> {
    /// The value returned by the function.
    type Output;

    /// Resolves the arguments in declaration order and calls the function once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyNotFound`](inject_core::Error::DependencyNotFound) for the
    /// first argument that can not be resolved. The function is not called in that case.
    fn invoke<R>(self, resolver: &R) -> Result<Self::Output>
    where
        R: ?Sized + Resolver;
}

/// [`AsyncInvocable`] is similar to [`Invocable`], but for functions returning a [`Future`].
pub trait AsyncInvocable<Args> {
    /// The value the returned future resolves to.
    type Output;

    /// Resolves the arguments in declaration order, then calls the function and awaits it.
    ///
    /// Arguments are resolved before this method returns; the function itself is only called
    /// when the returned future is first polled.
    ///
    /// # Errors
    ///
    /// The future resolves to
    /// [`Error::DependencyNotFound`](inject_core::Error::DependencyNotFound) for the first
    /// argument that could not be resolved. The function is not called in that case.
    fn invoke_async<R>(self, resolver: &R) -> impl Future<Output = Result<Self::Output>>
    where
        R: ?Sized + Resolver;
}

impl<F, O> Invocable<()> for F
where
    F: FnOnce() -> O,
{
    type Output = O;

    #[inline]
    fn invoke<R>(self, _resolver: &R) -> Result<O>
    where
        R: ?Sized + Resolver,
    {
        Ok(self())
    }
}

impl<F, Fut, O> AsyncInvocable<()> for F
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = O>,
{
    type Output = O;

    fn invoke_async<R>(self, _resolver: &R) -> impl Future<Output = Result<O>>
    where
        R: ?Sized + Resolver,
    {
        async move { Ok(self().await) }
    }
}

macro_rules! impl_invocable_fn {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, O, $($ty,)*> Invocable<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> O,
            $($ty: Clone + Send + Sync + 'static,)*
        {
            type Output = O;

            fn invoke<R>(self, resolver: &R) -> Result<O>
            where
                R: ?Sized + Resolver,
            {
                let ($($ty,)*) = <($($ty,)*)>::resolve_from(resolver)?;
                Ok(self($($ty,)*))
            }
        }
    };
}

apply_tuples!(impl_invocable_fn);

macro_rules! impl_async_invocable_fn {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, Fut, O, $($ty,)*> AsyncInvocable<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut,
            Fut: Future<Output = O>,
            $($ty: Clone + Send + Sync + 'static,)*
        {
            type Output = O;

            fn invoke_async<R>(self, resolver: &R) -> impl Future<Output = Result<O>>
            where
                R: ?Sized + Resolver,
            {
                let arguments = <($($ty,)*)>::resolve_from(resolver);
                async move {
                    let ($($ty,)*) = arguments?;
                    Ok(self($($ty,)*).await)
                }
            }
        }
    };
}

apply_tuples!(impl_async_invocable_fn);

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::registry::Registry;

    use super::*;

    trait Store: Send + Sync {
        fn load(&self, key: &str) -> Option<String>;
    }

    #[derive(Clone)]
    struct MemoryStore;

    impl Store for MemoryStore {
        fn load(&self, key: &str) -> Option<String> {
            (key == "greeting").then(|| "hello".to_string())
        }
    }

    crate::implements!(MemoryStore: dyn Store);

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Name(&'static str);

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Count(usize);

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Missing;

    fn greet(name: Name, count: Count) -> (String, usize) {
        (format!("hi {}", name.0), count.0 * 2)
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.map(Name("ada")).map(Count(2));
        registry
    }

    #[test]
    fn test_invoke_matches_direct_call() {
        let registry = registry();
        let got = registry.invoke(greet).unwrap();
        assert_eq!(got, greet(Name("ada"), Count(2)));
    }

    #[test]
    fn test_invoke_without_arguments() {
        let registry = Registry::new();
        assert_eq!(registry.invoke(|| 7).unwrap(), 7);
        registry.invoke(|| ()).unwrap();
    }

    #[test]
    fn test_invoke_missing_does_not_call() {
        let registry = registry();
        let called = AtomicBool::new(false);

        let err = registry
            .invoke(|_: Name, _: Missing, _: Count| {
                called.store(true, Ordering::SeqCst);
            })
            .unwrap_err();

        assert!(err.is_not_found_for::<Missing>());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_invoke_reports_first_missing() {
        let registry = Registry::new();
        registry.map(Count(1));

        let err = registry
            .invoke(|_: Count, _: Name, _: Missing| {})
            .unwrap_err();
        assert!(err.is_not_found_for::<Name>());
    }

    #[test]
    fn test_invoke_interface_argument() {
        let registry = registry();
        registry.provide(MemoryStore).implements::<dyn Store>();

        let got = registry
            .invoke(|store: Arc<dyn Store>, name: Name| {
                store.load("greeting").map(|greeting| format!("{greeting} {}", name.0))
            })
            .unwrap();
        assert_eq!(got.as_deref(), Some("hello ada"));
    }

    #[test]
    fn test_invoke_consumes_closure_once() {
        let registry = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let owned = Arc::clone(&calls);

        let got = registry
            .invoke(move |count: Count| {
                owned.fetch_add(1, Ordering::SeqCst);
                drop(owned);
                count.0
            })
            .unwrap();

        assert_eq!(got, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(Arc::strong_count(&calls), 1);
    }

    #[test]
    fn test_resolve_arguments_tuple() {
        let registry = registry();
        let (name, count) = <(Name, Count)>::resolve_from(&registry).unwrap();
        assert_eq!(name, Name("ada"));
        assert_eq!(count, Count(2));
    }

    #[tokio::test]
    async fn test_invoke_async() {
        let registry = registry();
        let got = registry
            .invoke_async(async |name: Name, count: Count| {
                tokio::task::yield_now().await;
                format!("{}:{}", name.0, count.0)
            })
            .await
            .unwrap();
        assert_eq!(got, "ada:2");

        let got = registry.invoke_async(async || 5).await.unwrap();
        assert_eq!(got, 5);
    }

    #[tokio::test]
    async fn test_invoke_async_missing_does_not_call() {
        let registry = registry();
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        let future = registry.invoke_async(move |_: Missing| {
            flag.store(true, Ordering::SeqCst);
            async {}
        });

        let err = future.await.unwrap_err();
        assert!(err.is_not_found_for::<Missing>());
        assert!(!called.load(Ordering::SeqCst));
    }
}
