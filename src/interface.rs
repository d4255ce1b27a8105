//! Interfaces implemented by mapped values.
//!
//! An interface is a trait object type such as `dyn Logger`, handled as `Arc<dyn Logger>`.
//! Whether a value satisfies an interface is declared explicitly, either when mapping it (see
//! [`Registry::provide`](crate::registry::Registry::provide)) or by storing it under the interface
//! key directly (see [`Registry::map_to`](crate::registry::Registry::map_to)).

use std::sync::Arc;

use inject_core::Erased;

/// [`Implements`] converts a value into a shared handle of interface `I`.
///
/// In most cases, you don't need to implement this trait manually, as [`implements!`] generates
/// the implementation for a concrete type and any number of interfaces.
pub trait Implements<I>: Clone + Send + Sync + 'static
where
    I: ?Sized + Send + Sync + 'static,
{
    /// Converts `self` into a handle of the interface.
    fn upcast(self) -> Arc<I>;
}

/// Declares that a concrete type implements one or more interfaces.
///
/// ```
/// use std::sync::Arc;
///
/// use inject::implements;
/// use inject::interface::Implements;
///
/// trait Named: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// #[derive(Clone)]
/// struct Service;
///
/// impl Named for Service {
///     fn name(&self) -> &str {
///         "service"
///     }
/// }
///
/// implements!(Service: dyn Named);
///
/// let named: Arc<dyn Named> = Service.upcast();
/// assert_eq!(named.name(), "service");
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty: $($iface:ty),+ $(,)?) => {
        $(
            impl $crate::interface::Implements<$iface> for $ty {
                #[inline]
                fn upcast(self) -> ::std::sync::Arc<$iface> {
                    ::std::sync::Arc::new(self)
                }
            }
        )+
    };
}

/// Produces the interface handle of an erased value, or `None` if the value is not of the
/// expected concrete type.
pub(crate) type Upcast = fn(&Erased) -> Option<Erased>;

pub(crate) fn upcast_erased<T, I>(erased: &Erased) -> Option<Erased>
where
    T: Implements<I>,
    I: ?Sized + Send + Sync + 'static,
{
    erased
        .downcast_ref::<T>()
        .map(|value| Erased::new(value.clone().upcast()))
}
