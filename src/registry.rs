//! The type-indexed value registry.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use inject_core::{Erased, Error, Resolver, Result, TypeKey};

use crate::apply::Injectable;
use crate::interface::{Implements, Upcast, upcast_erased};
use crate::invoke::{AsyncInvocable, Invocable};

struct Entry {
    value: Arc<Erased>,
    seq: u64,
    interfaces: BTreeMap<TypeKey, Upcast>,
}

struct Entries {
    map: BTreeMap<TypeKey, Entry>,
    next_seq: u64,
}

impl Entries {
    const fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn insert(&mut self, key: TypeKey, value: Erased) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.map.insert(
            key,
            Entry {
                value: Arc::new(value),
                seq,
                interfaces: BTreeMap::new(),
            },
        );
        seq
    }

    // Only shares the stored value, so that no `Clone` or `upcast` of a user type runs while
    // the lock is held.
    fn find(&self, key: TypeKey) -> Option<Found> {
        if let Some(entry) = self.map.get(&key) {
            return Some(Found {
                value: Arc::clone(&entry.value),
                upcast: None,
            });
        }

        // Among the values declared to implement `key`, the earliest mapped one wins.
        self.map
            .values()
            .filter_map(|entry| entry.interfaces.get(&key).map(|upcast| (entry, *upcast)))
            .min_by_key(|(entry, _)| entry.seq)
            .map(|(entry, upcast)| Found {
                value: Arc::clone(&entry.value),
                upcast: Some(upcast),
            })
    }
}

struct Found {
    value: Arc<Erased>,
    upcast: Option<Upcast>,
}

impl Found {
    fn into_value(self) -> Option<Erased> {
        match self.upcast {
            Some(upcast) => upcast(&self.value),
            None => Some(Erased::clone(&self.value)),
        }
    }
}

/// A registry of values indexed by their type.
///
/// Values are looked up by exact type first, then among the values declared to implement the
/// requested interface, and finally in the parent registry, if one is set.
///
/// Every method takes `&self`; the registry synchronizes access internally and can be shared
/// across threads behind an [`Arc`]. The parent link is weak, so a registry never keeps its parent
/// alive.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use inject::{Registry, ResolverExt};
///
/// #[derive(Clone, Debug, PartialEq, Eq)]
/// struct Address(&'static str);
///
/// #[derive(Clone, Debug, PartialEq, Eq)]
/// struct Port(u16);
///
/// let root = Arc::new(Registry::new());
/// root.map(Address("localhost")).map(Port(80));
///
/// let request = root.child();
/// request.map(Port(8080));
///
/// assert_eq!(request.get::<Address>(), Some(Address("localhost")));
/// assert_eq!(request.get::<Port>(), Some(Port(8080)));
/// assert_eq!(root.get::<Port>(), Some(Port(80)));
/// ```
pub struct Registry {
    entries: RwLock<Entries>,
    parent: RwLock<Option<Weak<Registry>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a new, empty `Registry` without parent.
    pub const fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::new()),
            parent: RwLock::new(None),
        }
    }

    /// Creates a new, empty `Registry` whose parent is `self`.
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        let child = Arc::new(Self::new());
        child.set_parent(self);
        child
    }

    // A panic while holding either lock can not leave the maps in an inconsistent state, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maps `value` to its own type, replacing any value previously mapped to that type.
    pub fn map<T>(&self, value: T) -> &Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        trace!(type_name = key.name(), "mapping value");
        self.write().insert(key, Erased::new(value));
        self
    }

    /// Maps `value` to interface `I` instead of its own type.
    ///
    /// The value is stored as `Arc<I>` and can be retrieved with
    /// [`get_interface`](inject_core::ResolverExt::get_interface).
    pub fn map_to<I>(&self, value: impl Implements<I>) -> &Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::interface::<I>();
        trace!(type_name = key.name(), "mapping value to interface");
        self.write().insert(key, Erased::new(value.upcast()));
        self
    }

    /// Maps an erased value to `key` directly.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::InvalidArgument`] and leaves the registry unchanged if
    /// `value` is not of the type identified by `key`.
    pub fn set(&self, key: TypeKey, value: Erased) -> Result<&Self> {
        if !value.is_of(key) {
            return Err(Error::InvalidArgument {
                expected: key,
                found: value.type_name(),
            });
        }

        trace!(type_name = key.name(), "setting value");
        self.write().insert(key, value);
        Ok(self)
    }

    /// Maps `value` to its own type and returns a [`Binding`] to declare the interfaces it
    /// implements.
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use inject::{Registry, ResolverExt, implements};
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// #[derive(Clone)]
    /// struct FixedClock(u64);
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 {
    ///         self.0
    ///     }
    /// }
    ///
    /// implements!(FixedClock: dyn Clock);
    ///
    /// let registry = Registry::new();
    /// registry.provide(FixedClock(42)).implements::<dyn Clock>();
    ///
    /// let clock: Arc<dyn Clock> = registry.get_interface().unwrap();
    /// assert_eq!(clock.now(), 42);
    /// ```
    pub fn provide<T>(&self, value: T) -> Binding<'_, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        trace!(type_name = key.name(), "mapping value");
        let seq = self.write().insert(key, Erased::new(value));
        Binding::new(self, seq)
    }

    /// Returns a [`Binding`] for the value currently mapped to type `T` in this registry, or
    /// `None` if there is none.
    ///
    /// This declares interfaces for values stored with [`set`](Self::set) or [`map`](Self::map):
    ///
    /// ```
    /// use inject::{Erased, Registry, ResolverExt, TypeKey, implements};
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// #[derive(Clone)]
    /// struct FixedClock(u64);
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 {
    ///         self.0
    ///     }
    /// }
    ///
    /// implements!(FixedClock: dyn Clock);
    ///
    /// let registry = Registry::new();
    /// registry.set(TypeKey::of::<FixedClock>(), Erased::new(FixedClock(7))).unwrap();
    /// registry.bind::<FixedClock>().unwrap().implements::<dyn Clock>();
    ///
    /// assert_eq!(registry.get_interface::<dyn Clock>().unwrap().now(), 7);
    /// ```
    pub fn bind<T>(&self) -> Option<Binding<'_, T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let seq = self.read().map.get(&TypeKey::of::<T>())?.seq;
        Some(Binding::new(self, seq))
    }

    fn declare_interface(&self, owner: TypeKey, seq: u64, interface: TypeKey, upcast: Upcast) {
        match self.write().map.get_mut(&owner) {
            Some(entry) if entry.seq == seq => {
                trace!(
                    type_name = owner.name(),
                    interface = interface.name(),
                    "declaring interface"
                );
                entry.interfaces.insert(interface, upcast);
            }
            _ => {
                debug!(
                    type_name = owner.name(),
                    interface = interface.name(),
                    "bound value was replaced, ignoring interface declaration"
                );
            }
        }
    }

    /// Looks up `key` in this registry only, ignoring the parent chain.
    pub fn get_local(&self, key: TypeKey) -> Option<Erased> {
        let found = self.read().find(key)?;
        found.into_value()
    }

    /// Returns `true` if a value is mapped to exactly `key` in this registry.
    pub fn contains_key(&self, key: TypeKey) -> bool {
        self.read().map.contains_key(&key)
    }

    /// Returns the number of values mapped in this registry, not counting its parents.
    pub fn len(&self) -> usize {
        self.read().map.len()
    }

    /// Returns `true` if no value is mapped in this registry.
    pub fn is_empty(&self) -> bool {
        self.read().map.is_empty()
    }

    /// Sets the registry to fall back to when a lookup misses.
    pub fn set_parent(&self, parent: &Arc<Self>) {
        *self.parent.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(parent));
    }

    /// Removes the parent link.
    pub fn clear_parent(&self) {
        *self.parent.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the parent registry, if one is set and still alive.
    ///
    /// A link to a parent that has been dropped is removed.
    pub fn parent(&self) -> Option<Arc<Self>> {
        let upgraded = {
            let parent = self.parent.read().unwrap_or_else(PoisonError::into_inner);
            parent.as_ref()?.upgrade()
        };
        if upgraded.is_none() {
            let mut parent = self.parent.write().unwrap_or_else(PoisonError::into_inner);
            // Another thread may have replaced the link in the meantime.
            if parent.as_ref().is_some_and(|weak| weak.strong_count() == 0) {
                warn!("parent registry has been dropped, removing the link");
                *parent = None;
            }
        }
        upgraded
    }

    /// Assigns the injectable fields of `target`.
    ///
    /// # Errors
    ///
    /// See [`Injectable::inject_from`].
    pub fn apply<T>(&self, target: &mut T) -> Result<()>
    where
        T: ?Sized + Injectable,
    {
        target.inject_from(self)
    }

    /// Calls `f` with arguments resolved from this registry and returns its output.
    ///
    /// # Errors
    ///
    /// See [`Invocable::invoke`].
    pub fn invoke<F, Args>(&self, f: F) -> Result<F::Output>
    where
        F: Invocable<Args>,
    {
        f.invoke(self)
    }

    /// Calls the async function `f` with arguments resolved from this registry.
    ///
    /// See [`AsyncInvocable::invoke_async`].
    pub fn invoke_async<F, Args>(&self, f: F) -> impl Future<Output = Result<F::Output>>
    where
        F: AsyncInvocable<Args>,
    {
        f.invoke_async(self)
    }
}

impl Resolver for Registry {
    fn get_by_key(&self, key: TypeKey) -> Option<Erased> {
        if let Some(value) = self.get_local(key) {
            return Some(value);
        }

        let mut visited = vec![std::ptr::from_ref(self)];
        let mut next = self.parent();

        while let Some(registry) = next {
            let ptr = Arc::as_ptr(&registry);
            if visited.contains(&ptr) {
                warn!(type_name = key.name(), "cycle detected in registry parent chain");
                return None;
            }
            visited.push(ptr);

            debug!(type_name = key.name(), "looking up value in parent registry");
            if let Some(value) = registry.get_local(key) {
                return Some(value);
            }

            next = registry.parent();
        }

        None
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.read();
        let has_parent = self
            .parent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();

        f.debug_struct("Registry")
            .field("types", &entries.map.keys().collect::<Vec<_>>())
            .field("has_parent", &has_parent)
            .finish()
    }
}

/// Declares the interfaces implemented by a value mapped with [`Registry::provide`] or found
/// with [`Registry::bind`].
///
/// A binding refers to one particular mapping of `T`. Each declaration becomes visible to lookups
/// as soon as [`implements`](Self::implements) returns, and is ignored if `T` has been mapped again
/// since the binding was created.
pub struct Binding<'a, T> {
    registry: &'a Registry,
    seq: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> Binding<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    const fn new(registry: &'a Registry, seq: u64) -> Self {
        Self {
            registry,
            seq,
            _marker: PhantomData,
        }
    }

    /// Declares that the mapped value implements interface `I`, so that requests for `Arc<I>`
    /// can be satisfied by it.
    pub fn implements<I>(self) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        T: Implements<I>,
    {
        self.registry.declare_interface(
            TypeKey::of::<T>(),
            self.seq,
            TypeKey::interface::<I>(),
            upcast_erased::<T, I>,
        );
        self
    }
}

impl<T> std::fmt::Debug for Binding<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("type_name", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
