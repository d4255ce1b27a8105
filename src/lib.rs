//! Runtime dependency injection by type.
//!
//! A [`Registry`] maps types to values. Values are resolved by exact type, by an interface they
//! were declared to implement, or through a chain of parent registries, and can be injected into
//! struct fields ([`Registry::apply`]) or function arguments ([`Registry::invoke`]).
//!
//! ```
//! use std::sync::Arc;
//!
//! use inject::{Registry, implements};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! #[derive(Clone)]
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self, name: &str) -> String {
//!         format!("Hello, {name}!")
//!     }
//! }
//!
//! implements!(English: dyn Greeter);
//!
//! #[derive(Clone)]
//! struct Name(&'static str);
//!
//! let registry = Registry::new();
//! registry.map(Name("world"));
//! registry.provide(English).implements::<dyn Greeter>();
//!
//! let greeting = registry
//!     .invoke(|greeter: Arc<dyn Greeter>, name: Name| greeter.greet(name.0))
//!     .unwrap();
//! assert_eq!(greeting, "Hello, world!");
//! ```
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
pub(crate) mod macros;

pub mod apply;
pub mod global;
pub mod interface;
pub mod invoke;
pub mod registry;

#[doc(inline)]
pub use inject_core::{Erased, Error, Resolver, ResolverExt, Result, TypeKey};

pub use apply::Injectable;
pub use interface::Implements;
pub use invoke::{Arguments, AsyncInvocable, Invocable};
pub use registry::{Binding, Registry};
