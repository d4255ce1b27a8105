//! Core types and traits for `inject` library.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub mod erased;
pub mod error;
pub mod key;
pub mod resolver;

pub use erased::Erased;
pub use error::{Error, Result};
pub use key::TypeKey;
pub use resolver::{Resolver, ResolverExt};
