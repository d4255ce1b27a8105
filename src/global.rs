//! A process-wide registry slot.
//!
//! Nothing is installed implicitly: the application decides when its global registry is ready
//! and installs it once, typically at the start of `main`. Reading the slot before that returns
//! `None`.

use std::sync::{Arc, OnceLock};

use crate::registry::Registry;

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Installs `registry` as the process-wide registry.
///
/// # Errors
///
/// If a registry was already installed, the given one is returned back as error and the
/// installed one is kept.
pub fn install(registry: Arc<Registry>) -> Result<(), Arc<Registry>> {
    GLOBAL.set(registry)?;
    debug!("installed global registry");
    Ok(())
}

/// Returns the process-wide registry, if one has been installed.
pub fn get() -> Option<&'static Arc<Registry>> {
    GLOBAL.get()
}
