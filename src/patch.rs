//! Runtime replacement of named components.
//!
//! Components live in a [`Registry`] under a `(module, name)` key. A
//! replacement is accepted only when the key exists and the new value has
//! the same type as the registered one, so lookups never observe a
//! component of an unexpected type.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::ui::console::ConsoleFactory;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("{module} has no attribute '{name}'")]
    NoSuchAttribute { module: String, name: String },
    #[error("Signature mismatch: {name} is {expected}, got {found}")]
    SignatureMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Entry {
    fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// Named, swappable components.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `(module, name)`, replacing whatever was there.
    pub fn register<T: Any + Send + Sync>(&self, module: &str, name: &str, value: T) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((module.to_string(), name.to_string()), Entry::new(value));
    }

    /// Replace the component at `(module, name)` with `value`.
    pub fn patch<T: Any + Send + Sync>(&self, module: &str, name: &str, value: T) -> Result<(), PatchError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let key = (module.to_string(), name.to_string());
        let Some(current) = entries.get(&key) else {
            return Err(PatchError::NoSuchAttribute {
                module: module.to_string(),
                name: name.to_string(),
            });
        };
        if current.type_id != TypeId::of::<T>() {
            return Err(PatchError::SignatureMismatch {
                name: name.to_string(),
                expected: current.type_name,
                found: type_name::<T>(),
            });
        }
        entries.insert(key, Entry::new(value));
        tracing::debug!(module, name, "component patched");
        Ok(())
    }

    /// The component at `(module, name)`, if one of type `T` is registered.
    pub fn get<T: Any + Send + Sync>(&self, module: &str, name: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&(module.to_string(), name.to_string()))?;
        Arc::clone(&entry.value).downcast::<T>().ok()
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(module.to_string(), name.to_string()))
    }
}

static DEFAULT_REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::new();
    registry.register("ui", "Console", ConsoleFactory::default());
    registry
});

/// Process-wide registry with the crate's own components installed.
pub fn registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Replace a component of the process-wide registry.
pub fn patch_module<T: Any + Send + Sync>(module: &str, name: &str, value: T) -> Result<(), PatchError> {
    registry().patch(module, name, value)
}

/// The console factory currently installed as `("ui", "Console")`.
pub fn console_factory() -> ConsoleFactory {
    registry()
        .get::<ConsoleFactory>("ui", "Console")
        .map(|f| ConsoleFactory::clone(&f))
        .unwrap_or_default()
}
